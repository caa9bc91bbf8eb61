//! Special logging functions for specific use cases

use super::tags::LogTag;
use crate::logger;
use crate::tokens::types::TokenRecord;
use colored::*;

/// One-line colored summary of a freshly enriched token
///
/// Shows symbol, invest score (colored by band), price, liquidity, rug score
/// and tradability.
pub fn log_token_enriched(record: &TokenRecord) {
    let score = record.invest_score.unwrap_or(0.0);
    let score_str = format!("{:>6.2}", score);
    let score_colored = if score >= 60.0 {
        score_str.bright_green().bold()
    } else if score >= 35.0 {
        score_str.yellow()
    } else {
        score_str.dimmed()
    };

    let tradeable = if record.is_tradeable {
        "TRADEABLE".green()
    } else {
        "NO-ROUTE".red()
    };

    let message = format!(
        "{:<10} score={} price={} liq={} rug={} holders={} {} {}",
        record.symbol,
        score_colored,
        record
            .price_usdc
            .map(|p| format!("${:.8}", p))
            .unwrap_or_else(|| "-".to_string()),
        record
            .liquidity_usd
            .map(|l| format!("${:.0}", l))
            .unwrap_or_else(|| "-".to_string()),
        record
            .rug_score
            .map(|r| format!("{:.0}", r))
            .unwrap_or_else(|| "-".to_string()),
        record
            .holders
            .map(|h| h.to_string())
            .unwrap_or_else(|| "-".to_string()),
        tradeable,
        record.address.dimmed(),
    );

    logger::info(LogTag::Enrichment, &message);
}
