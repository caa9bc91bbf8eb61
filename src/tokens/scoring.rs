/// Invest score: a heuristic 0-100 ranking of a merged token record
///
/// ```text
/// score = risk*w_r + momentum*w_m + liquidity*w_l + holders*w_h + early_bonus
/// ```
///
/// Each component is log-scaled against a reference size so that one huge
/// number cannot dominate. Missing or non-finite inputs count as absent.
use crate::config::ScoringConfig;
use crate::tokens::types::TokenRecord;
use serde::Serialize;

pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub risk: f64,
    pub momentum: f64,
    pub liquidity: f64,
    pub holders: f64,
    pub early_bonus: f64,
    pub total: f64,
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// `ln(1 + value/reference) * scale` for positive values, 0 otherwise
fn log_component(value: Option<f64>, reference: f64, scale: f64) -> f64 {
    match finite(value) {
        Some(v) if v > 0.0 && reference > 0.0 => (1.0 + v / reference).ln() * scale,
        _ => 0.0,
    }
}

pub fn early_bonus(age_hours: Option<f64>) -> f64 {
    match finite(age_hours) {
        Some(age) if age < 0.0 => 0.0,
        Some(age) if age < 1.0 => 30.0,
        Some(age) if age < 6.0 => 20.0,
        Some(age) if age < 24.0 => 10.0,
        _ => 0.0,
    }
}

pub fn score_breakdown(record: &TokenRecord, config: &ScoringConfig) -> ScoreBreakdown {
    let rug = finite(record.rug_score)
        .unwrap_or(config.neutral_rug_score)
        .clamp(0.0, 100.0);
    let risk = 100.0 - rug;
    let momentum = log_component(record.volume_24h, config.volume_reference_usd, 30.0);
    let liquidity = log_component(record.liquidity_usd, config.liquidity_reference_usd, 20.0);
    let holders = log_component(
        record.holders.map(|h| h as f64),
        config.holders_reference,
        20.0,
    );
    let early_bonus = early_bonus(record.age_hours);

    let raw = risk * config.risk_weight
        + momentum * config.momentum_weight
        + liquidity * config.liquidity_weight
        + holders * config.holders_weight
        + early_bonus;

    let total = if raw.is_finite() {
        raw.clamp(0.0, MAX_SCORE)
    } else {
        0.0
    };

    ScoreBreakdown {
        risk,
        momentum,
        liquidity,
        holders,
        early_bonus,
        total,
    }
}

pub fn calculate_invest_score(record: &TokenRecord, config: &ScoringConfig) -> f64 {
    score_breakdown(record, config).total
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record() -> TokenRecord {
        TokenRecord::discovered("Mint", None, Utc::now())
    }

    #[test]
    fn test_zero_volume_has_no_momentum() {
        let mut r = record();
        r.volume_24h = Some(0.0);
        let b = score_breakdown(&r, &ScoringConfig::default());
        assert_eq!(b.momentum, 0.0);
    }

    #[test]
    fn test_empty_record_scores_neutral_risk_only() {
        let b = score_breakdown(&record(), &ScoringConfig::default());
        assert_eq!(b.risk, 50.0);
        assert!((b.total - 17.5).abs() < 1e-9);
    }

    #[test]
    fn test_reference_values() {
        let mut r = record();
        r.rug_score = Some(80.0);
        r.volume_24h = Some(50_000.0);
        r.liquidity_usd = Some(100_000.0);
        r.holders = Some(1_000);
        r.age_hours = Some(3.0);

        let b = score_breakdown(&r, &ScoringConfig::default());
        let ln2 = 2f64.ln();
        assert!((b.momentum - ln2 * 30.0).abs() < 1e-9);
        assert!((b.liquidity - ln2 * 20.0).abs() < 1e-9);
        assert!((b.holders - ln2 * 20.0).abs() < 1e-9);
        assert_eq!(b.early_bonus, 20.0);

        let expected = 20.0 * 0.35 + ln2 * 30.0 * 0.25 + ln2 * 20.0 * 0.15 * 2.0 + 20.0;
        assert!((b.total - expected).abs() < 1e-9);
    }

    #[test]
    fn test_early_bonus_tiers() {
        assert_eq!(early_bonus(Some(0.5)), 30.0);
        assert_eq!(early_bonus(Some(5.9)), 20.0);
        assert_eq!(early_bonus(Some(23.0)), 10.0);
        assert_eq!(early_bonus(Some(24.0)), 0.0);
        assert_eq!(early_bonus(None), 0.0);
        assert_eq!(early_bonus(Some(f64::NAN)), 0.0);
    }

    #[test]
    fn test_score_clamped_to_range() {
        let mut r = record();
        r.rug_score = Some(0.0);
        r.volume_24h = Some(1e15);
        r.liquidity_usd = Some(1e15);
        r.holders = Some(u64::MAX);
        r.age_hours = Some(0.1);
        assert_eq!(calculate_invest_score(&r, &ScoringConfig::default()), MAX_SCORE);

        let mut bad = record();
        bad.rug_score = Some(f64::INFINITY);
        bad.volume_24h = Some(f64::NAN);
        assert!((calculate_invest_score(&bad, &ScoringConfig::default()) - 17.5).abs() < 1e-9);
    }
}
