/// Holder count resolution across Solscan, Helius and RugCheck
use crate::apis::{ApiError, ApiManager};
use crate::logger::{self, LogTag};
use crate::tokens::types::{HolderSnapshot, HolderSource};

/// Parse configured source names, skipping unknown ones
pub fn parse_holder_sources(names: &[String]) -> Vec<HolderSource> {
    let mut sources = Vec::new();
    for name in names {
        match HolderSource::parse(name) {
            Some(source) if !sources.contains(&source) => sources.push(source),
            Some(_) => {}
            None => logger::warning(
                LogTag::Config,
                &format!("Unknown holder source '{}' ignored", name),
            ),
        }
    }
    sources
}

async fn query_source(apis: &ApiManager, source: HolderSource, mint: &str) -> Result<u64, ApiError> {
    match source {
        HolderSource::Solscan => apis.solscan.holder_count(mint).await,
        HolderSource::Helius => apis.helius.holder_count(mint).await,
        HolderSource::RugCheck => apis
            .rugcheck
            .security_snapshot(mint)
            .await?
            .total_holders
            .ok_or(ApiError::NotFound),
    }
}

/// First source in `order` that yields a count
pub async fn resolve_holder_count(
    apis: &ApiManager,
    order: &[HolderSource],
    mint: &str,
) -> Option<HolderSnapshot> {
    for &source in order {
        match query_source(apis, source, mint).await {
            Ok(holders) => return Some(HolderSnapshot { holders, source }),
            Err(e) => logger::debug(
                LogTag::Enrichment,
                &format!("Holder source {} failed for {}: {}", source.as_str(), mint, e),
            ),
        }
    }
    None
}

/// Every source queried for one mint, for side-by-side comparison
pub async fn verify_holders(apis: &ApiManager, mint: &str) -> Vec<(HolderSource, Result<u64, ApiError>)> {
    let (solscan, helius, rugcheck) = tokio::join!(
        query_source(apis, HolderSource::Solscan, mint),
        query_source(apis, HolderSource::Helius, mint),
        query_source(apis, HolderSource::RugCheck, mint),
    );
    vec![
        (HolderSource::Solscan, solscan),
        (HolderSource::Helius, helius),
        (HolderSource::RugCheck, rugcheck),
    ]
}
