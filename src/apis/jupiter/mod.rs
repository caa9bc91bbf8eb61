/// Jupiter API client: token list metadata and USDC quotes
///
/// Endpoints:
/// 1. `token.jup.ag/all` - full token list, fetched in bulk and cached with a TTL
/// 2. `quote-api.jup.ag/v6/quote` - swap quote used as the tradability probe
pub mod types;

use self::types::{JupiterListToken, QuoteResponse};
use crate::apis::client::{ApiCategory, ApiFetcher};
use crate::apis::errors::ApiError;
use crate::config::ApisConfig;
use crate::logger::{self, LogTag};
use crate::tokens::types::{QuoteSnapshot, TokenMetadata, USDC_DECIMALS, USDC_MINT};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

/// A failed list refresh is not retried within this window
pub const LIST_FAILURE_BACKOFF: Duration = Duration::from_secs(60);

// ============================================================================
// TOKEN LIST CACHE
// ============================================================================

/// Indexed snapshot of the Jupiter token list
#[derive(Debug, Default)]
pub struct TokenList {
    by_address: HashMap<String, TokenMetadata>,
    order: Vec<String>,
}

impl TokenList {
    pub fn from_entries(entries: Vec<JupiterListToken>) -> Self {
        let mut list = TokenList::default();
        for entry in entries {
            if list.by_address.contains_key(&entry.address) {
                continue;
            }
            list.order.push(entry.address.clone());
            list.by_address.insert(
                entry.address.clone(),
                TokenMetadata {
                    address: entry.address,
                    symbol: entry.symbol,
                    name: entry.name,
                    decimals: entry.decimals,
                    tags: entry.tags.unwrap_or_default(),
                },
            );
        }
        list
    }

    pub fn get(&self, address: &str) -> Option<&TokenMetadata> {
        self.by_address.get(address)
    }

    /// Addresses in list order
    pub fn addresses(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// TTL cache around the token list, refreshed on demand
///
/// A failed refresh is remembered for `failure_backoff` so callers get an
/// immediate error instead of waiting on the same dead endpoint again.
pub struct TokenListCache {
    ttl: Duration,
    failure_backoff: Duration,
    entry: RwLock<Option<(Instant, Arc<TokenList>)>>,
    last_failure: RwLock<Option<(Instant, ApiError)>>,
    refresh: Mutex<()>,
}

impl TokenListCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            failure_backoff: LIST_FAILURE_BACKOFF,
            entry: RwLock::new(None),
            last_failure: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Last loaded list regardless of age
    pub async fn current(&self) -> Option<Arc<TokenList>> {
        self.entry.read().await.as_ref().map(|(_, list)| list.clone())
    }

    /// Error of a refresh that failed within the back-off window
    pub async fn recent_failure(&self) -> Option<ApiError> {
        match &*self.last_failure.read().await {
            Some((failed_at, error)) if failed_at.elapsed() < self.failure_backoff => {
                Some(error.clone())
            }
            _ => None,
        }
    }

    pub async fn record_failure(&self, error: ApiError) {
        *self.last_failure.write().await = Some((Instant::now(), error));
    }

    pub async fn fresh(&self) -> Option<Arc<TokenList>> {
        match &*self.entry.read().await {
            Some((loaded_at, list)) if loaded_at.elapsed() < self.ttl => Some(list.clone()),
            _ => None,
        }
    }

    pub async fn store(&self, list: TokenList) -> Arc<TokenList> {
        let list = Arc::new(list);
        *self.entry.write().await = Some((Instant::now(), list.clone()));
        *self.last_failure.write().await = None;
        list
    }

    pub async fn invalidate(&self) {
        *self.entry.write().await = None;
        *self.last_failure.write().await = None;
    }
}

// ============================================================================
// CLIENT
// ============================================================================

pub struct JupiterClient {
    fetcher: Arc<ApiFetcher>,
    enabled: bool,
    token_list_url: String,
    quote_url: String,
    slippage_bps: u32,
    list_cache: TokenListCache,
}

impl JupiterClient {
    pub fn new(fetcher: Arc<ApiFetcher>, config: &ApisConfig) -> Self {
        Self {
            fetcher,
            enabled: config.jupiter_enabled,
            token_list_url: config.jupiter_token_list_url.clone(),
            quote_url: config.jupiter_quote_url.clone(),
            slippage_bps: config.quote_slippage_bps,
            list_cache: TokenListCache::new(Duration::from_secs(config.token_list_ttl_secs)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Token list, served from cache while fresh, fetched otherwise
    ///
    /// Within `LIST_FAILURE_BACKOFF` of a failed fetch the cached error is
    /// returned without touching the network.
    pub async fn token_list(&self) -> Result<Arc<TokenList>, ApiError> {
        if !self.enabled {
            return Err(ApiError::Disabled);
        }
        if let Some(list) = self.list_cache.fresh().await {
            return Ok(list);
        }

        // One refresh at a time; late arrivals pick up the fresh entry
        let _guard = self.list_cache.refresh.lock().await;
        if let Some(list) = self.list_cache.fresh().await {
            return Ok(list);
        }

        if let Some(error) = self.list_cache.recent_failure().await {
            return Err(error);
        }

        let entries: Vec<JupiterListToken> = match self
            .fetcher
            .get_json(ApiCategory::Jupiter, &self.token_list_url, &[])
            .await
        {
            Ok(entries) => entries,
            Err(e) => {
                logger::warning(
                    LogTag::Api,
                    &format!(
                        "Jupiter token list fetch failed, retry after {}s: {}",
                        self.list_cache.failure_backoff.as_secs(),
                        e
                    ),
                );
                self.list_cache.record_failure(e.clone()).await;
                return Err(e);
            }
        };
        let list = TokenList::from_entries(entries);

        logger::info(
            LogTag::Api,
            &format!("Jupiter token list loaded: {} tokens", list.len()),
        );
        Ok(self.list_cache.store(list).await)
    }

    pub async fn invalidate_token_list(&self) {
        self.list_cache.invalidate().await;
    }

    /// Metadata for one address from the already loaded list
    ///
    /// Never fetches; `None` when unlisted or no list has been loaded yet.
    pub async fn metadata(&self, address: &str) -> Option<TokenMetadata> {
        self.list_cache
            .current()
            .await
            .and_then(|list| list.get(address).cloned())
    }

    /// Quote `notional_tokens` whole tokens into USDC
    ///
    /// USDC itself is answered locally as a 1:1 route.
    pub async fn quote_to_usdc(
        &self,
        address: &str,
        decimals: u8,
        notional_tokens: f64,
    ) -> Result<QuoteSnapshot, ApiError> {
        if !self.enabled {
            return Err(ApiError::Disabled);
        }

        let amount = base_units(notional_tokens, decimals).ok_or_else(|| {
            ApiError::InvalidResponse(format!("Invalid quote notional {}", notional_tokens))
        })?;

        if address == USDC_MINT {
            return Ok(QuoteSnapshot {
                in_amount: amount,
                out_amount: base_units(notional_tokens, USDC_DECIMALS).unwrap_or(amount),
                notional_tokens,
                price_impact_pct: Some(0.0),
            });
        }

        let query = [
            ("inputMint", address.to_string()),
            ("outputMint", USDC_MINT.to_string()),
            ("amount", amount.to_string()),
            ("slippageBps", self.slippage_bps.to_string()),
        ];
        let quote: QuoteResponse = self
            .fetcher
            .get_json(ApiCategory::JupiterQuote, &self.quote_url, &query)
            .await?;

        let out_amount = quote.out_amount.parse::<u64>().map_err(|e| {
            ApiError::InvalidResponse(format!("Bad outAmount '{}': {}", quote.out_amount, e))
        })?;
        let in_amount = quote.in_amount.parse::<u64>().unwrap_or(amount);

        Ok(QuoteSnapshot {
            in_amount,
            out_amount,
            notional_tokens,
            price_impact_pct: quote
                .price_impact_pct
                .as_deref()
                .and_then(|p| p.parse::<f64>().ok()),
        })
    }
}

/// `tokens * 10^decimals` as an integer amount, `None` if not positive
fn base_units(tokens: f64, decimals: u8) -> Option<u64> {
    let amount = (tokens * 10f64.powi(decimals as i32)).round();
    if amount.is_finite() && amount >= 1.0 && amount <= u64::MAX as f64 {
        Some(amount as u64)
    } else {
        None
    }
}
