/// Shared HTTP fetch helper with rate limiting
///
/// Every external call goes through one `ApiFetcher`:
/// - one `RateLimiter` per `ApiCategory` enforces a minimum delay between request starts
/// - a global semaphore caps in-flight requests across all APIs; callers still
///   queued in a rate limiter do not hold a slot
/// - HTTP 429 is retried after `backoff_base + jitter`, up to `max_retries` extra attempts
use super::errors::ApiError;
use super::stats::{ApiStats, ApiStatsTracker};
use crate::arguments::is_debug_api_enabled;
use crate::config::HttpConfig;
use crate::logger::{self, LogTag};
use rand::Rng;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};

/// Longest response body excerpt kept in error messages
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiCategory {
    Jupiter,
    JupiterQuote,
    DexScreener,
    RugCheck,
    Solscan,
    Helius,
    Birdeye,
}

impl ApiCategory {
    pub fn all() -> [ApiCategory; 7] {
        [
            ApiCategory::Jupiter,
            ApiCategory::JupiterQuote,
            ApiCategory::DexScreener,
            ApiCategory::RugCheck,
            ApiCategory::Solscan,
            ApiCategory::Helius,
            ApiCategory::Birdeye,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ApiCategory::Jupiter => "jupiter",
            ApiCategory::JupiterQuote => "jupiter_quote",
            ApiCategory::DexScreener => "dexscreener",
            ApiCategory::RugCheck => "rugcheck",
            ApiCategory::Solscan => "solscan",
            ApiCategory::Helius => "helius",
            ApiCategory::Birdeye => "birdeye",
        }
    }

    fn min_delay(&self, config: &HttpConfig) -> Duration {
        let ms = match self {
            ApiCategory::Jupiter => config.jupiter_delay_ms,
            ApiCategory::JupiterQuote => config.jupiter_quote_delay_ms,
            ApiCategory::DexScreener => config.dexscreener_delay_ms,
            ApiCategory::RugCheck => config.rugcheck_delay_ms,
            ApiCategory::Solscan => config.solscan_delay_ms,
            ApiCategory::Helius => config.helius_delay_ms,
            ApiCategory::Birdeye => config.birdeye_delay_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Fixed minimum spacing between request starts
///
/// Each caller reserves the next free slot under the lock and sleeps outside
/// it, so concurrent callers queue up one interval apart.
pub struct RateLimiter {
    next_slot: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            next_slot: Mutex::new(None),
            min_interval,
        }
    }

    pub async fn acquire(&self) {
        if self.min_interval.is_zero() {
            return;
        }

        let wait_until = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let start = match *next {
                Some(slot) if slot > now => slot,
                _ => now,
            };
            *next = Some(start + self.min_interval);
            start
        };

        let now = Instant::now();
        if wait_until > now {
            tokio::time::sleep(wait_until - now).await;
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

/// Retry and timeout policy for the fetcher
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub max_concurrent: usize,
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub backoff_jitter: Duration,
    pub user_agent: String,
}

impl From<&HttpConfig> for FetchSettings {
    fn from(config: &HttpConfig) -> Self {
        Self {
            max_concurrent: config.max_concurrent_requests.max(1),
            timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            backoff_jitter: Duration::from_millis(config.backoff_jitter_ms),
            user_agent: config.user_agent.clone(),
        }
    }
}

pub struct ApiFetcher {
    client: Client,
    global: Arc<Semaphore>,
    limiters: HashMap<ApiCategory, RateLimiter>,
    stats: HashMap<ApiCategory, ApiStatsTracker>,
    settings: FetchSettings,
}

impl ApiFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, String> {
        let delays = ApiCategory::all()
            .into_iter()
            .map(|c| (c, c.min_delay(config)))
            .collect();
        Self::with_settings(FetchSettings::from(config), delays)
    }

    /// Build with explicit settings; categories missing from `delays` are unthrottled
    pub fn with_settings(
        settings: FetchSettings,
        delays: HashMap<ApiCategory, Duration>,
    ) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        let limiters = ApiCategory::all()
            .into_iter()
            .map(|c| {
                let delay = delays.get(&c).copied().unwrap_or(Duration::ZERO);
                (c, RateLimiter::new(delay))
            })
            .collect();

        let stats = ApiCategory::all()
            .into_iter()
            .map(|c| (c, ApiStatsTracker::new()))
            .collect();

        Ok(Self {
            client,
            global: Arc::new(Semaphore::new(settings.max_concurrent.max(1))),
            limiters,
            stats,
            settings,
        })
    }

    pub async fn get_json<T>(
        &self,
        category: ApiCategory,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.get_json_with_headers(category, url, query, &[]).await
    }

    pub async fn get_json_with_headers<T>(
        &self,
        category: ApiCategory,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, String)],
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.execute(category, url, |client| {
            headers
                .iter()
                .fold(client.get(url).query(query), |req, (name, value)| {
                    req.header(*name, value.as_str())
                })
        })
        .await
    }

    pub async fn post_json<T, B>(
        &self,
        category: ApiCategory,
        url: &str,
        body: &B,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(category, url, |client| client.post(url).json(body))
            .await
    }

    async fn execute<T, F>(&self, category: ApiCategory, url: &str, build: F) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt: u32 = 0;

        loop {
            // Wait for the category slot before taking an in-flight permit
            if let Some(limiter) = self.limiters.get(&category) {
                limiter.acquire().await;
            }

            let permit = self
                .global
                .acquire()
                .await
                .map_err(|e| ApiError::NetworkError(format!("Request semaphore closed: {}", e)))?;

            let start = Instant::now();
            let result = build(&self.client).send().await;
            let elapsed = start.elapsed().as_secs_f64() * 1000.0;

            let response = match result {
                Ok(response) => response,
                Err(err) => {
                    let error = if err.is_timeout() {
                        ApiError::Timeout
                    } else {
                        ApiError::NetworkError(err.to_string())
                    };
                    self.record_failure(category, elapsed, &error).await;
                    return Err(error);
                }
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                drop(permit);
                if let Some(tracker) = self.stats.get(&category) {
                    tracker.record_rate_limited().await;
                }

                if attempt >= self.settings.max_retries {
                    self.record_failure(category, elapsed, &ApiError::RateLimitExceeded)
                        .await;
                    return Err(ApiError::RateLimitExceeded);
                }

                attempt += 1;
                let backoff = self.backoff_delay();
                logger::debug(
                    LogTag::Api,
                    &format!(
                        "{} rate limited (429), retry {}/{} in {}ms: {}",
                        category.name(),
                        attempt,
                        self.settings.max_retries,
                        backoff.as_millis(),
                        url
                    ),
                );
                tokio::time::sleep(backoff).await;
                continue;
            }

            if status == StatusCode::NOT_FOUND {
                self.record_failure(category, elapsed, &ApiError::NotFound)
                    .await;
                return Err(ApiError::NotFound);
            }

            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    let error = if err.is_timeout() {
                        ApiError::Timeout
                    } else {
                        ApiError::NetworkError(err.to_string())
                    };
                    self.record_failure(category, elapsed, &error).await;
                    return Err(error);
                }
            };
            drop(permit);

            if !status.is_success() {
                let excerpt: String = body.chars().take(ERROR_BODY_LIMIT).collect();
                let error = ApiError::InvalidResponse(format!("HTTP {}: {}", status, excerpt));
                self.record_failure(category, elapsed, &error).await;
                return Err(error);
            }

            return match serde_json::from_str::<T>(&body) {
                Ok(value) => {
                    if let Some(tracker) = self.stats.get(&category) {
                        tracker.record_request(true, elapsed).await;
                    }
                    if is_debug_api_enabled() {
                        logger::debug(
                            LogTag::Api,
                            &format!("{} {} in {:.0}ms: {}", category.name(), status, elapsed, url),
                        );
                    }
                    Ok(value)
                }
                Err(err) => {
                    let error = ApiError::InvalidResponse(format!("Parse error: {}", err));
                    self.record_failure(category, elapsed, &error).await;
                    Err(error)
                }
            };
        }
    }

    fn backoff_delay(&self) -> Duration {
        let jitter_ms = self.settings.backoff_jitter.as_millis() as u64;
        let jitter = if jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=jitter_ms)
        } else {
            0
        };
        self.settings.backoff_base + Duration::from_millis(jitter)
    }

    async fn record_failure(&self, category: ApiCategory, elapsed_ms: f64, error: &ApiError) {
        if let Some(tracker) = self.stats.get(&category) {
            tracker.record_request(false, elapsed_ms).await;
            tracker.record_error(error.to_string()).await;
        }
    }

    pub async fn stats(&self, category: ApiCategory) -> ApiStats {
        match self.stats.get(&category) {
            Some(tracker) => tracker.get_stats().await,
            None => ApiStats::default(),
        }
    }

    pub async fn all_stats(&self) -> Vec<(ApiCategory, ApiStats)> {
        let mut out = Vec::with_capacity(self.stats.len());
        for category in ApiCategory::all() {
            out.push((category, self.stats(category).await));
        }
        out
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{fast_fetcher, serve};
    use super::*;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::get;
    use axum::Router;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(serde::Deserialize)]
    struct Ping {
        ok: bool,
    }

    #[tokio::test]
    async fn test_retries_after_429_then_succeeds() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/ping",
            get(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        (AxumStatus::TOO_MANY_REQUESTS, "slow down".to_string())
                    } else {
                        (AxumStatus::OK, r#"{"ok":true}"#.to_string())
                    }
                }
            }),
        );
        let base = serve(router).await;
        let fetcher = fast_fetcher(2, Duration::from_secs(5));

        let ping: Ping = fetcher
            .get_json(ApiCategory::Jupiter, &format!("{}/ping", base), &[])
            .await
            .unwrap();
        assert!(ping.ok);
        assert_eq!(hits.load(Ordering::SeqCst), 3);

        let stats = fetcher.stats(ApiCategory::Jupiter).await;
        assert_eq!(stats.rate_limited, 2);
        assert_eq!(stats.successful_requests, 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/ping",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    AxumStatus::TOO_MANY_REQUESTS
                }
            }),
        );
        let base = serve(router).await;
        let fetcher = fast_fetcher(2, Duration::from_secs(5));

        let result: Result<Ping, ApiError> = fetcher
            .get_json(ApiCategory::RugCheck, &format!("{}/ping", base), &[])
            .await;
        assert_eq!(result.err(), Some(ApiError::RateLimitExceeded));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_status_and_body_mapping() {
        let router = Router::new()
            .route("/missing", get(|| async { AxumStatus::NOT_FOUND }))
            .route(
                "/broken",
                get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .route("/garbage", get(|| async { "not json" }));
        let base = serve(router).await;
        let fetcher = fast_fetcher(0, Duration::from_secs(5));

        let missing: Result<Ping, _> = fetcher
            .get_json(ApiCategory::DexScreener, &format!("{}/missing", base), &[])
            .await;
        assert_eq!(missing.err(), Some(ApiError::NotFound));

        let broken: Result<Ping, _> = fetcher
            .get_json(ApiCategory::DexScreener, &format!("{}/broken", base), &[])
            .await;
        assert!(matches!(broken, Err(ApiError::InvalidResponse(ref m)) if m.contains("500")));

        let garbage: Result<Ping, _> = fetcher
            .get_json(ApiCategory::DexScreener, &format!("{}/garbage", base), &[])
            .await;
        assert!(matches!(garbage, Err(ApiError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let router = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                r#"{"ok":true}"#
            }),
        );
        let base = serve(router).await;
        let fetcher = fast_fetcher(0, Duration::from_millis(200));

        let result: Result<Ping, _> = fetcher
            .get_json(ApiCategory::Helius, &format!("{}/slow", base), &[])
            .await;
        assert_eq!(result.err(), Some(ApiError::Timeout));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = fast_fetcher(0, Duration::from_secs(2));
        let result: Result<Ping, _> = fetcher
            .get_json(ApiCategory::Solscan, &format!("http://{}/x", addr), &[])
            .await;
        assert!(matches!(result, Err(ApiError::NetworkError(_))));
    }

    #[tokio::test]
    async fn test_throttled_category_does_not_block_others() {
        let router = Router::new().route("/ping", get(|| async { r#"{"ok":true}"# }));
        let base = serve(router).await;
        let url = format!("{}/ping", base);

        let settings = FetchSettings {
            max_concurrent: 2,
            timeout: Duration::from_secs(5),
            max_retries: 0,
            backoff_base: Duration::from_millis(10),
            backoff_jitter: Duration::ZERO,
            user_agent: "tokenscout-test".to_string(),
        };
        let delays = HashMap::from([(ApiCategory::RugCheck, Duration::from_millis(1500))]);
        let fetcher = Arc::new(ApiFetcher::with_settings(settings, delays).unwrap());

        let mut queued = Vec::new();
        for _ in 0..3 {
            let fetcher = fetcher.clone();
            let url = url.clone();
            queued.push(tokio::spawn(async move {
                let _: Result<Ping, ApiError> =
                    fetcher.get_json(ApiCategory::RugCheck, &url, &[]).await;
            }));
        }
        tokio::time::sleep(Duration::from_millis(100)).await;

        let started = Instant::now();
        let ping: Ping = fetcher
            .get_json(ApiCategory::DexScreener, &url, &[])
            .await
            .unwrap();
        assert!(ping.ok);
        assert!(started.elapsed() < Duration::from_millis(500));

        for handle in queued {
            handle.abort();
        }
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_request_starts() {
        let limiter = RateLimiter::new(Duration::from_millis(50));
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
