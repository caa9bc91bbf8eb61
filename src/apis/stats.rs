/// Per-API request statistics
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ApiStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub rate_limited: u64,
    pub average_latency_ms: f64,
    pub last_error: Option<String>,
    pub last_error_at: Option<DateTime<Utc>>,
}

impl ApiStats {
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.successful_requests as f64 / self.total_requests as f64 * 100.0
    }
}

pub struct ApiStatsTracker {
    inner: Mutex<ApiStats>,
}

impl Default for ApiStatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiStatsTracker {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ApiStats::default()),
        }
    }

    /// Count one finished request and fold its latency into the running mean
    pub async fn record_request(&self, success: bool, elapsed_ms: f64) {
        let mut stats = self.inner.lock().await;
        stats.total_requests += 1;
        if success {
            stats.successful_requests += 1;
        } else {
            stats.failed_requests += 1;
        }
        let n = stats.total_requests as f64;
        stats.average_latency_ms += (elapsed_ms - stats.average_latency_ms) / n;
    }

    pub async fn record_rate_limited(&self) {
        self.inner.lock().await.rate_limited += 1;
    }

    pub async fn record_error(&self, message: String) {
        let mut stats = self.inner.lock().await;
        stats.last_error = Some(message);
        stats.last_error_at = Some(Utc::now());
    }

    pub async fn get_stats(&self) -> ApiStats {
        self.inner.lock().await.clone()
    }
}

/// One line per API that has seen traffic, `None` when none has
pub fn format_stats_summary(stats: &[(String, ApiStats)]) -> Option<String> {
    let parts: Vec<String> = stats
        .iter()
        .filter(|(_, s)| s.total_requests > 0 || s.rate_limited > 0)
        .map(|(name, s)| {
            format!(
                "{} {} req {:.0}% ok {} limited {:.0}ms",
                name,
                s.total_requests,
                s.success_rate(),
                s.rate_limited,
                s.average_latency_ms
            )
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}
