//! External API clients
//!
//! All clients share one [`client::ApiFetcher`] that owns rate limiting,
//! retries on HTTP 429 and per-API statistics.

pub mod birdeye;
pub mod client;
pub mod dexscreener;
pub mod errors;
pub mod jupiter;
pub mod manager;
pub mod rugcheck;
pub mod solana_rpc;
pub mod solscan;
pub mod stats;

pub use client::{ApiCategory, ApiFetcher};
pub use errors::ApiError;
pub use manager::ApiManager;
pub use stats::{format_stats_summary, ApiStats, ApiStatsTracker};
