//! In-memory TTL + LRU cache shared by the API clients

mod config;
mod manager;

pub use config::CacheConfig;
pub use manager::{CacheManager, CacheMetrics};
