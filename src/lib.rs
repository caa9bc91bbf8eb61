//! tokenscout: Solana meme-token discovery, enrichment and scoring
//!
//! Discovery sources feed candidate mints into a batch coordinator that fans
//! out to the market, quote, safety and holder APIs, scores each token and
//! writes the batch to SQLite. A read-only JSON API serves the results.

pub mod apis;
pub mod arguments;
pub mod cache;
pub mod config;
pub mod database;
pub mod discovery;
pub mod logger;
pub mod paths;
pub mod scanner;
pub mod tokens;

#[cfg(feature = "web")]
pub mod webserver;
