//! Token domain: record types, enrichment, scoring and batch coordination

pub mod batch;
pub mod enrichment;
pub mod holders;
pub mod scoring;
pub mod types;

pub use batch::{BatchCoordinator, BatchReport, TokenStore};
pub use enrichment::{merge_snapshots, ApiEnricher, TokenEnricher};
pub use scoring::calculate_invest_score;
pub use types::{BondingCurveStatus, TokenRecord};
