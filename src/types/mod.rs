//! Type definitions for transaction scoring

pub mod score;
pub mod transaction;

pub use score::{AggregateResult, ModelKey, ModelScore, RiskBand, RiskBandThresholds, Verdict};
pub use transaction::TransactionRecord;
