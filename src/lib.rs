//! Fraud Scoring Library
//!
//! Scores a single card transaction against four independently trained
//! classifiers (logistic regression, k-neighbors, SVM, decision tree),
//! normalizes their outputs and derives a consensus fraud decision.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod presentation;
pub mod samples;
pub mod types;
pub mod validator;

pub use config::AppConfig;
pub use error::{FraudScoringError, ModelLoadError, ScoringError, ValidationError};
pub use feature_extractor::FeatureExtractor;
pub use models::{ModelRegistry, PredictionAggregator};
pub use types::{AggregateResult, ModelKey, ModelScore, TransactionRecord};
pub use validator::validate;
