//! Error types for the scorer.

use crate::storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScorerError {
    /// Threshold table out of range or out of order.
    #[error("invalid thresholds: {0}")]
    InvalidThresholds(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
