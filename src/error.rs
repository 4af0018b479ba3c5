//! Error types for Vitalflow

use thiserror::Error;

/// Errors that can occur during signal derivation
#[derive(Debug, Error)]
pub enum DeriveError {
    #[error("Intake profile is required for this computation: {0}")]
    MissingIntakeData(String),

    #[error("Invalid intake profile: {0}")]
    InvalidProfile(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid component weights: {0}")]
    InvalidWeights(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse state snapshot: {0}")]
    StateError(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Unknown alert: {0}")]
    UnknownAlert(String),
}
