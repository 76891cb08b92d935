//! Error types for BetterRest

use thiserror::Error;

/// The single error surfaced by the bedtime estimator.
///
/// Every failure cause (model missing, model rejecting its input, a
/// non-finite prediction, timestamp overflow) collapses into this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Bedtime estimation failed")]
pub struct EstimationError;

/// Errors raised by predictive models and the collaborators that load them
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read model: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid model JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Input outside model domain: {0}")]
    InvalidInput(String),

    #[error("Prediction failed: {0}")]
    Computation(String),
}

/// Validation errors for values entering at the input boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("Invalid wake time: {0}")]
    InvalidWakeTime(String),

    #[error("Sleep goal must be between 4 and 12 hours in 0.25 steps, got {0}")]
    SleepGoalOutOfRange(f64),

    #[error("Caffeine intake must be between 1 and 20 units, got {0}")]
    CaffeineOutOfRange(u32),

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),
}
