//! BetterRest - On-device bedtime estimation engine
//!
//! BetterRest turns a desired wake-up time, a sleep goal and a daily caffeine
//! count into a recommended bedtime through a short deterministic pipeline:
//! input normalization → model prediction → bedtime arithmetic → report
//! encoding.
//!
//! The predictive model is pluggable: anything implementing
//! [`PredictiveModel`] can back the estimator, and loading it is delegated to
//! a [`ModelLoader`]. All estimation failures surface as one generic
//! [`EstimationError`], which the encoder turns into a fixed error report.

pub mod config;
pub mod encoder;
pub mod error;
pub mod estimator;
pub mod model;
pub mod normalizer;
pub mod pipeline;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::Config;
pub use encoder::{BedtimeReport, ReportEncoder};
pub use error::{EstimationError, ModelError};
pub use estimator::BedtimeEstimator;
pub use model::{BuiltinModel, JsonModelFile, LinearSleepModel, ModelLoader, PredictiveModel};
pub use normalizer::Normalizer;
pub use pipeline::{calculate_bedtime, BedtimeCalculator};
pub use types::{Bedtime, CaffeineIntake, PredictionInput, SleepGoal, WakeTime};

/// Library version embedded in every report
pub const REST_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "better-rest";
