//! Bedtime estimation
//!
//! Asks the predictive model how much sleep the user will actually get and
//! subtracts that from the wake-up timestamp. Every failure along the way is
//! reported as the same [`EstimationError`].

use chrono::{DateTime, TimeDelta, TimeZone};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::EstimationError;
use crate::model::{ModelLoader, PredictiveModel};
use crate::types::{Bedtime, PredictionInput};

/// Estimator bound to one predictive model, or to none if loading failed.
///
/// Cloning is cheap and clones share the model.
#[derive(Clone)]
pub struct BedtimeEstimator {
    model: Option<Arc<dyn PredictiveModel>>,
}

impl fmt::Debug for BedtimeEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BedtimeEstimator")
            .field("model", &self.model_name())
            .finish()
    }
}

impl BedtimeEstimator {
    pub fn new<M: PredictiveModel + 'static>(model: M) -> Self {
        Self {
            model: Some(Arc::new(model)),
        }
    }

    pub fn with_shared(model: Arc<dyn PredictiveModel>) -> Self {
        Self { model: Some(model) }
    }

    /// Load the model through `loader`. A load failure is logged and yields
    /// an estimator whose every call fails.
    pub fn from_loader(loader: &dyn ModelLoader) -> Self {
        match loader.load() {
            Ok(model) => Self::with_shared(model),
            Err(e) => {
                warn!(error = %e, "predictive model unavailable");
                Self::unavailable()
            }
        }
    }

    /// An estimator with no model
    pub fn unavailable() -> Self {
        Self { model: None }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model.as_deref().map(|m| m.name())
    }

    /// Estimate the bedtime for `input`, waking at `wake`.
    ///
    /// The result keeps the time zone of `wake`; crossing midnight moves the
    /// bedtime to the previous calendar day.
    pub fn estimate<Tz: TimeZone>(
        &self,
        input: &PredictionInput,
        wake: &DateTime<Tz>,
    ) -> Result<Bedtime<Tz>, EstimationError> {
        let Some(model) = self.model.as_deref() else {
            warn!("estimation requested without a predictive model");
            return Err(EstimationError);
        };

        let hours = model.predict(input).map_err(|e| {
            warn!(error = %e, model = model.name(), "prediction failed");
            EstimationError
        })?;

        if !hours.is_finite() {
            warn!(hours, model = model.name(), "prediction is not a finite number");
            return Err(EstimationError);
        }
        debug!(hours, model = model.name(), "predicted actual sleep");

        // f64 -> i64 saturates; try_milliseconds rejects what TimeDelta cannot hold
        let sleep = TimeDelta::try_milliseconds((hours * 3_600_000.0).round() as i64)
            .ok_or_else(|| {
                warn!(hours, "predicted sleep does not fit in a duration");
                EstimationError
            })?;
        let at = wake.clone().checked_sub_signed(sleep).ok_or_else(|| {
            warn!("bedtime falls outside the representable date range");
            EstimationError
        })?;

        Ok(Bedtime {
            at,
            actual_sleep_hours: hours,
        })
    }
}
