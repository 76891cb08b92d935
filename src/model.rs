//! Predictive sleep models
//!
//! The estimator depends on a model only through [`PredictiveModel`]. Models
//! are obtained from a [`ModelLoader`], which may fail; that failure is an
//! ordinary outcome the estimator turns into its generic error.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ModelError;
use crate::types::{PredictionInput, SECONDS_PER_DAY};

/// A fixed-form function from prediction features to hours of actual sleep.
///
/// Implementations must be pure: the same input always yields the same
/// output, and `predict` never mutates shared state.
pub trait PredictiveModel: Send + Sync {
    /// Estimate the actual sleep duration in hours
    fn predict(&self, input: &PredictionInput) -> Result<f64, ModelError>;

    /// Human-readable identifier for diagnostics
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> PredictiveModel for F
where
    F: Fn(&PredictionInput) -> Result<f64, ModelError> + Send + Sync,
{
    fn predict(&self, input: &PredictionInput) -> Result<f64, ModelError> {
        self(input)
    }
}

/// Trait for collaborators that produce a ready-to-use model
pub trait ModelLoader {
    fn load(&self) -> Result<Arc<dyn PredictiveModel>, ModelError>;
}

/// Linear regression over the three prediction features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSleepModel {
    pub intercept: f64,
    /// Weight applied to the wake time expressed in hours since midnight
    pub wake_hours_weight: f64,
    pub sleep_goal_weight: f64,
    pub caffeine_weight: f64,
}

/// Serialized model document; `kind` selects the model family
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ModelDocument {
    Linear(LinearSleepModel),
}

impl Default for LinearSleepModel {
    /// Reference coefficients: each caffeine unit costs about seven minutes
    /// of extra time in bed, later wake times add a little more.
    fn default() -> Self {
        Self {
            intercept: -0.35,
            wake_hours_weight: 0.02,
            sleep_goal_weight: 1.0,
            caffeine_weight: 0.12,
        }
    }
}

impl LinearSleepModel {
    /// Load a model from its JSON document
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let document: ModelDocument = serde_json::from_str(json)?;
        let ModelDocument::Linear(model) = document;
        model.check_coefficients()?;
        Ok(model)
    }

    /// Serialize the model to its JSON document
    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(&ModelDocument::Linear(self.clone()))?)
    }

    fn check_coefficients(&self) -> Result<(), ModelError> {
        let all_finite = [
            self.intercept,
            self.wake_hours_weight,
            self.sleep_goal_weight,
            self.caffeine_weight,
        ]
        .iter()
        .all(|c| c.is_finite());

        if all_finite {
            Ok(())
        } else {
            Err(ModelError::Unavailable(
                "model coefficients must be finite".to_string(),
            ))
        }
    }
}

impl PredictiveModel for LinearSleepModel {
    fn predict(&self, input: &PredictionInput) -> Result<f64, ModelError> {
        if input.wake_seconds >= SECONDS_PER_DAY {
            return Err(ModelError::InvalidInput(format!(
                "wake_seconds {} is not a time of day",
                input.wake_seconds
            )));
        }
        if !input.sleep_goal_hours.is_finite() {
            return Err(ModelError::InvalidInput(
                "sleep goal is not a finite number".to_string(),
            ));
        }

        let [wake_seconds, sleep_goal, caffeine] = input.features();
        let hours = self.intercept
            + self.wake_hours_weight * (wake_seconds / 3600.0)
            + self.sleep_goal_weight * sleep_goal
            + self.caffeine_weight * caffeine;

        if !hours.is_finite() || hours <= 0.0 {
            return Err(ModelError::Computation(format!(
                "predicted sleep of {hours} hours"
            )));
        }
        Ok(hours)
    }

    fn name(&self) -> &str {
        "linear"
    }
}

/// Loader for the reference model compiled into the library
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinModel;

impl ModelLoader for BuiltinModel {
    fn load(&self) -> Result<Arc<dyn PredictiveModel>, ModelError> {
        Ok(Arc::new(LinearSleepModel::default()))
    }
}

/// Loader reading a JSON model document from disk
#[derive(Debug, Clone)]
pub struct JsonModelFile {
    pub path: PathBuf,
}

impl JsonModelFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ModelLoader for JsonModelFile {
    fn load(&self) -> Result<Arc<dyn PredictiveModel>, ModelError> {
        let json = fs::read_to_string(&self.path)?;
        Ok(Arc::new(LinearSleepModel::from_json(&json)?))
    }
}

/// Loader for a JSON model document already held in memory
#[derive(Debug, Clone, Copy)]
pub struct JsonModelText<'a>(pub &'a str);

impl ModelLoader for JsonModelText<'_> {
    fn load(&self) -> Result<Arc<dyn PredictiveModel>, ModelError> {
        Ok(Arc::new(LinearSleepModel::from_json(self.0)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn input(wake_seconds: u32, sleep_goal_hours: f64, caffeine_units: u32) -> PredictionInput {
        PredictionInput {
            wake_seconds,
            sleep_goal_hours,
            caffeine_units,
        }
    }

    #[test]
    fn test_linear_prediction() {
        let model = LinearSleepModel {
            intercept: 0.5,
            wake_hours_weight: 0.0,
            sleep_goal_weight: 1.0,
            caffeine_weight: 0.25,
        };
        let hours = model.predict(&input(25_200, 8.0, 2)).unwrap();
        assert!((hours - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_builtin_is_deterministic() {
        let model = LinearSleepModel::default();
        let x = input(23_400, 9.0, 4);
        assert_eq!(model.predict(&x).unwrap(), model.predict(&x).unwrap());
    }

    #[test]
    fn test_builtin_monotonic_in_caffeine() {
        let model = LinearSleepModel::default();
        for quarter in 16..=48 {
            let goal = f64::from(quarter) * 0.25;
            let mut previous = 0.0;
            for coffee in 1..=20 {
                let hours = model.predict(&input(25_200, goal, coffee)).unwrap();
                assert!(hours >= previous, "goal {goal} coffee {coffee}");
                previous = hours;
            }
        }
    }

    #[test]
    fn test_builtin_positive_over_input_domain() {
        let model = LinearSleepModel::default();
        for wake in (0..SECONDS_PER_DAY).step_by(900) {
            for coffee in [1, 20] {
                for goal in [4.0, 12.0] {
                    let hours = model.predict(&input(wake, goal, coffee)).unwrap();
                    assert!(hours > 0.0 && hours < 24.0);
                }
            }
        }
    }

    #[test]
    fn test_rejects_wake_outside_day() {
        let model = LinearSleepModel::default();
        let err = model.predict(&input(SECONDS_PER_DAY, 8.0, 1)).unwrap_err();
        assert!(matches!(err, ModelError::InvalidInput(_)));
    }

    #[test]
    fn test_rejects_non_positive_prediction() {
        let model = LinearSleepModel {
            intercept: -20.0,
            ..LinearSleepModel::default()
        };
        let err = model.predict(&input(0, 4.0, 1)).unwrap_err();
        assert!(matches!(err, ModelError::Computation(_)));
    }

    #[test]
    fn test_json_document_roundtrip() {
        let model = LinearSleepModel::default();
        let json = model.to_json().unwrap();
        assert!(json.contains("\"kind\": \"linear\""));
        assert_eq!(LinearSleepModel::from_json(&json).unwrap(), model);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = LinearSleepModel::from_json(r#"{"kind": "forest", "trees": 10}"#).unwrap_err();
        assert!(matches!(err, ModelError::Json(_)));
    }

    #[test]
    fn test_missing_file_fails_to_load() {
        let loader = JsonModelFile::new("/nonexistent/better-rest/model.json");
        assert!(matches!(loader.load(), Err(ModelError::Io(_))));
    }

    #[test]
    fn test_text_loader() {
        let loader = JsonModelText(
            r#"{"kind":"linear","intercept":0.0,"wake_hours_weight":0.0,"sleep_goal_weight":1.0,"caffeine_weight":0.0}"#,
        );
        let model = loader.load().unwrap();
        assert_eq!(model.name(), "linear");
        assert_eq!(model.predict(&input(0, 7.5, 3)).unwrap(), 7.5);
    }

    #[test]
    fn test_closure_as_model() {
        let model = |x: &PredictionInput| -> Result<f64, ModelError> { Ok(x.sleep_goal_hours - 0.5) };
        assert_eq!(model.predict(&input(0, 8.0, 1)).unwrap(), 7.5);
        assert_eq!(model.name(), "custom");
    }
}
