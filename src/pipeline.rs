//! Pipeline orchestration
//!
//! This module provides the public API for BetterRest.
//! It runs one computation from raw inputs to a display-ready report.

use chrono::{DateTime, NaiveDate, TimeZone};
use std::fmt::Display;
use tracing::warn;

use crate::config::Config;
use crate::encoder::{BedtimeReport, ReportEncoder};
use crate::estimator::BedtimeEstimator;
use crate::model::ModelLoader;
use crate::normalizer::Normalizer;
use crate::types::{CaffeineIntake, SleepGoal, WakeTime};

/// Compute a bedtime report in one shot, loading the model for this call.
///
/// # Arguments
/// * `wake` - Wake-up timestamp; its time of day feeds the model and the
///   bedtime is computed relative to it
/// * `sleep_goal` - Desired hours of sleep
/// * `caffeine` - Daily caffeine units
/// * `loader` - Supplies the predictive model; a load failure produces the
///   failure report
///
/// # Example
/// ```ignore
/// let report = calculate_bedtime(&wake, SleepGoal::default(), CaffeineIntake::default(), &BuiltinModel);
/// println!("{}: {}", report.title, report.message);
/// ```
pub fn calculate_bedtime<Tz>(
    wake: &DateTime<Tz>,
    sleep_goal: SleepGoal,
    caffeine: CaffeineIntake,
    loader: &dyn ModelLoader,
) -> BedtimeReport
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    BedtimeCalculator::new(loader).calculate(wake, sleep_goal, caffeine)
}

/// Reusable calculator holding a loaded model and display settings.
///
/// Use this when the host recomputes on every input change.
#[derive(Debug, Clone)]
pub struct BedtimeCalculator {
    estimator: BedtimeEstimator,
    encoder: ReportEncoder,
}

impl BedtimeCalculator {
    /// Create a calculator with default display settings
    pub fn new(loader: &dyn ModelLoader) -> Self {
        Self::with_estimator(BedtimeEstimator::from_loader(loader), ReportEncoder::new())
    }

    pub fn with_estimator(estimator: BedtimeEstimator, encoder: ReportEncoder) -> Self {
        Self { estimator, encoder }
    }

    /// Create a calculator from configuration
    pub fn from_config(config: &Config) -> Self {
        let loader = config.model.loader();
        Self::with_estimator(BedtimeEstimator::from_loader(loader.as_ref()), config.encoder())
    }

    pub fn estimator(&self) -> &BedtimeEstimator {
        &self.estimator
    }

    pub fn encoder(&self) -> &ReportEncoder {
        &self.encoder
    }

    /// Run normalization, estimation and encoding for one wake timestamp
    pub fn calculate<Tz>(
        &self,
        wake: &DateTime<Tz>,
        sleep_goal: SleepGoal,
        caffeine: CaffeineIntake,
    ) -> BedtimeReport
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let input = Normalizer::normalize_timestamp(wake, sleep_goal, caffeine);
        let result = self.estimator.estimate(&input, wake);
        self.encoder.encode(&input, &result)
    }

    /// Resolve `wake` on `date` in `tz`, then calculate.
    ///
    /// A wall-clock time skipped by a DST transition yields the failure
    /// report; an ambiguous one uses the earlier instant.
    pub fn calculate_on<Tz>(
        &self,
        date: NaiveDate,
        wake: WakeTime,
        tz: &Tz,
        sleep_goal: SleepGoal,
        caffeine: CaffeineIntake,
    ) -> BedtimeReport
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let local = date.and_time(wake.as_naive_time());
        match tz.from_local_datetime(&local).earliest() {
            Some(wake_at) => self.calculate(&wake_at, sleep_goal, caffeine),
            None => {
                warn!(%local, "wake time does not exist in this time zone");
                ReportEncoder::failure()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{ReportStatus, ERROR_MESSAGE, ERROR_TITLE, SUCCESS_TITLE};
    use crate::error::ModelError;
    use crate::model::{BuiltinModel, JsonModelFile, PredictiveModel};
    use crate::types::PredictionInput;
    use chrono::{FixedOffset, Utc};
    use chrono_tz::America::New_York;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    struct StubLoader(f64);

    impl ModelLoader for StubLoader {
        fn load(&self) -> Result<Arc<dyn PredictiveModel>, ModelError> {
            let hours = self.0;
            Ok(Arc::new(move |_: &PredictionInput| -> Result<f64, ModelError> { Ok(hours) }))
        }
    }

    struct RaisingLoader;

    impl ModelLoader for RaisingLoader {
        fn load(&self) -> Result<Arc<dyn PredictiveModel>, ModelError> {
            Ok(Arc::new(|_: &PredictionInput| -> Result<f64, ModelError> {
                Err(ModelError::Computation("stub raised".to_string()))
            }))
        }
    }

    fn goal(hours: f64) -> SleepGoal {
        SleepGoal::new(hours).unwrap()
    }

    fn coffee(units: u32) -> CaffeineIntake {
        CaffeineIntake::new(units).unwrap()
    }

    #[test]
    fn test_scenario_seven_am_eight_hours_one_coffee() {
        let wake = Utc.with_ymd_and_hms(2024, 1, 16, 7, 0, 0).unwrap();
        let report = calculate_bedtime(&wake, goal(8.0), coffee(1), &StubLoader(7.5));

        assert_eq!(report.status, ReportStatus::Success);
        assert_eq!(report.title, SUCCESS_TITLE);
        assert_eq!(report.message, "23:30");
        assert_eq!(report.bedtime.as_deref(), Some("2024-01-15T23:30:00+00:00"));
    }

    #[test]
    fn test_scenario_six_thirty_nine_hours_four_coffees() {
        let wake = Utc.with_ymd_and_hms(2024, 1, 16, 6, 30, 0).unwrap();
        let report = calculate_bedtime(&wake, goal(9.0), coffee(4), &StubLoader(8.0));

        assert_eq!(report.message, "22:30");
    }

    #[test]
    fn test_scenario_raising_model() {
        let wake = Utc.with_ymd_and_hms(2024, 1, 16, 7, 0, 0).unwrap();
        let report = calculate_bedtime(&wake, goal(8.0), coffee(1), &RaisingLoader);

        assert_eq!(report.status, ReportStatus::Failure);
        assert_eq!(report.title, ERROR_TITLE);
        assert_eq!(report.message, ERROR_MESSAGE);
        assert_eq!(report.bedtime, None);
        assert_eq!(report.actual_sleep_hours, None);
    }

    #[test]
    fn test_unloadable_model_reports_failure() {
        let wake = Utc.with_ymd_and_hms(2024, 1, 16, 7, 0, 0).unwrap();
        let loader = JsonModelFile::new("/nonexistent/model.json");
        let report = calculate_bedtime(&wake, goal(8.0), coffee(1), &loader);

        assert_eq!(report.title, ERROR_TITLE);
        assert_eq!(report.message, ERROR_MESSAGE);
    }

    #[test]
    fn test_calculator_reused_across_input_changes() {
        let calculator = BedtimeCalculator::new(&BuiltinModel);
        let wake = Utc.with_ymd_and_hms(2024, 1, 16, 7, 0, 0).unwrap();

        let mut sleep_goal = SleepGoal::default();
        let first = calculator.calculate(&wake, sleep_goal, CaffeineIntake::default());
        sleep_goal = sleep_goal.increment();
        let second = calculator.calculate(&wake, sleep_goal, CaffeineIntake::default());

        assert!(first.is_success() && second.is_success());
        assert!(second.bedtime < first.bedtime);
        assert_eq!(
            calculator.calculate(&wake, SleepGoal::default(), CaffeineIntake::default()),
            first
        );
    }

    #[test]
    fn test_calculate_on_resolves_in_zone() {
        let calculator = BedtimeCalculator::with_estimator(
            BedtimeEstimator::from_loader(&StubLoader(8.0)),
            ReportEncoder::new(),
        );
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let report = calculator.calculate_on(
            date,
            WakeTime::new(6, 0).unwrap(),
            &tz,
            goal(8.0),
            coffee(1),
        );

        assert_eq!(report.message, "22:00");
        assert_eq!(report.bedtime.as_deref(), Some("2024-05-31T22:00:00+02:00"));
    }

    #[test]
    fn test_calculate_on_dst_gap_reports_failure() {
        let calculator = BedtimeCalculator::with_estimator(
            BedtimeEstimator::from_loader(&StubLoader(8.0)),
            ReportEncoder::new(),
        );
        // Clocks jump from 02:00 to 03:00 in New York on this date
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

        let report = calculator.calculate_on(
            date,
            WakeTime::new(2, 30).unwrap(),
            &New_York,
            goal(8.0),
            coffee(1),
        );
        assert_eq!(report, ReportEncoder::failure());

        let after_gap = calculator.calculate_on(
            date,
            WakeTime::new(3, 30).unwrap(),
            &New_York,
            goal(8.0),
            coffee(1),
        );
        assert!(after_gap.is_success());
    }

    #[test]
    fn test_calculate_on_ambiguous_time_uses_earlier_instant() {
        let calculator = BedtimeCalculator::with_estimator(
            BedtimeEstimator::from_loader(&StubLoader(8.0)),
            ReportEncoder::new(),
        );
        // 01:00-02:00 occurs twice in New York on this date (EDT, then EST)
        let date = NaiveDate::from_ymd_opt(2024, 11, 3).unwrap();

        let report = calculator.calculate_on(
            date,
            WakeTime::new(1, 30).unwrap(),
            &New_York,
            goal(8.0),
            coffee(1),
        );

        // 01:30 EDT is 05:30 UTC; eight hours earlier is 21:30 UTC, 17:30 EDT
        assert_eq!(report.bedtime.as_deref(), Some("2024-11-02T17:30:00-04:00"));
        assert_eq!(report.message, "17:30");
    }

    #[test]
    fn test_unrenderable_time_format_reports_failure() {
        let calculator = BedtimeCalculator::with_estimator(
            BedtimeEstimator::from_loader(&BuiltinModel),
            ReportEncoder::new().with_time_format("%Q"),
        );
        let wake = Utc.with_ymd_and_hms(2024, 1, 16, 7, 0, 0).unwrap();

        let report = calculator.calculate(&wake, goal(8.0), coffee(1));
        assert_eq!(report, ReportEncoder::failure());
    }

    #[test]
    fn test_from_config_applies_display_settings() {
        let config = Config::from_json(r#"{"time_format": "%I:%M %p", "include_input": true}"#).unwrap();
        let calculator = BedtimeCalculator::from_config(&config);
        let wake = Utc.with_ymd_and_hms(2024, 1, 16, 7, 0, 0).unwrap();

        let report = calculator.calculate(&wake, goal(8.0), coffee(1));
        assert!(report.message.ends_with("PM"));
        assert_eq!(
            report.input,
            Some(PredictionInput {
                wake_seconds: 25_200,
                sleep_goal_hours: 8.0,
                caffeine_units: 1,
            })
        );
    }
}
