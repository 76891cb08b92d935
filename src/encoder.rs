//! Report encoding
//!
//! This module turns an estimation result into the display-ready report the
//! host shows: a fixed title plus either a formatted bedtime or a fixed
//! generic error message.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Write};
use tracing::warn;

use crate::error::EstimationError;
use crate::types::{Bedtime, PredictionInput};
use crate::{PRODUCER_NAME, REST_VERSION};

/// Title shown with a successful estimate
pub const SUCCESS_TITLE: &str = "Your ideal bedtime is…";
/// Title shown when estimation fails
pub const ERROR_TITLE: &str = "Error";
/// Message shown when estimation fails
pub const ERROR_MESSAGE: &str = "Sorry, there was a problem calculating your bedtime.";

/// Default display format for the bedtime (24-hour clock)
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Success,
    Failure,
}

/// Display-ready outcome of one estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BedtimeReport {
    pub status: ReportStatus,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedtime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_sleep_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<PredictionInput>,
    pub producer: ReportProducer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
}

impl BedtimeReport {
    pub fn is_success(&self) -> bool {
        self.status == ReportStatus::Success
    }
}

/// Encoder for producing bedtime reports
#[derive(Debug, Clone)]
pub struct ReportEncoder {
    time_format: String,
    include_input: bool,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    pub fn new() -> Self {
        Self {
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            include_input: false,
        }
    }

    /// Use a custom `chrono` strftime pattern for the bedtime message
    pub fn with_time_format(mut self, time_format: impl Into<String>) -> Self {
        self.time_format = time_format.into();
        self
    }

    /// Echo the normalized prediction input in successful reports
    pub fn with_input(mut self, include_input: bool) -> Self {
        self.include_input = include_input;
        self
    }

    /// Encode an estimation outcome
    pub fn encode<Tz>(
        &self,
        input: &PredictionInput,
        result: &Result<Bedtime<Tz>, EstimationError>,
    ) -> BedtimeReport
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        match result {
            Ok(bedtime) => self.success(input, bedtime),
            Err(_) => Self::failure(),
        }
    }

    /// Format a timestamp the way success messages show it.
    ///
    /// Returns `None` when the pattern cannot be rendered.
    pub fn format_time<Tz>(&self, at: &DateTime<Tz>) -> Option<String>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut out = String::new();
        write!(out, "{}", at.format(&self.time_format)).ok()?;
        Some(out)
    }

    fn success<Tz>(&self, input: &PredictionInput, bedtime: &Bedtime<Tz>) -> BedtimeReport
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let Some(message) = self.format_time(&bedtime.at) else {
            warn!(time_format = %self.time_format, "bedtime could not be formatted");
            return Self::failure();
        };

        BedtimeReport {
            status: ReportStatus::Success,
            title: SUCCESS_TITLE.to_string(),
            message,
            bedtime: Some(bedtime.at.to_rfc3339()),
            actual_sleep_hours: Some(bedtime.actual_sleep_hours),
            input: self.include_input.then_some(*input),
            producer: producer(),
        }
    }

    /// The fixed failure report; carries no timestamp
    pub fn failure() -> BedtimeReport {
        BedtimeReport {
            status: ReportStatus::Failure,
            title: ERROR_TITLE.to_string(),
            message: ERROR_MESSAGE.to_string(),
            bedtime: None,
            actual_sleep_hours: None,
            input: None,
            producer: producer(),
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(report: &BedtimeReport) -> Result<String, serde_json::Error> {
        serde_json::to_string(report)
    }
}

/// Whether `pattern` is a strftime pattern chrono can render
pub fn is_valid_time_format(pattern: &str) -> bool {
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

fn producer() -> ReportProducer {
    ReportProducer {
        name: PRODUCER_NAME.to_string(),
        version: REST_VERSION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn sample_input() -> PredictionInput {
        PredictionInput {
            wake_seconds: 25_200,
            sleep_goal_hours: 8.0,
            caffeine_units: 1,
        }
    }

    fn sample_bedtime() -> Bedtime<Utc> {
        Bedtime {
            at: Utc.with_ymd_and_hms(2024, 1, 15, 23, 30, 0).unwrap(),
            actual_sleep_hours: 7.5,
        }
    }

    #[test]
    fn test_success_report() {
        let report = ReportEncoder::new().encode(&sample_input(), &Ok(sample_bedtime()));

        assert!(report.is_success());
        assert_eq!(report.title, SUCCESS_TITLE);
        assert_eq!(report.message, "23:30");
        assert_eq!(report.bedtime.as_deref(), Some("2024-01-15T23:30:00+00:00"));
        assert_eq!(report.actual_sleep_hours, Some(7.5));
        assert_eq!(report.input, None);
    }

    #[test]
    fn test_failure_report_is_fixed() {
        let report = ReportEncoder::new().encode::<Utc>(&sample_input(), &Err(EstimationError));

        assert_eq!(report, ReportEncoder::failure());
        assert_eq!(report.status, ReportStatus::Failure);
        assert_eq!(report.title, ERROR_TITLE);
        assert_eq!(report.message, ERROR_MESSAGE);
        assert_eq!(report.bedtime, None);
    }

    #[test]
    fn test_custom_time_format_and_input_echo() {
        let encoder = ReportEncoder::new().with_time_format("%I:%M %p").with_input(true);
        let report = encoder.encode(&sample_input(), &Ok(sample_bedtime()));

        assert_eq!(report.message, "11:30 PM");
        assert_eq!(report.input, Some(sample_input()));
    }

    #[test]
    fn test_unrenderable_time_format_reports_failure() {
        let encoder = ReportEncoder::new().with_time_format("%Q");
        let report = encoder.encode(&sample_input(), &Ok(sample_bedtime()));

        assert_eq!(report, ReportEncoder::failure());
        assert_eq!(encoder.format_time(&sample_bedtime().at), None);
    }

    #[test]
    fn test_time_format_validation() {
        assert!(is_valid_time_format(DEFAULT_TIME_FORMAT));
        assert!(is_valid_time_format("%I:%M %p"));
        assert!(!is_valid_time_format("%Q"));
        assert!(!is_valid_time_format("%H:%"));
    }

    #[test]
    fn test_json_shape() {
        let report = ReportEncoder::new().encode(&sample_input(), &Ok(sample_bedtime()));
        let json = ReportEncoder::encode_to_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["status"], "success");
        assert_eq!(value["message"], "23:30");
        assert_eq!(value["producer"]["name"], PRODUCER_NAME);
        assert!(value.get("input").is_none());

        let failure = ReportEncoder::encode_to_json(&ReportEncoder::failure()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&failure).unwrap();
        assert_eq!(value["status"], "failure");
        assert!(value.get("bedtime").is_none());
    }
}
