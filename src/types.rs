//! Core types for the BetterRest engine
//!
//! These values are created at the start of one computation and dropped once
//! the result is produced. Nothing here is shared or persisted between calls.

use chrono::{DateTime, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InputError;

/// Seconds in one day; wake offsets are always strictly below this
pub const SECONDS_PER_DAY: u32 = 86_400;

/// Lower bound of the sleep goal (hours)
pub const MIN_SLEEP_GOAL_HOURS: f64 = 4.0;
/// Upper bound of the sleep goal (hours)
pub const MAX_SLEEP_GOAL_HOURS: f64 = 12.0;
/// Sleep goal stepper increment (hours)
pub const SLEEP_GOAL_STEP_HOURS: f64 = 0.25;

/// Lower bound of daily caffeine units
pub const MIN_CAFFEINE_UNITS: u32 = 1;
/// Upper bound of daily caffeine units
pub const MAX_CAFFEINE_UNITS: u32 = 20;

/// Desired wake-up time of day, independent of any calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WakeTime(NaiveTime);

impl WakeTime {
    /// Build a wake time from validated hour and minute components
    pub fn new(hour: u32, minute: u32) -> Result<Self, InputError> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self)
            .ok_or_else(|| InputError::InvalidWakeTime(format!("{hour:02}:{minute:02}")))
    }

    /// Build a wake time from optional components; missing parts become 0
    pub fn from_components(hour: Option<u32>, minute: Option<u32>) -> Result<Self, InputError> {
        Self::new(hour.unwrap_or(0), minute.unwrap_or(0))
    }

    /// Take the hour and minute of any time-bearing value, dropping seconds
    pub fn from_timelike<T: Timelike>(value: &T) -> Self {
        // hour() and minute() are always in range for chrono types
        Self(NaiveTime::from_hms_opt(value.hour(), value.minute(), 0).unwrap_or(NaiveTime::MIN))
    }

    /// Parse `HH:MM` (24-hour clock)
    pub fn parse(s: &str) -> Result<Self, InputError> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(|t| Self::from_timelike(&t))
            .map_err(|e| InputError::InvalidWakeTime(format!("{s}: {e}")))
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    pub fn as_naive_time(&self) -> NaiveTime {
        self.0
    }
}

impl Default for WakeTime {
    fn default() -> Self {
        Self(NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN))
    }
}

impl fmt::Display for WakeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Desired total hours of sleep
///
/// Bounded to [4, 12] in 0.25 h increments. The checked constructor enforces
/// that at the input boundary; downstream stages assume it holds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct SleepGoal(f64);

impl SleepGoal {
    pub fn new(hours: f64) -> Result<Self, InputError> {
        let steps = hours / SLEEP_GOAL_STEP_HOURS;
        let on_grid = (steps - steps.round()).abs() < 1e-9;
        if hours.is_finite()
            && (MIN_SLEEP_GOAL_HOURS..=MAX_SLEEP_GOAL_HOURS).contains(&hours)
            && on_grid
        {
            Ok(Self(hours))
        } else {
            Err(InputError::SleepGoalOutOfRange(hours))
        }
    }

    /// Wrap a value the caller has already range-checked
    pub fn new_unchecked(hours: f64) -> Self {
        Self(hours)
    }

    pub fn hours(&self) -> f64 {
        self.0
    }

    /// One stepper step up, saturating at the upper bound
    pub fn increment(self) -> Self {
        Self((self.0 + SLEEP_GOAL_STEP_HOURS).min(MAX_SLEEP_GOAL_HOURS))
    }

    /// One stepper step down, saturating at the lower bound
    pub fn decrement(self) -> Self {
        Self((self.0 - SLEEP_GOAL_STEP_HOURS).max(MIN_SLEEP_GOAL_HOURS))
    }
}

impl Default for SleepGoal {
    fn default() -> Self {
        Self(8.0)
    }
}

impl TryFrom<f64> for SleepGoal {
    type Error = InputError;

    fn try_from(hours: f64) -> Result<Self, Self::Error> {
        Self::new(hours)
    }
}

impl From<SleepGoal> for f64 {
    fn from(goal: SleepGoal) -> Self {
        goal.0
    }
}

impl fmt::Display for SleepGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} hours", self.0)
    }
}

/// Daily count of caffeinated beverage units, bounded to [1, 20]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct CaffeineIntake(u32);

impl CaffeineIntake {
    pub fn new(units: u32) -> Result<Self, InputError> {
        if (MIN_CAFFEINE_UNITS..=MAX_CAFFEINE_UNITS).contains(&units) {
            Ok(Self(units))
        } else {
            Err(InputError::CaffeineOutOfRange(units))
        }
    }

    /// Wrap a value the caller has already range-checked
    pub fn new_unchecked(units: u32) -> Self {
        Self(units)
    }

    pub fn units(&self) -> u32 {
        self.0
    }

    pub fn increment(self) -> Self {
        Self(self.0.saturating_add(1).min(MAX_CAFFEINE_UNITS))
    }

    pub fn decrement(self) -> Self {
        Self(self.0.saturating_sub(1).max(MIN_CAFFEINE_UNITS))
    }
}

impl Default for CaffeineIntake {
    fn default() -> Self {
        Self(MIN_CAFFEINE_UNITS)
    }
}

impl TryFrom<u32> for CaffeineIntake {
    type Error = InputError;

    fn try_from(units: u32) -> Result<Self, Self::Error> {
        Self::new(units)
    }
}

impl From<CaffeineIntake> for u32 {
    fn from(caffeine: CaffeineIntake) -> Self {
        caffeine.0
    }
}

impl fmt::Display for CaffeineIntake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 1 {
            write!(f, "1 cup")
        } else {
            write!(f, "{} cups", self.0)
        }
    }
}

/// Feature vector handed to a predictive model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    /// Wake time as seconds since midnight, in [0, 86399]
    pub wake_seconds: u32,
    /// Desired sleep (hours)
    pub sleep_goal_hours: f64,
    /// Daily caffeine units
    pub caffeine_units: u32,
}

impl PredictionInput {
    /// Features in model order: wake seconds, sleep goal, caffeine
    pub fn features(&self) -> [f64; 3] {
        [
            f64::from(self.wake_seconds),
            self.sleep_goal_hours,
            f64::from(self.caffeine_units),
        ]
    }
}

/// A successful estimation: when to go to bed, and the sleep the model expects
#[derive(Debug, Clone)]
pub struct Bedtime<Tz: TimeZone> {
    pub at: DateTime<Tz>,
    pub actual_sleep_hours: f64,
}
