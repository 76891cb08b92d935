//! Input normalization
//!
//! Turns the caller's wake time into an offset from midnight and passes the
//! sleep goal and caffeine count through untouched.
//!
//! Sleep goal and caffeine ranges are preconditions: the input boundary
//! enforces them and this stage does not check them again.

use chrono::Timelike;
use tracing::debug;

use crate::types::{CaffeineIntake, PredictionInput, SleepGoal, WakeTime};

/// Normalizer for converting raw inputs into model features
pub struct Normalizer;

impl Normalizer {
    /// Normalize a wake time and the two pass-through inputs
    pub fn normalize(
        wake: &WakeTime,
        sleep_goal: SleepGoal,
        caffeine: CaffeineIntake,
    ) -> PredictionInput {
        let input = PredictionInput {
            wake_seconds: wake_seconds(wake.hour(), wake.minute()),
            sleep_goal_hours: sleep_goal.hours(),
            caffeine_units: caffeine.units(),
        };
        debug!(
            wake_seconds = input.wake_seconds,
            sleep_goal_hours = input.sleep_goal_hours,
            caffeine_units = input.caffeine_units,
            "normalized inputs"
        );
        input
    }

    /// Normalize straight from a timestamp, keeping only its hour and minute
    pub fn normalize_timestamp<T: Timelike>(
        wake: &T,
        sleep_goal: SleepGoal,
        caffeine: CaffeineIntake,
    ) -> PredictionInput {
        Self::normalize(&WakeTime::from_timelike(wake), sleep_goal, caffeine)
    }
}

fn wake_seconds(hour: u32, minute: u32) -> u32 {
    hour * 3600 + minute * 60
}
