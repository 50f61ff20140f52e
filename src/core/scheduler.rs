//! Fixed-step time scheduler
//!
//! Turns variable frame deltas into a whole number of fixed-duration ticks
//! and tracks which in-game day those ticks fall on. Leftover time that does
//! not fill a whole tick is carried over to the next frame, so the tick
//! stream does not depend on the frame rate.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::error::ConfigError;
use crate::core::types::{Day, Tick};

/// Fraction of a tick the accumulator may fall short by and still fire it.
///
/// Absorbs f64 rounding so that ten 0.1 s frames make one 1 s tick.
const TICK_TOLERANCE: f64 = 1e-9;

/// Whether simulated time is flowing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockState {
    Running,
    Paused,
}

/// Converts wall-clock deltas into ticks and days
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeScheduler {
    game_time: f64,
    time_scale: f64,
    accumulator: f64,
    tick: Tick,
    state: ClockState,
    tick_duration: f64,
    ticks_per_day: u64,
}

impl TimeScheduler {
    /// Create a running scheduler at tick 0.
    ///
    /// The tick duration must be positive and finite, and a day needs at
    /// least one tick.
    pub fn new(tick_duration: f64, ticks_per_day: u64) -> Result<Self, ConfigError> {
        if !(tick_duration > 0.0) || !tick_duration.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "tick_duration must be positive, got {}",
                tick_duration
            )));
        }
        if ticks_per_day == 0 {
            return Err(ConfigError::Invalid("ticks_per_day must be at least 1".into()));
        }
        Ok(Self::with_checked(tick_duration, ticks_per_day))
    }

    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        Self::new(config.tick_duration, config.ticks_per_day)
    }

    fn with_checked(tick_duration: f64, ticks_per_day: u64) -> Self {
        Self {
            game_time: 0.0,
            time_scale: 1.0,
            accumulator: 0.0,
            tick: 0,
            state: ClockState::Running,
            tick_duration,
            ticks_per_day,
        }
    }

    /// Feed one frame's wall-clock delta (seconds).
    ///
    /// Returns the tick counter values reached by every tick fired during
    /// this call, in order. The range is empty when paused or when not enough
    /// time has accumulated; it can span many ticks after a slow frame.
    pub fn advance(&mut self, delta: f64) -> Range<Tick> {
        let first = self.tick + 1;
        if self.state == ClockState::Paused || !(delta > 0.0) || !delta.is_finite() {
            return first..first;
        }

        let scaled = delta * self.time_scale;
        self.game_time += scaled;
        self.accumulator += scaled;

        let threshold = self.tick_duration * (1.0 - TICK_TOLERANCE);
        while self.accumulator >= threshold {
            self.tick += 1;
            self.accumulator = (self.accumulator - self.tick_duration).max(0.0);
            tracing::trace!(tick = self.tick, game_time = self.game_time, "tick");
        }

        first..self.tick + 1
    }

    /// Zero every field and start running again at scale 1
    pub fn reset(&mut self) {
        self.game_time = 0.0;
        self.time_scale = 1.0;
        self.accumulator = 0.0;
        self.tick = 0;
        self.state = ClockState::Running;
    }

    pub fn pause(&mut self) {
        self.state = ClockState::Paused;
    }

    pub fn resume(&mut self) {
        self.state = ClockState::Running;
    }

    /// Set the time-scale multiplier.
    ///
    /// Non-positive (or NaN) scales fall back to 1; pausing is the only way
    /// to stop time. Ignored while paused.
    pub fn set_time_scale(&mut self, scale: f64) {
        if self.state == ClockState::Paused {
            return;
        }
        self.time_scale = if scale > 0.0 && scale.is_finite() { scale } else { 1.0 };
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == ClockState::Paused
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn game_time(&self) -> f64 {
        self.game_time
    }

    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    pub fn current_day(&self) -> Day {
        self.day_of_tick(self.tick)
    }

    /// Day a given tick counter value belongs to
    pub fn day_of_tick(&self, tick: Tick) -> Day {
        tick / self.ticks_per_day
    }

    /// Ticks elapsed since the start of the current day
    pub fn tick_in_day(&self) -> u64 {
        self.tick % self.ticks_per_day
    }

    pub fn tick_duration(&self) -> f64 {
        self.tick_duration
    }

    pub fn ticks_per_day(&self) -> u64 {
        self.ticks_per_day
    }

    pub fn ticks_to_seconds(&self, ticks: u64) -> f64 {
        ticks as f64 * self.tick_duration
    }

    pub fn seconds_to_ticks(&self, seconds: f64) -> u64 {
        if seconds <= 0.0 {
            return 0;
        }
        (seconds / self.tick_duration) as u64
    }
}

impl Default for TimeScheduler {
    fn default() -> Self {
        let config = SimulationConfig::default();
        Self::with_checked(config.tick_duration, config.ticks_per_day)
    }
}
