//! Configuration for the signal engine
//!
//! Supplied once when the world is built and validated up front, so a bad
//! value fails at construction rather than in the middle of a run.

use serde::{Deserialize, Serialize};

use super::error::{SignalError, SignalResult};
use super::types::Tick;

/// Shortest green phase, in ticks
pub const DEFAULT_MIN_GREEN: u32 = 10;
/// Longest green phase, in ticks
pub const DEFAULT_MAX_GREEN: u32 = 60;
/// Fixed yellow phase, in ticks
pub const DEFAULT_YELLOW: u32 = 5;
/// Constant term of the adaptive green formula
pub const DEFAULT_FORMULA_BASE: f64 = 8.0;
/// Multiplier on the demand term of the adaptive green formula
pub const DEFAULT_FORMULA_COEFF: f64 = 1.0;
/// Exponent applied to the waiting count
pub const DEFAULT_FORMULA_EXPONENT: f64 = 0.85;
/// Minimum ticks between two departures from the green lane
pub const DEFAULT_DEPARTURE_GAP: u32 = 1;
/// Total simulation length, after which arrivals are refused
pub const DEFAULT_DURATION_TICKS: Tick = 300;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub min_green: u32,
    pub max_green: u32,
    pub yellow_duration: u32,
    pub formula_base: f64,
    pub formula_coeff: f64,
    pub formula_exponent: f64,
    pub departure_gap: u32,
    pub duration_ticks: Tick,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            min_green: DEFAULT_MIN_GREEN,
            max_green: DEFAULT_MAX_GREEN,
            yellow_duration: DEFAULT_YELLOW,
            formula_base: DEFAULT_FORMULA_BASE,
            formula_coeff: DEFAULT_FORMULA_COEFF,
            formula_exponent: DEFAULT_FORMULA_EXPONENT,
            departure_gap: DEFAULT_DEPARTURE_GAP,
            duration_ticks: DEFAULT_DURATION_TICKS,
        }
    }
}

impl SignalConfig {
    /// Check every option against its allowed range
    ///
    /// The first offending field is reported as `ConfigurationOutOfRange`.
    pub fn validate(&self) -> SignalResult<()> {
        if self.min_green == 0 {
            return Err(out_of_range("min_green", "must be at least one tick"));
        }
        if self.min_green > self.max_green {
            return Err(out_of_range(
                "min_green",
                format!(
                    "min_green ({}) exceeds max_green ({})",
                    self.min_green, self.max_green
                ),
            ));
        }
        if self.yellow_duration == 0 {
            return Err(out_of_range("yellow_duration", "must be at least one tick"));
        }
        if self.departure_gap == 0 {
            return Err(out_of_range("departure_gap", "must be at least one tick"));
        }
        if self.duration_ticks == 0 {
            return Err(out_of_range("duration_ticks", "must be at least one tick"));
        }
        if !self.formula_base.is_finite() {
            return Err(out_of_range("formula_base", "must be finite"));
        }
        // A negative coefficient or exponent would make green time shrink with demand
        if !self.formula_coeff.is_finite() || self.formula_coeff < 0.0 {
            return Err(out_of_range("formula_coeff", "must be finite and non-negative"));
        }
        if !self.formula_exponent.is_finite() || self.formula_exponent < 0.0 {
            return Err(out_of_range(
                "formula_exponent",
                "must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

fn out_of_range(field: &'static str, reason: impl Into<String>) -> SignalError {
    SignalError::ConfigurationOutOfRange {
        field,
        reason: reason.into(),
    }
}
