//! Adaptive green-phase sizing

use super::config::SignalConfig;

/// Green duration, in ticks, for a lane with `waiting_count` queued vehicles
///
/// `base + coeff * waiting_count ^ exponent`, rounded half-up to whole ticks
/// and clamped to `[min_green, max_green]`. An empty lane still gets
/// `min_green`, as does a formula that evaluates to NaN.
pub fn green_duration(config: &SignalConfig, waiting_count: usize) -> u32 {
    let rounded = round_half_up(raw_green_duration(config, waiting_count));
    // 0 * inf is NaN when the demand term overflows with a zero coefficient
    if rounded.is_nan() {
        return config.min_green;
    }
    rounded.clamp(config.min_green as f64, config.max_green as f64) as u32
}

/// The unclamped, unrounded formula value. Useful for reporting.
pub fn raw_green_duration(config: &SignalConfig, waiting_count: usize) -> f64 {
    config.formula_base + config.formula_coeff * (waiting_count as f64).powf(config.formula_exponent)
}

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}
