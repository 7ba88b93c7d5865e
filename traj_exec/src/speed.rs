//! # Speed planning
//!
//! Turns per-point speed caps (usually derived from the path curvature) into a speed profile
//! the vehicle can actually follow, and converts speed profiles into times.
//!
//! All speeds are in meters/second, distances in meters and accelerations in meters/second^2.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Speeds below this are treated as stationary when converting distance to time.
const STATIONARY_SPEED_MS: f64 = 1e-9;

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SpeedError {
    #[error("Attempted to optimise an empty speed profile")]
    EmptyInput,

    #[error("Downtracks and speeds do not have the same length ({0} and {1})")]
    LengthMismatch(usize, usize),

    #[error("The acceleration limit must be positive, got {0}")]
    NonPositiveAccel(f64),

    #[error("Speed at index {0} is negative or not finite")]
    InvalidSpeed(usize),

    #[error("Downtrack decreases at index {0}")]
    DecreasingDowntrack(usize),

    #[error("The moving average window must be odd, got {0}")]
    EvenWindow(usize),

    #[error("Cannot travel the segment ending at index {0} with zero speed")]
    ZeroSpeedSegment(usize),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Produce an achievable speed profile from per-point speed caps.
///
/// The output never needs more than `max_accel_mss` of acceleration or deceleration between
/// neighbouring points, and stays at or below `curv_speeds` except where the vehicle physically
/// cannot slow down in time from its current speed.
///
/// The first element of `curv_speeds` is the speed the vehicle is already travelling at and is
/// returned unchanged. The profile is built in three passes:
///  1. Forward: cap each point by the speed reachable accelerating from the previous point.
///  2. Backward: cap each point (except the first) by the speed from which the next point is
///     reachable by braking.
///  3. Anchor: raise points the vehicle cannot brake down to from the first point to the
///     slowest speed it can reach.
pub fn optimize_speed(
    downtracks: &[f64],
    curv_speeds: &[f64],
    max_accel_mss: f64,
) -> Result<Vec<f64>, SpeedError> {
    validate_profile(downtracks, curv_speeds)?;

    if !(max_accel_mss > 0.0) || !max_accel_mss.is_finite() {
        return Err(SpeedError::NonPositiveAccel(max_accel_mss));
    }

    let n = curv_speeds.len();
    let two_a = 2.0 * max_accel_mss;
    let mut out = curv_speeds.to_vec();

    // Forward pass
    for i in 1..n {
        let ds = downtracks[i] - downtracks[i - 1];
        out[i] = out[i].min((out[i - 1].powi(2) + two_a * ds).sqrt());
    }

    // Backward pass, the first point is the anchor and is left alone
    for i in (1..n.saturating_sub(1)).rev() {
        let ds = downtracks[i + 1] - downtracks[i];
        out[i] = out[i].min((out[i + 1].powi(2) + two_a * ds).sqrt());
    }

    // Anchor pass
    for i in 1..n {
        let ds = downtracks[i] - downtracks[i - 1];
        let min_reachable = (out[i - 1].powi(2) - two_a * ds).max(0.0).sqrt();
        if out[i] < min_reachable {
            trace!(
                "Speed at index {} raised from {:.3} to {:.3} m/s, cannot brake in time",
                i,
                out[i],
                min_reachable
            );
            out[i] = min_reachable;
        }
    }

    Ok(out)
}

/// Maximum speed at each curvature such that the lateral acceleration stays within
/// `lateral_accel_limit_mss`, capped at `max_speed_ms`.
pub fn curvature_speed_limits(
    curvatures: &[f64],
    lateral_accel_limit_mss: f64,
    max_speed_ms: f64,
) -> Vec<f64> {
    curvatures
        .iter()
        .map(|k| {
            let k = k.abs();
            if k <= f64::EPSILON {
                max_speed_ms
            } else {
                (lateral_accel_limit_mss.max(0.0) / k).sqrt().min(max_speed_ms)
            }
        })
        .collect()
}

/// Centred moving average filter.
///
/// The window shrinks near the ends of the sequence. The first value is kept as-is and is not
/// included in any other window, as it is the current state of the vehicle. Windows of 0 or 1
/// leave the input unchanged, other even windows are rejected.
pub fn moving_average_filter(values: &[f64], window: usize) -> Result<Vec<f64>, SpeedError> {
    if window <= 1 || values.len() <= 1 {
        return Ok(values.to_vec());
    }
    if window % 2 == 0 {
        return Err(SpeedError::EvenWindow(window));
    }

    let half = window / 2;
    let mut out = Vec::with_capacity(values.len());
    out.push(values[0]);

    for i in 1..values.len() {
        let min = 1.max(i.saturating_sub(half));
        let max = (values.len() - 1).min(i + half);
        let total: f64 = values[min..=max].iter().sum();
        out.push(total / (max - min + 1) as f64);
    }

    Ok(out)
}

/// Raise every speed to at least `minimum_speed_ms`.
pub fn apply_minimum_speed(speeds: &mut [f64], minimum_speed_ms: f64) {
    for s in speeds.iter_mut() {
        *s = s.max(minimum_speed_ms);
    }
}

/// Time to travel `ds` meters when the speed changes linearly with time (constant
/// acceleration) from `v_0` to `v_1`.
///
/// Returns `None` if the segment has non-zero length but the vehicle would be stationary.
pub fn segment_time_s(ds: f64, v_0: f64, v_1: f64) -> Option<f64> {
    if ds <= 0.0 {
        return Some(0.0);
    }

    let v_mean = 0.5 * (v_0 + v_1);
    if v_mean <= STATIONARY_SPEED_MS {
        None
    } else {
        Some(ds / v_mean)
    }
}

/// Convert a speed profile into the time at which each point is reached, starting at 0.
pub fn speed_to_time(downtracks: &[f64], speeds: &[f64]) -> Result<Vec<f64>, SpeedError> {
    validate_profile(downtracks, speeds)?;

    let mut times = Vec::with_capacity(speeds.len());
    times.push(0.0);

    for i in 1..speeds.len() {
        let dt = segment_time_s(downtracks[i] - downtracks[i - 1], speeds[i - 1], speeds[i])
            .ok_or(SpeedError::ZeroSpeedSegment(i))?;
        times.push(times[i - 1] + dt);
    }

    Ok(times)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn validate_profile(downtracks: &[f64], speeds: &[f64]) -> Result<(), SpeedError> {
    if downtracks.len() != speeds.len() {
        return Err(SpeedError::LengthMismatch(downtracks.len(), speeds.len()));
    }
    if speeds.is_empty() {
        return Err(SpeedError::EmptyInput);
    }
    if let Some(i) = speeds.iter().position(|s| !(*s >= 0.0) || !s.is_finite()) {
        return Err(SpeedError::InvalidSpeed(i));
    }
    if let Some(i) = (1..downtracks.len()).find(|&i| !(downtracks[i] >= downtracks[i - 1])) {
        return Err(SpeedError::DecreasingDowntrack(i));
    }

    Ok(())
}
