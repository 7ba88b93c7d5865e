//! Curvature evaluation for fitted curves

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::Spline;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Below this tangent magnitude the curve is considered stationary and the curvature is taken
/// as zero.
const MIN_TANGENT_NORM: f64 = 1e-9;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Signed curvature of the spline at `t`, in 1/meters.
///
/// Computed as `(x'y'' - y'x'') / (x'^2 + y'^2)^1.5`, positive for left (anticlockwise) turns.
/// The value does not depend on the parameterisation of the curve.
pub fn curvature_at<S: Spline + ?Sized>(spline: &S, t: f64) -> f64 {
    let d1 = spline.first_deriv(t);
    let d2 = spline.second_deriv(t);

    let speed_sq = d1.norm_squared();
    if speed_sq.sqrt() < MIN_TANGENT_NORM {
        return 0.0;
    }

    (d1.x * d2.y - d1.y * d2.x) / speed_sq.powf(1.5)
}

/// Curvature at each of the given parameter values.
pub fn compute_curvatures<S: Spline + ?Sized>(spline: &S, ts: &[f64]) -> Vec<f64> {
    ts.iter().map(|&t| curvature_at(spline, t)).collect()
}
