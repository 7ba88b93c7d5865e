//! # Spline module
//!
//! Fits smooth parametric curves through ordered sequences of 2D waypoints.
//!
//! Curves are exposed through the [`Spline`] trait, which only requires a curve to be evaluable
//! (position, first and second derivative) at a normalised parameter `t` in `[0, 1]`. Everything
//! downstream (curvature, speed planning, trajectory assembly) works against the trait so that
//! the fitting strategy can be swapped out. The only strategy currently provided is the
//! interpolating [`CubicSpline`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod cubic;
pub mod curvature;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Point2, Vector2};

pub use cubic::CubicSpline;
pub use curvature::{compute_curvatures, curvature_at};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A continuous curve in the plane, parameterised over `t` in `[0, 1]`.
///
/// `t = 0` corresponds to the first fitted point and `t = 1` to the last. The parameterisation is
/// not required to be uniform in distance. Implementations shall clamp `t` into `[0, 1]`.
pub trait Spline {
    /// Position of the curve at `t`.
    fn point_at(&self, t: f64) -> Point2<f64>;

    /// First derivative (tangent) of the curve with respect to `t`.
    fn first_deriv(&self, t: f64) -> Vector2<f64>;

    /// Second derivative of the curve with respect to `t`.
    fn second_deriv(&self, t: f64) -> Vector2<f64>;
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SplineError {
    #[error("At least 2 distinct points are required to fit a spline, got {0}")]
    NotEnoughPoints(usize),

    #[error("Point {0} has a non-finite coordinate")]
    NonFinitePoint(usize),

    #[error("Could not solve for the spline coefficients, the input is ill-conditioned")]
    SolveFailed,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Fit a curve through the given ordered points.
///
/// See [`CubicSpline::fit`] for the details of the fit.
pub fn fit(points: &[Point2<f64>]) -> Result<CubicSpline, SplineError> {
    CubicSpline::fit(points)
}

/// Sample `count` positions from the spline at evenly spaced parameter values, including both
/// ends.
pub fn sample<S: Spline + ?Sized>(spline: &S, count: usize) -> Vec<Point2<f64>> {
    match count {
        0 => Vec::new(),
        1 => vec![spline.point_at(0.0)],
        _ => (0..count)
            .map(|i| spline.point_at(i as f64 / (count - 1) as f64))
            .collect(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sample() {
        let spline = fit(&[Point2::new(0.0, 0.0), Point2::new(4.0, 0.0)]).unwrap();

        assert!(sample(&spline, 0).is_empty());
        assert_eq!(sample(&spline, 1), vec![Point2::new(0.0, 0.0)]);

        let points = sample(&spline, 5);
        assert_eq!(points.len(), 5);
        for (i, p) in points.iter().enumerate() {
            assert!((p.x - i as f64).abs() < 1e-9);
            assert!(p.y.abs() < 1e-9);
        }
    }

    #[test]
    fn test_spline_trait_object() {
        let spline: Box<dyn Spline> = Box::new(
            fit(&[Point2::new(0.0, 0.0), Point2::new(0.0, 3.0)]).unwrap()
        );

        let tangent = spline.first_deriv(0.5);
        assert!(tangent.x.abs() < 1e-9);
        assert!(tangent.y > 0.0);
        assert_eq!(sample(spline.as_ref(), 2).len(), 2);
    }
}
