//! Interpolating cubic spline
//!
//! The curve is made of one cubic polynomial per pair of neighbouring points, joined so that
//! position, first and second derivatives are continuous. The curve is parameterised by
//! normalised chord length, so `t` is approximately the fraction of the distance travelled
//! along the path.
//!
//! The polynomials are stored in "moment" form, i.e. by the second derivative at each knot,
//! which are found by solving a single linear system per fit. The end conditions are:
//! - closed input (first point equal to the last): periodic, so the curve joins smoothly onto
//!   itself at `t = 0`/`t = 1`,
//! - open input: not-a-knot, which reproduces straight lines and parabolas exactly and does not
//!   force the curvature at the ends to zero.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, trace};
use nalgebra::{distance, DMatrix, Point2, Vector2};
use util::maths::clamp;

use super::{Spline, SplineError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Points closer than this are considered to be the same point.
const POINT_EQ_TOL_M: f64 = 1e-6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A C2 continuous cubic spline passing through every fitted point.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    /// The fitted points, with consecutive duplicates removed
    points: Vec<Point2<f64>>,

    /// Parameter value of each point, normalised to [0, 1]
    knots: Vec<f64>,

    /// Second derivative of the curve at each knot
    moments: Vec<Vector2<f64>>,

    /// Sum of the distances between neighbouring points
    chord_length_m: f64,

    /// True if the curve was fitted with periodic end conditions
    closed: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CubicSpline {
    /// Fit a spline through the given points.
    ///
    /// Consecutive duplicate points are merged before fitting. Fitting fails if fewer than 2
    /// distinct points remain or if any coordinate is non-finite.
    pub fn fit(points: &[Point2<f64>]) -> Result<Self, SplineError> {
        if let Some(i) = points
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite()))
        {
            return Err(SplineError::NonFinitePoint(i));
        }

        // Merge consecutive duplicates, they would produce zero length knot intervals
        let mut pts: Vec<Point2<f64>> = Vec::with_capacity(points.len());
        for p in points {
            match pts.last() {
                Some(last) if distance(last, p) <= POINT_EQ_TOL_M => (),
                _ => pts.push(*p),
            }
        }

        if pts.len() < 2 {
            return Err(SplineError::NotEnoughPoints(pts.len()));
        }

        // Chord length parameterisation
        let mut knots = Vec::with_capacity(pts.len());
        let mut chord_length_m = 0.0;
        knots.push(0.0);
        for seg in pts.windows(2) {
            chord_length_m += distance(&seg[0], &seg[1]);
            knots.push(chord_length_m);
        }
        for k in knots.iter_mut() {
            *k /= chord_length_m;
        }
        if let Some(k) = knots.last_mut() {
            *k = 1.0;
        }

        let closed = pts.len() >= 4 && distance(&pts[0], &pts[pts.len() - 1]) <= POINT_EQ_TOL_M;

        let moments = if closed {
            periodic_moments(&pts, &knots)?
        } else {
            not_a_knot_moments(&pts, &knots)?
        };

        debug!(
            "Fitted {} cubic spline through {} points ({} supplied), chord length {:.3} m",
            if closed { "closed" } else { "open" },
            pts.len(),
            points.len(),
            chord_length_m
        );

        Ok(Self {
            points: pts,
            knots,
            moments,
            chord_length_m,
            closed,
        })
    }

    /// Sum of the straight line distances between the fitted points.
    ///
    /// This is a lower bound on the arc length of the curve, and is the scale used by the
    /// parameterisation: `t = s / chord_length_m` for a distance `s` along the point sequence.
    pub fn chord_length_m(&self) -> f64 {
        self.chord_length_m
    }

    /// True if the input was a closed loop and periodic end conditions were used.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The points the curve was fitted through.
    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    /// Parameter value of each fitted point.
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Find the segment containing `t`, returning the segment index, its length in parameter
    /// space and the distances from `t` to the end and start of the segment.
    fn segment(&self, t: f64) -> (usize, f64, f64, f64) {
        let t = clamp(&t, &0.0, &1.0);
        let last_seg = self.knots.len() - 2;
        let i = self
            .knots
            .partition_point(|&k| k <= t)
            .saturating_sub(1)
            .min(last_seg);

        let h = self.knots[i + 1] - self.knots[i];

        (i, h, self.knots[i + 1] - t, t - self.knots[i])
    }
}

impl Spline for CubicSpline {
    fn point_at(&self, t: f64) -> Point2<f64> {
        let (i, h, a, b) = self.segment(t);
        let (m_0, m_1) = (self.moments[i], self.moments[i + 1]);
        let (p_0, p_1) = (self.points[i].coords, self.points[i + 1].coords);

        Point2::from(
            m_0 * (a.powi(3) / (6.0 * h))
                + m_1 * (b.powi(3) / (6.0 * h))
                + (p_0 / h - m_0 * (h / 6.0)) * a
                + (p_1 / h - m_1 * (h / 6.0)) * b,
        )
    }

    fn first_deriv(&self, t: f64) -> Vector2<f64> {
        let (i, h, a, b) = self.segment(t);
        let (m_0, m_1) = (self.moments[i], self.moments[i + 1]);
        let (p_0, p_1) = (self.points[i].coords, self.points[i + 1].coords);

        -m_0 * (a * a / (2.0 * h)) + m_1 * (b * b / (2.0 * h)) + (p_1 - p_0) / h
            - (m_1 - m_0) * (h / 6.0)
    }

    fn second_deriv(&self, t: f64) -> Vector2<f64> {
        let (i, h, a, b) = self.segment(t);

        self.moments[i] * (a / h) + self.moments[i + 1] * (b / h)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Solve for the knot moments of an open curve using not-a-knot end conditions.
fn not_a_knot_moments(
    points: &[Point2<f64>],
    knots: &[f64],
) -> Result<Vec<Vector2<f64>>, SplineError> {
    let n = points.len();

    // A single segment is a straight line
    if n == 2 {
        return Ok(vec![Vector2::zeros(); 2]);
    }

    let h: Vec<f64> = knots.windows(2).map(|k| k[1] - k[0]).collect();
    let mut a = DMatrix::<f64>::zeros(n, n);
    let mut b = DMatrix::<f64>::zeros(n, 2);

    // Interior knots: continuity of the first derivative
    for i in 1..(n - 1) {
        a[(i, i - 1)] = h[i - 1];
        a[(i, i)] = 2.0 * (h[i - 1] + h[i]);
        a[(i, i + 1)] = h[i];

        let rhs = 6.0 * ((points[i + 1] - points[i]) / h[i] - (points[i] - points[i - 1]) / h[i - 1]);
        b[(i, 0)] = rhs.x;
        b[(i, 1)] = rhs.y;
    }

    if n == 3 {
        // Both end conditions collapse onto the same equation, use the parabola through the
        // three points instead (constant second derivative).
        a[(0, 0)] = 1.0;
        a[(0, 1)] = -1.0;
        a[(2, 1)] = 1.0;
        a[(2, 2)] = -1.0;
    } else {
        // Third derivative continuous across the second and penultimate knots
        a[(0, 0)] = h[1];
        a[(0, 1)] = -(h[0] + h[1]);
        a[(0, 2)] = h[0];
        a[(n - 1, n - 3)] = h[n - 2];
        a[(n - 1, n - 2)] = -(h[n - 3] + h[n - 2]);
        a[(n - 1, n - 1)] = h[n - 3];
    }

    solve_moments(a, b)
}

/// Solve for the knot moments of a closed curve. The last point must equal the first.
fn periodic_moments(
    points: &[Point2<f64>],
    knots: &[f64],
) -> Result<Vec<Vector2<f64>>, SplineError> {
    // The last knot is the first knot again, so only m unknowns
    let m = points.len() - 1;

    let h: Vec<f64> = knots.windows(2).map(|k| k[1] - k[0]).collect();
    let mut a = DMatrix::<f64>::zeros(m, m);
    let mut b = DMatrix::<f64>::zeros(m, 2);

    for i in 0..m {
        let prev = (i + m - 1) % m;
        let next = (i + 1) % m;

        a[(i, prev)] += h[prev];
        a[(i, i)] += 2.0 * (h[prev] + h[i]);
        a[(i, next)] += h[i];

        let rhs = 6.0
            * ((points[i + 1] - points[i]) / h[i] - (points[i] - points[prev]) / h[prev]);
        b[(i, 0)] = rhs.x;
        b[(i, 1)] = rhs.y;
    }

    let mut moments = solve_moments(a, b)?;
    moments.push(moments[0]);

    Ok(moments)
}

fn solve_moments(a: DMatrix<f64>, b: DMatrix<f64>) -> Result<Vec<Vector2<f64>>, SplineError> {
    let x = a.lu().solve(&b).ok_or(SplineError::SolveFailed)?;

    let moments: Vec<Vector2<f64>> = (0..x.nrows())
        .map(|i| Vector2::new(x[(i, 0)], x[(i, 1)]))
        .collect();

    if moments.iter().any(|m| !(m.x.is_finite() && m.y.is_finite())) {
        return Err(SplineError::SolveFailed);
    }

    trace!("Spline moments: {:?}", moments);

    Ok(moments)
}
