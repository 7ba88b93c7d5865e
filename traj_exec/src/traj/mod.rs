//! # Trajectory module
//!
//! Assembles timed trajectories from waypoint/speed paths. [`compose_from_path`] runs the full
//! pipeline: the path is spliced around the vehicle, fitted with a spline, resampled, given a
//! feasible speed profile and finally converted into time-stamped [`TrajectoryPoint`]s.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod lane_change;
pub mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

// Internal
use crate::{
    speed::{self, SpeedError},
    spline::{self, Spline, SplineError},
    vehicle::VehicleState,
    waypoint::{self, PointSpeedPair, WaypointError},
};
pub use lane_change::{
    compose_lane_change_trajectory, lane_change_geometry_profile, stitch_lane_change_path,
    Lanelet,
};
pub use params::TrajGenParams;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Controller tag used when no controller is requested.
pub const DEFAULT_CONTROLLER: &str = "default";

/// Segments shorter than this don't define a heading.
const MIN_YAW_SEGMENT_M: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single point of a trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// Global x position. Units: meters
    pub x: f64,

    /// Global y position. Units: meters
    pub y: f64,

    /// Heading at the point. Units: radians
    pub yaw: f64,

    /// Absolute time at which the point should be reached. Units: seconds
    pub target_time_s: f64,

    /// Controller which should follow this point
    pub controller_plugin_name: String,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TrajGenError {
    #[error("At least 2 points are needed to build a trajectory, got {0}")]
    NotEnoughPoints(usize),

    #[error("Got {0} points, {1} times and {2} yaws, all must be the same length")]
    LengthMismatch(usize, usize, usize),

    #[error("Invalid trajectory generation parameters: {0}")]
    InvalidParams(&'static str),

    #[error("Lanelet {0} has an empty centerline")]
    EmptyCenterline(i64),

    #[error("Curve fitting failed: {0}")]
    SplineError(#[from] SplineError),

    #[error("Speed planning failed: {0}")]
    SpeedError(#[from] SpeedError),

    #[error("Path processing failed: {0}")]
    WaypointError(#[from] WaypointError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajectoryPoint {
    /// Position of the point.
    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    /// True if every numeric field is finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.yaw.is_finite()
            && self.target_time_s.is_finite()
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Build trajectory points tagged with the default controller.
///
/// `times` are relative to `start_time_s`.
pub fn trajectory_from_points_times_orientations(
    points: &[Point2<f64>],
    times: &[f64],
    yaws: &[f64],
    start_time_s: f64,
) -> Result<Vec<TrajectoryPoint>, TrajGenError> {
    build_trajectory(points, times, yaws, start_time_s, DEFAULT_CONTROLLER)
}

/// Build trajectory points tagged with the given controller.
pub fn build_trajectory(
    points: &[Point2<f64>],
    times: &[f64],
    yaws: &[f64],
    start_time_s: f64,
    controller: &str,
) -> Result<Vec<TrajectoryPoint>, TrajGenError> {
    if points.len() != times.len() || points.len() != yaws.len() {
        return Err(TrajGenError::LengthMismatch(
            points.len(),
            times.len(),
            yaws.len(),
        ));
    }

    Ok(points
        .iter()
        .zip(times.iter())
        .zip(yaws.iter())
        .map(|((p, t), yaw)| TrajectoryPoint {
            x: p.x,
            y: p.y,
            yaw: *yaw,
            target_time_s: start_time_s + t,
            controller_plugin_name: String::from(controller),
        })
        .collect())
}

/// Heading of each point, taken from the segment leading out of it.
///
/// The last point reuses the heading of the last segment. Degenerate segments reuse the previous
/// heading, starting from `initial_yaw`.
pub fn compute_yaws(points: &[Point2<f64>], initial_yaw: f64) -> Vec<f64> {
    let mut yaws = Vec::with_capacity(points.len());
    let mut prev_yaw = initial_yaw;

    for w in points.windows(2) {
        let seg = w[1] - w[0];
        if seg.norm() > MIN_YAW_SEGMENT_M {
            prev_yaw = seg.y.atan2(seg.x);
        }
        yaws.push(prev_yaw);
    }

    if !points.is_empty() {
        yaws.push(prev_yaw);
    }

    yaws
}

/// Compose a timed trajectory following `path` from the vehicle's current state.
///
/// The vehicle is located on the path, points behind it further than the back distance are
/// dropped and a spline is fitted through the rest. The curve is resampled at the configured
/// step, speeds are capped by the path and by the lateral acceleration limit, made feasible for
/// the longitudinal acceleration limit starting from the vehicle's speed, then smoothed. The
/// trajectory starts at the sample nearest the vehicle at `state_time_s` and is cut at the
/// configured time length.
///
/// Each point's yaw is the heading of the segment leaving it, so the first point's yaw comes
/// from the first segment rather than the vehicle orientation.
///
/// Points with a non-finite field are dropped. If fewer than 2 points remain
/// `TrajGenError::NotEnoughPoints` is returned.
pub fn compose_from_path(
    path: &[PointSpeedPair],
    state: &VehicleState,
    state_time_s: f64,
    params: &TrajGenParams,
) -> Result<Vec<TrajectoryPoint>, TrajGenError> {
    params.validate()?;

    if path.len() < 2 {
        return Err(TrajGenError::NotEnoughPoints(path.len()));
    }

    // ---- SPLICE ----

    let nearest = waypoint::nearest_index(path, state)
        .ok_or(TrajGenError::NotEnoughPoints(path.len()))?;
    let attached =
        waypoint::attach_past_points(path, &path[nearest + 1..], nearest, params.back_distance_m);
    let (attached_points, attached_speeds) = waypoint::split(&attached);

    debug!(
        "Composing trajectory from {} path points, nearest point {}, {} kept after splicing",
        path.len(),
        nearest,
        attached.len()
    );

    // ---- FIT AND RESAMPLE ----

    let curve = spline::fit(&attached_points)?;
    let chord_length_m = curve.chord_length_m();

    let num_steps = (chord_length_m / params.curve_resample_step_size_m).ceil() as usize;
    let ts: Vec<f64> = (0..num_steps)
        .map(|i| i as f64 * params.curve_resample_step_size_m / chord_length_m)
        .chain(std::iter::once(1.0))
        .collect();
    let samples: Vec<Point2<f64>> = ts.iter().map(|t| curve.point_at(*t)).collect();

    trace!(
        "Resampled {:.2} m curve into {} points",
        chord_length_m,
        samples.len()
    );

    // ---- SPEED LIMITS ----

    let curvatures = speed::moving_average_filter(
        &spline::compute_curvatures(&curve, &ts),
        params.curvature_moving_average_window_size,
    )?;

    // Path speeds at each sample, located by distance along the path
    let attached_downtracks = waypoint::compute_downtracks(&attached_points);
    let path_speeds: Vec<f64> = ts
        .iter()
        .map(|t| {
            util::maths::interp(&attached_downtracks, &attached_speeds, t * chord_length_m)
                .unwrap_or(state.longitudinal_vel)
        })
        .collect();

    let max_path_speed = attached_speeds.iter().cloned().fold(0.0, f64::max);
    let curv_speeds = speed::curvature_speed_limits(
        &curvatures,
        params.lateral_accel_limit_mss,
        max_path_speed,
    );

    let limits: Vec<f64> = path_speeds
        .iter()
        .zip(curv_speeds.iter())
        .map(|(p, c)| p.min(*c))
        .collect();

    // ---- CUT AT VEHICLE ----

    let start = waypoint::nearest_index(&samples, state)
        .ok_or(TrajGenError::NotEnoughPoints(samples.len()))?;
    if samples.len() - start < 2 {
        return Err(TrajGenError::NotEnoughPoints(samples.len() - start));
    }
    let future_points = &samples[start..];
    let mut future_limits = limits[start..].to_vec();
    future_limits[0] = state.longitudinal_vel;

    // ---- SPEED PROFILE ----

    let future_downtracks = waypoint::compute_downtracks(future_points);
    let optimized =
        speed::optimize_speed(&future_downtracks, &future_limits, params.max_accel_mss)?;
    let mut speeds =
        speed::moving_average_filter(&optimized, params.speed_moving_average_window_size)?;
    speed::apply_minimum_speed(&mut speeds, params.minimum_speed_ms);

    // ---- TIME HORIZON ----

    let bounded = waypoint::constrain_to_time_boundary(
        &waypoint::pair(future_points, &speeds)?,
        params.trajectory_time_length_s,
    )?;
    let (points, speeds) = waypoint::split(&bounded);

    // ---- TIMES AND HEADINGS ----

    let times = speed::speed_to_time(&waypoint::compute_downtracks(&points), &speeds)?;
    let yaws = compute_yaws(&points, state.orientation);

    let mut traj = build_trajectory(
        &points,
        &times,
        &yaws,
        state_time_s,
        &params.desired_controller_plugin,
    )?;

    let num_points = traj.len();
    traj.retain(TrajectoryPoint::is_finite);
    if traj.len() != num_points {
        warn!(
            "Dropped {} non-finite trajectory points",
            num_points - traj.len()
        );
    }
    if traj.len() < 2 {
        return Err(TrajGenError::NotEnoughPoints(traj.len()));
    }

    debug!(
        "Composed trajectory with {} points over {:.2} s",
        traj.len(),
        times.last().copied().unwrap_or(0.0)
    );

    Ok(traj)
}
