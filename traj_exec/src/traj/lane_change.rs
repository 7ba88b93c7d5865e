//! Lane change geometry
//!
//! A lane change path is built by blending the centerline of the starting lanelet into the
//! centerline of the target lanelet, so the path starts on the first and ends on the second.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use super::{compose_from_path, TrajGenError, TrajGenParams, TrajectoryPoint};
use crate::{
    vehicle::VehicleState,
    waypoint::{self, PointSpeedPair},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A lane segment, described by its centerline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lanelet {
    pub id: i64,
    pub centerline: Vec<Point2<f64>>,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Path from the start of `start`'s centerline to the end of `end`'s centerline.
///
/// Both centerlines are resampled to the same number of points and blended linearly, moving
/// from the start centerline to the end centerline along the path.
pub fn stitch_lane_change_path(
    start: &Lanelet,
    end: &Lanelet,
) -> Result<Vec<Point2<f64>>, TrajGenError> {
    let first = *start
        .centerline
        .first()
        .ok_or(TrajGenError::EmptyCenterline(start.id))?;
    if end.centerline.is_empty() {
        return Err(TrajGenError::EmptyCenterline(end.id));
    }

    let count = start.centerline.len().max(end.centerline.len()).max(2);
    let start_points = waypoint::resample_to_count(&start.centerline, count)?;
    let end_points = waypoint::resample_to_count(&end.centerline, count)?;

    let mut path = Vec::with_capacity(count);
    path.push(first);

    for i in 1..count {
        let w = i as f64 / (count - 1) as f64;
        path.push(Point2::from(
            start_points[i].coords * (1.0 - w) + end_points[i].coords * w,
        ));
    }

    debug!(
        "Stitched lane change from lanelet {} to {} with {} points",
        start.id, end.id, count
    );

    Ok(path)
}

/// Lane change path resampled at the configured step, with every point at the vehicle's
/// current speed.
pub fn lane_change_geometry_profile(
    start: &Lanelet,
    end: &Lanelet,
    state: &VehicleState,
    params: &TrajGenParams,
) -> Result<Vec<PointSpeedPair>, TrajGenError> {
    let path = stitch_lane_change_path(start, end)?;
    let points = waypoint::resample_linestring(&path, params.curve_resample_step_size_m)?;

    Ok(points
        .into_iter()
        .map(|p| PointSpeedPair::new(p, state.longitudinal_vel))
        .collect())
}

/// Compose a trajectory changing lane from `start` to `end` at the vehicle's current speed.
pub fn compose_lane_change_trajectory(
    start: &Lanelet,
    end: &Lanelet,
    state: &VehicleState,
    state_time_s: f64,
    params: &TrajGenParams,
) -> Result<Vec<TrajectoryPoint>, TrajGenError> {
    let profile = lane_change_geometry_profile(start, end, state, params)?;
    compose_from_path(&profile, state, state_time_s, params)
}

#[cfg(test)]
mod test {
    use super::*;

    fn lanelet(id: i64, y: f64, length_m: f64, num_points: usize) -> Lanelet {
        Lanelet {
            id,
            centerline: (0..num_points)
                .map(|i| Point2::new(i as f64 * length_m / (num_points - 1) as f64, y))
                .collect(),
        }
    }

    #[test]
    fn test_stitch_lane_change_path() {
        let start = lanelet(1, 0.0, 50.0, 11);
        let end = lanelet(2, 3.7, 50.0, 6);

        let path = stitch_lane_change_path(&start, &end).unwrap();

        assert_eq!(path.len(), 11);
        assert_eq!(path[0], start.centerline[0]);
        assert!((path[10] - end.centerline[5]).norm() < 1e-9);

        // Moves monotonically across to the target lane
        for w in path.windows(2) {
            assert!(w[1].x > w[0].x);
            assert!(w[1].y > w[0].y);
        }
    }

    #[test]
    fn test_stitch_empty_centerline() {
        let start = lanelet(1, 0.0, 50.0, 11);
        let end = Lanelet {
            id: 7,
            centerline: Vec::new(),
        };

        assert!(matches!(
            stitch_lane_change_path(&start, &end),
            Err(TrajGenError::EmptyCenterline(7))
        ));
        assert!(matches!(
            stitch_lane_change_path(&end, &start),
            Err(TrajGenError::EmptyCenterline(7))
        ));
    }

    #[test]
    fn test_lane_change_geometry_profile() {
        let start = lanelet(1, 0.0, 50.0, 11);
        let end = lanelet(2, 3.7, 50.0, 11);
        let state = VehicleState::new(0.0, 0.0, 0.0, 8.0);
        let params = TrajGenParams::default();

        let profile = lane_change_geometry_profile(&start, &end, &state, &params).unwrap();

        assert!(profile.len() > 2);
        assert_eq!(profile[0].point, start.centerline[0]);
        for p in &profile {
            assert_eq!(p.speed, 8.0);
        }

        let traj =
            compose_lane_change_trajectory(&start, &end, &state, 0.0, &params).unwrap();
        assert!(traj.len() > 2);
        assert!(traj[0].position().coords.norm() < 1e-9);
        let last = traj.last().unwrap();
        assert!(last.y > 0.0 && last.y < 3.7 + 1e-6);
    }
}
