//! # Waypoints
//!
//! Utilities for working on sequences of points paired with target speeds: pairing and
//! splitting, locating the vehicle on the sequence, cutting the sequence to a time horizon and
//! splicing the tail of the previous plan onto a new one.
//!
//! The order of a sequence is always the order of travel (downtrack order).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, trace};
use nalgebra::{distance, Point2};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use util::maths::interp;

use crate::speed::segment_time_s;
use crate::vehicle::VehicleState;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A point on a path with the target speed at that point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointSpeedPair {
    pub point: Point2<f64>,

    /// Units: meters/second
    pub speed: f64,
}

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

/// Anything with a position in the planning frame.
pub trait HasPosition {
    fn position(&self) -> Point2<f64>;
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum WaypointError {
    #[error("Cannot pair {0} points with {1} speeds")]
    LengthMismatch(usize, usize),

    #[error("The point sequence is empty")]
    EmptySequence,

    #[error("The resample step must be positive, got {0}")]
    InvalidStep(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PointSpeedPair {
    pub fn new(point: Point2<f64>, speed: f64) -> Self {
        Self { point, speed }
    }
}

impl HasPosition for Point2<f64> {
    fn position(&self) -> Point2<f64> {
        *self
    }
}

impl HasPosition for PointSpeedPair {
    fn position(&self) -> Point2<f64> {
        self.point
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Pair each point with the speed at the same index.
pub fn pair(points: &[Point2<f64>], speeds: &[f64]) -> Result<Vec<PointSpeedPair>, WaypointError> {
    if points.len() != speeds.len() {
        return Err(WaypointError::LengthMismatch(points.len(), speeds.len()));
    }

    Ok(points
        .iter()
        .zip(speeds)
        .map(|(p, s)| PointSpeedPair::new(*p, *s))
        .collect())
}

/// Split pairs back into their points and speeds.
pub fn split(pairs: &[PointSpeedPair]) -> (Vec<Point2<f64>>, Vec<f64>) {
    pairs.iter().map(|p| (p.point, p.speed)).unzip()
}

/// Index of the point closest to the vehicle.
///
/// If several points are equally close the first is returned. `None` is returned for an empty
/// sequence.
pub fn nearest_index<P: HasPosition>(points: &[P], state: &VehicleState) -> Option<usize> {
    let veh = state.position();

    points
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| OrderedFloat(distance(&p.position(), &veh)))
        .map(|(i, _)| i)
}

/// Cumulative distance along the points, starting at 0.
pub fn compute_downtracks<P: HasPosition>(points: &[P]) -> Vec<f64> {
    let mut downtracks = Vec::with_capacity(points.len());
    let mut total = 0.0;

    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            total += distance(&points[i - 1].position(), &p.position());
        }
        downtracks.push(total);
    }

    downtracks
}

/// Keep the start of the sequence which can be travelled within `horizon_s` seconds.
///
/// The time to travel each segment is estimated from the mean of the speeds at its ends. The
/// first point is always kept, following points are kept while they are reached strictly before
/// the horizon. A segment which can't be travelled (zero speed at both ends) ends the sequence.
pub fn constrain_to_time_boundary(
    pairs: &[PointSpeedPair],
    horizon_s: f64,
) -> Result<Vec<PointSpeedPair>, WaypointError> {
    if pairs.is_empty() {
        return Err(WaypointError::EmptySequence);
    }

    let mut total_time_s = 0.0;
    let mut end = pairs.len();

    for i in 1..pairs.len() {
        let ds = distance(&pairs[i - 1].point, &pairs[i].point);

        match segment_time_s(ds, pairs[i - 1].speed, pairs[i].speed) {
            Some(dt) => total_time_s += dt,
            None => {
                end = i;
                break;
            }
        }

        if total_time_s >= horizon_s {
            end = i;
            break;
        }
    }

    trace!(
        "Constrained {} points to {} for a {} s horizon",
        pairs.len(),
        end,
        horizon_s
    );

    Ok(pairs[..end].to_vec())
}

/// Splice the part of the previous plan still ahead of the vehicle onto the recent past.
///
/// `current` is the sequence the vehicle is travelling along and `nearest_index` the index of
/// the point in `current` closest to the vehicle. The past points of `current` within
/// `back_distance_m` (measured along the sequence) of the nearest point are kept, followed by the
/// nearest point itself and then all of `future`. Points further back are dropped.
///
/// An out of range `nearest_index` is clamped to the last point.
pub fn attach_past_points(
    current: &[PointSpeedPair],
    future: &[PointSpeedPair],
    nearest_index: usize,
    back_distance_m: f64,
) -> Vec<PointSpeedPair> {
    if current.is_empty() {
        return future.to_vec();
    }

    let nearest_index = nearest_index.min(current.len() - 1);

    // Walk back from the nearest point until the back distance is used up
    let mut start = nearest_index;
    let mut total_m = 0.0;
    while start > 0 {
        total_m += distance(&current[start].point, &current[start - 1].point);
        if total_m > back_distance_m {
            break;
        }
        start -= 1;
    }

    let mut merged = Vec::with_capacity(nearest_index - start + 1 + future.len());
    merged.extend_from_slice(&current[start..=nearest_index]);
    merged.extend_from_slice(future);

    debug!(
        "Attached {} past points and {} future points",
        nearest_index - start,
        future.len()
    );

    merged
}

/// Resample a line string so that points are `step_m` apart along it.
///
/// The first and last points are always included, so the final spacing may be shorter.
pub fn resample_linestring(
    points: &[Point2<f64>],
    step_m: f64,
) -> Result<Vec<Point2<f64>>, WaypointError> {
    if !(step_m > 0.0) {
        return Err(WaypointError::InvalidStep(step_m));
    }
    if points.is_empty() {
        return Err(WaypointError::EmptySequence);
    }

    let downtracks = compute_downtracks(points);
    let total_m = downtracks[downtracks.len() - 1];

    let num_steps = (total_m / step_m).ceil() as usize;
    let stations: Vec<f64> = (0..num_steps)
        .map(|i| i as f64 * step_m)
        .chain(std::iter::once(total_m))
        .collect();

    Ok(points_at_downtracks(points, &downtracks, &stations))
}

/// Resample a line string to exactly `count` points evenly spaced along it.
pub fn resample_to_count(
    points: &[Point2<f64>],
    count: usize,
) -> Result<Vec<Point2<f64>>, WaypointError> {
    if points.is_empty() {
        return Err(WaypointError::EmptySequence);
    }
    if count == 1 {
        return Ok(vec![points[0]]);
    }

    let downtracks = compute_downtracks(points);
    let total_m = downtracks[downtracks.len() - 1];

    let stations: Vec<f64> = (0..count)
        .map(|i| total_m * i as f64 / (count - 1) as f64)
        .collect();

    Ok(points_at_downtracks(points, &downtracks, &stations))
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Interpolate positions along a line string at the given distances along it.
fn points_at_downtracks(
    points: &[Point2<f64>],
    downtracks: &[f64],
    stations: &[f64],
) -> Vec<Point2<f64>> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = points.iter().map(|p| (p.x, p.y)).unzip();

    stations
        .iter()
        .filter_map(|&s| Some(Point2::new(interp(downtracks, &xs, s)?, interp(downtracks, &ys, s)?)))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn line_pairs(points: &[(f64, f64)], speed: f64) -> Vec<PointSpeedPair> {
        points
            .iter()
            .map(|&(x, y)| PointSpeedPair::new(Point2::new(x, y), speed))
            .collect()
    }

    #[test]
    fn test_pair_split() {
        let points: Vec<Point2<f64>> = (0..6).map(|i| Point2::new(i as f64, i as f64 + 1.0)).collect();
        let speeds = vec![1.0, 1.5, 2.0, 2.5, 3.0, 3.5];

        let pairs = pair(&points, &speeds).unwrap();
        assert_eq!(pairs.len(), points.len());
        assert_eq!(pairs[3], PointSpeedPair::new(Point2::new(3.0, 4.0), 2.5));

        let (split_points, split_speeds) = split(&pairs);
        assert_eq!(split_points, points);
        assert_eq!(split_speeds, speeds);

        assert_eq!(
            pair(&points, &speeds[..2]),
            Err(WaypointError::LengthMismatch(6, 2))
        );
    }

    #[test]
    fn test_constrain_to_time_boundary() {
        let pairs = line_pairs(
            &[
                (0.0, 0.0),
                (1.0, 0.0),
                (2.0, 0.0),
                (3.0, 0.0),
                (4.0, 0.0),
                (5.0, 0.0),
                (6.0, 0.0),
                (7.0, 0.0),
            ],
            1.0,
        );

        let bound = constrain_to_time_boundary(&pairs, 6.0).unwrap();

        assert_eq!(bound.len(), 6);
        for (i, p) in bound.iter().enumerate() {
            assert!((p.point.x - i as f64).abs() < 1e-7);
            assert!(p.point.y.abs() < 1e-7);
            assert!((p.speed - 1.0).abs() < 1e-7);
        }

        // Long horizon keeps everything, short horizon keeps the first point
        assert_eq!(constrain_to_time_boundary(&pairs, 100.0).unwrap().len(), 8);
        assert_eq!(constrain_to_time_boundary(&pairs, 0.0).unwrap().len(), 1);
        assert_eq!(
            constrain_to_time_boundary(&[], 1.0),
            Err(WaypointError::EmptySequence)
        );
    }

    #[test]
    fn test_constrain_stops_at_standstill() {
        let mut pairs = line_pairs(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)], 1.0);
        pairs[1].speed = 0.0;
        pairs[2].speed = 0.0;

        assert_eq!(constrain_to_time_boundary(&pairs, 100.0).unwrap().len(), 2);
    }

    #[test]
    fn test_nearest_index() {
        let pairs = line_pairs(
            &[
                (0.0, 0.0),
                (1.0, 1.0),
                (2.0, 2.0),
                (3.0, 3.0),
                (4.0, 4.0),
                (5.0, 5.0),
                (6.0, 6.0),
                (7.0, 7.0),
            ],
            1.0,
        );
        let (points, _) = split(&pairs);

        let state = VehicleState::new(3.3, 3.3, 0.0, 0.0);

        assert_eq!(nearest_index(&points, &state), Some(3));
        assert_eq!(nearest_index(&pairs, &state), Some(3));
        assert_eq!(nearest_index::<PointSpeedPair>(&[], &state), None);

        // Equidistant points resolve to the first one
        let state = VehicleState::new(0.5, 0.5, 0.0, 0.0);
        assert_eq!(nearest_index(&points, &state), Some(0));
    }

    #[test]
    fn test_attach_past_points() {
        let points = line_pairs(
            &[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0), (3.0, 4.0), (4.0, 5.0), (5.0, 6.0)],
            1.0,
        );
        let future = points[3..].to_vec();

        let result = attach_past_points(&points, &future, 2, 1.5);

        assert_eq!(result.len(), points.len() - 1);
        let expected = [(1.0, 2.0), (2.0, 3.0), (3.0, 4.0), (4.0, 5.0), (5.0, 6.0)];
        for (p, (x, y)) in result.iter().zip(expected.iter()) {
            assert!((p.point.x - x).abs() < 1e-7);
            assert!((p.point.y - y).abs() < 1e-7);
        }
    }

    #[test]
    fn test_attach_past_points_edges() {
        let points = line_pairs(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)], 1.0);
        let future = line_pairs(&[(3.0, 0.0)], 2.0);

        // Everything within the back distance is kept
        assert_eq!(attach_past_points(&points, &future, 2, 10.0).len(), 4);

        // Zero back distance keeps only the nearest point
        let result = attach_past_points(&points, &future, 1, 0.0);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].point, Point2::new(1.0, 0.0));

        // Out of range index is clamped
        assert_eq!(attach_past_points(&points, &[], 10, 0.0).len(), 1);

        assert_eq!(attach_past_points(&[], &future, 0, 1.0), future);
    }

    #[test]
    fn test_compute_downtracks() {
        let points = vec![Point2::new(0.0, 0.0), Point2::new(3.0, 4.0), Point2::new(3.0, 6.0)];

        assert_eq!(compute_downtracks(&points), vec![0.0, 5.0, 7.0]);
        assert!(compute_downtracks::<Point2<f64>>(&[]).is_empty());
    }

    #[test]
    fn test_resample_linestring() {
        let points = vec![Point2::new(0.0, 0.0), Point2::new(2.5, 0.0), Point2::new(2.5, 2.0)];

        let resampled = resample_linestring(&points, 1.0).unwrap();

        let expected = [
            (0.0, 0.0),
            (1.0, 0.0),
            (2.0, 0.0),
            (2.5, 0.5),
            (2.5, 1.5),
            (2.5, 2.0),
        ];
        assert_eq!(resampled.len(), expected.len());
        for (p, (x, y)) in resampled.iter().zip(expected.iter()) {
            assert!((p.x - x).abs() < 1e-9 && (p.y - y).abs() < 1e-9);
        }

        assert_eq!(
            resample_linestring(&points, 0.0),
            Err(WaypointError::InvalidStep(0.0))
        );
    }

    #[test]
    fn test_resample_to_count() {
        let points = vec![Point2::new(0.0, 0.0), Point2::new(4.0, 0.0)];

        let resampled = resample_to_count(&points, 5).unwrap();
        assert_eq!(resampled.len(), 5);
        assert_eq!(resampled[0], points[0]);
        assert_eq!(resampled[4], points[1]);
        assert!((resampled[2].x - 2.0).abs() < 1e-12);
    }
}
