//! End to end trajectory generation scenarios

use std::f64::consts::FRAC_PI_2;

use nalgebra::Point2;
use traj_lib::{
    traj::{self, Lanelet, TrajGenParams, TrajectoryPoint},
    vehicle::VehicleState,
    waypoint::PointSpeedPair,
};

fn load_params() -> TrajGenParams {
    util::params::load_from_path(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../params/traj_gen.toml"
    ))
    .unwrap()
}

/// Mean speed over each segment of the trajectory
fn segment_speeds(traj: &[TrajectoryPoint]) -> Vec<f64> {
    traj.windows(2)
        .map(|w| (w[1].position() - w[0].position()).norm() / (w[1].target_time_s - w[0].target_time_s))
        .collect()
}

#[test]
fn test_default_params_file() {
    let params = load_params();

    assert!(params.validate().is_ok());
    assert_eq!(params.desired_controller_plugin, traj::DEFAULT_CONTROLLER);
}

#[test]
fn test_compose_turn() {
    // Quarter circle of radius 20 m, turning left from the origin
    let radius_m = 20.0;
    let path: Vec<PointSpeedPair> = (0..=32)
        .map(|i| {
            let theta = FRAC_PI_2 * i as f64 / 32.0;
            PointSpeedPair::new(
                Point2::new(radius_m * theta.sin(), radius_m * (1.0 - theta.cos())),
                10.0,
            )
        })
        .collect();
    let state = VehicleState::new(0.0, 0.0, 0.0, 10.0);
    let params = load_params();

    let traj = traj::compose_from_path(&path, &state, 100.0, &params).unwrap();

    assert!(traj.len() > 2);
    assert_eq!(traj[0].target_time_s, 100.0);
    assert!(traj[0].position().coords.norm() < 1e-9);
    assert!(traj[0].yaw.abs() < 0.1);

    let centre = Point2::new(0.0, radius_m);
    for tp in &traj {
        assert!(tp.is_finite());
        assert!(((tp.position() - centre).norm() - radius_m).abs() < 0.05);
        assert!(tp.target_time_s - 100.0 < params.trajectory_time_length_s + 1e-6);
    }

    for w in traj.windows(2) {
        assert!(w[1].target_time_s > w[0].target_time_s);
        assert!(w[1].yaw > w[0].yaw - 1e-6);
    }

    // Slows down from 10 m/s towards the turn's speed limit but never speeds up past the path
    let speeds = segment_speeds(&traj);
    for s in &speeds {
        assert!(*s <= 10.0 + 1e-6);
    }
    assert!(speeds[speeds.len() - 1] < speeds[0]);
}

#[test]
fn test_compose_mid_path() {
    let path: Vec<PointSpeedPair> = (0..60)
        .map(|i| PointSpeedPair::new(Point2::new(i as f64, 0.0), 5.0))
        .collect();
    let state = VehicleState::new(20.3, 0.2, 0.0, 5.0);
    let params = load_params();

    let traj = traj::compose_from_path(&path, &state, 0.0, &params).unwrap();

    assert!(traj.len() > 2);
    assert!((traj[0].x - 20.0).abs() < 1e-6);
    assert_eq!(traj[0].target_time_s, 0.0);
    for tp in &traj {
        assert!(tp.x >= 20.0 - 1e-6);
    }
}

#[test]
fn test_compose_lane_change() {
    let start = Lanelet {
        id: 100,
        centerline: (0..=10).map(|i| Point2::new(i as f64 * 6.0, 0.0)).collect(),
    };
    let end = Lanelet {
        id: 101,
        centerline: (0..=10).map(|i| Point2::new(i as f64 * 6.0, 3.5)).collect(),
    };
    let state = VehicleState::new(0.0, 0.0, 0.0, 6.0);
    let params = load_params();

    let profile = traj::lane_change_geometry_profile(&start, &end, &state, &params).unwrap();
    assert_eq!(profile[0].point, start.centerline[0]);
    assert_eq!(profile[profile.len() - 1].speed, 6.0);

    let traj = traj::compose_lane_change_trajectory(&start, &end, &state, 0.0, &params).unwrap();
    assert!(traj.len() > 2);
    assert!(traj.iter().all(|tp| tp.y >= -1e-6 && tp.y <= 3.5 + 1e-6));
    assert!(traj.iter().all(|tp| tp.controller_plugin_name == "default"));
}
