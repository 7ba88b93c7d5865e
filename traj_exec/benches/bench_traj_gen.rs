//! # Trajectory Generation Benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use nalgebra::Point2;
use traj_lib::{
    speed, spline,
    traj::{self, TrajGenParams},
    vehicle::VehicleState,
    waypoint::{self, PointSpeedPair},
};

fn traj_gen_benchmark(c: &mut Criterion) {
    // ---- Build a winding path ----

    let points: Vec<Point2<f64>> = (0..200)
        .map(|i| {
            let x = i as f64 * 0.5;
            Point2::new(x, 5.0 * (x / 10.0).sin())
        })
        .collect();
    let path: Vec<PointSpeedPair> = points
        .iter()
        .map(|p| PointSpeedPair::new(*p, 10.0))
        .collect();

    let curve = spline::fit(&points).unwrap();
    let ts: Vec<f64> = (0..=500).map(|i| i as f64 / 500.0).collect();
    let samples: Vec<Point2<f64>> = ts
        .iter()
        .map(|t| spline::Spline::point_at(&curve, *t))
        .collect();
    let downtracks = waypoint::compute_downtracks(&samples);
    let curv_speeds = speed::curvature_speed_limits(
        &spline::compute_curvatures(&curve, &ts),
        1.5,
        10.0,
    );

    let state = VehicleState::new(0.0, 0.0, 0.0, 5.0);
    let params = TrajGenParams {
        trajectory_time_length_s: 20.0,
        ..Default::default()
    };

    // ---- Benchmarks ----

    c.bench_function("spline::fit", |b| b.iter(|| spline::fit(&points).unwrap()));

    c.bench_function("speed::optimize_speed", |b| {
        b.iter(|| speed::optimize_speed(&downtracks, &curv_speeds, 1.5).unwrap())
    });

    c.bench_function("traj::compose_from_path", |b| {
        b.iter(|| traj::compose_from_path(&path, &state, 0.0, &params).unwrap())
    });
}

criterion_group!(benches, traj_gen_benchmark);
criterion_main!(benches);
