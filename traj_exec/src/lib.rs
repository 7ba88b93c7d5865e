//! # Trajectory generation library.
//!
//! Turns paths of waypoints with target speeds into timed trajectories a vehicle controller can
//! follow. This library allows the executable, the benches and other crates in the workspace to
//! access the kernel.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Spline fitting - smooth curves through waypoints, and their curvature
pub mod spline;

/// Speed planning - feasible speed profiles under acceleration limits
pub mod speed;

/// Trajectory assembly - builds timed trajectories from paths and lane changes
pub mod traj;

/// Vehicle state - the vehicle's pose and speed at planning time
pub mod vehicle;

/// Waypoint utilities - pairing, splicing, resampling and truncating paths
pub mod waypoint;
