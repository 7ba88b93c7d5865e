//! Vehicle state snapshot

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The state of the vehicle at the start of a planning cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    /// Position along the X axis of the planning frame
    pub x_pos_global: f64,

    /// Position along the Y axis of the planning frame
    pub y_pos_global: f64,

    /// Heading of the vehicle, anticlockwise from the X axis.
    ///
    /// Units: radians
    #[serde(default)]
    pub orientation: f64,

    /// Forward speed of the vehicle.
    ///
    /// Units: meters/second
    pub longitudinal_vel: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VehicleState {
    pub fn new(x: f64, y: f64, orientation: f64, longitudinal_vel: f64) -> Self {
        Self {
            x_pos_global: x,
            y_pos_global: y,
            orientation,
            longitudinal_vel,
        }
    }

    /// Position of the vehicle in the planning frame
    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x_pos_global, self.y_pos_global)
    }
}
