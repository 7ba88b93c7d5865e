//! Trajectory generation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

use super::{TrajGenError, DEFAULT_CONTROLLER};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory generation
#[derive(Deserialize, Debug, Clone)]
pub struct TrajGenParams {

    /// Duration of the generated trajectory. Points beyond this are dropped.
    ///
    /// Units: seconds
    pub trajectory_time_length_s: f64,

    /// Distance between points sampled from the fitted curve.
    ///
    /// Units: meters
    pub curve_resample_step_size_m: f64,

    /// Lowest speed the trajectory will command.
    ///
    /// Units: meters/second
    pub minimum_speed_ms: f64,

    /// Longitudinal acceleration (and deceleration) limit.
    ///
    /// Units: meters/second^2
    pub max_accel_mss: f64,

    /// Lateral acceleration limit, used to cap the speed in turns.
    ///
    /// Units: meters/second^2
    pub lateral_accel_limit_mss: f64,

    /// Size of the moving average window applied to the optimised speeds. Must be odd, or 0 to
    /// disable the filter.
    pub speed_moving_average_window_size: usize,

    /// Size of the moving average window applied to the sampled curvatures. Must be odd, or 0
    /// to disable the filter.
    pub curvature_moving_average_window_size: usize,

    /// Distance behind the vehicle of the previous plan which is kept when fitting the new
    /// curve.
    ///
    /// Units: meters
    pub back_distance_m: f64,

    /// Name of the controller which should execute the trajectory
    #[serde(default = "default_controller")]
    pub desired_controller_plugin: String,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajGenParams {
    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), TrajGenError> {
        if !(self.trajectory_time_length_s > 0.0) {
            return Err(TrajGenError::InvalidParams(
                "trajectory_time_length_s must be positive",
            ));
        }
        if !(self.curve_resample_step_size_m > 0.0) {
            return Err(TrajGenError::InvalidParams(
                "curve_resample_step_size_m must be positive",
            ));
        }
        if !(self.max_accel_mss > 0.0) {
            return Err(TrajGenError::InvalidParams("max_accel_mss must be positive"));
        }
        if !(self.lateral_accel_limit_mss > 0.0) {
            return Err(TrajGenError::InvalidParams(
                "lateral_accel_limit_mss must be positive",
            ));
        }
        if !(self.minimum_speed_ms >= 0.0) || !(self.back_distance_m >= 0.0) {
            return Err(TrajGenError::InvalidParams(
                "minimum_speed_ms and back_distance_m must not be negative",
            ));
        }

        Ok(())
    }
}

impl Default for TrajGenParams {
    fn default() -> Self {
        Self {
            trajectory_time_length_s: 6.0,
            curve_resample_step_size_m: 1.0,
            minimum_speed_ms: 2.2352,
            max_accel_mss: 1.5,
            lateral_accel_limit_mss: 1.5,
            speed_moving_average_window_size: 5,
            curvature_moving_average_window_size: 9,
            back_distance_m: 20.0,
            desired_controller_plugin: default_controller(),
        }
    }
}

fn default_controller() -> String {
    String::from(DEFAULT_CONTROLLER)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_from_toml() {
        let params: TrajGenParams = util::params::from_str(
            r#"
            trajectory_time_length_s = 8.0
            curve_resample_step_size_m = 0.5
            minimum_speed_ms = 1.0
            max_accel_mss = 2.0
            lateral_accel_limit_mss = 2.5
            speed_moving_average_window_size = 3
            curvature_moving_average_window_size = 0
            back_distance_m = 10.0
            "#,
        )
        .unwrap();

        assert_eq!(params.curve_resample_step_size_m, 0.5);
        assert_eq!(params.desired_controller_plugin, DEFAULT_CONTROLLER);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        assert!(TrajGenParams::default().validate().is_ok());

        let mut params = TrajGenParams::default();
        params.max_accel_mss = -1.0;
        assert!(matches!(
            params.validate(),
            Err(TrajGenError::InvalidParams(_))
        ));

        let mut params = TrajGenParams::default();
        params.curve_resample_step_size_m = 0.0;
        assert!(params.validate().is_err());
    }
}
