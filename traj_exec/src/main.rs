//! Trajectory generation executable entry point.
//!
//! Reads a request file describing the vehicle state and either a path of waypoints with target
//! speeds or a lane change between two lanelets, generates the trajectory and saves it into the
//! session directory as `trajectory.json`.
//!
//! # Usage
//!
//!     traj_exec [--params <file>] [--verbose] <request.json>
//!
//! Without `--params` the parameters are loaded from `params/traj_gen.toml` under the software
//! root (`TRAJ_GEN_SW_ROOT`).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info};
use serde::Deserialize;
use std::path::PathBuf;
use structopt::StructOpt;

// Internal
use traj_lib::{
    traj::{self, Lanelet, TrajGenParams},
    vehicle::VehicleState,
    waypoint::PointSpeedPair,
};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Parameter file used when none is given on the command line.
const DEFAULT_PARAMS_FILE: &str = "traj_gen.toml";

/// Session-relative path of the generated trajectory.
const TRAJECTORY_FILE: &str = "trajectory.json";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "traj_exec", about = "Generate a timed trajectory from a request file")]
struct Args {
    /// Parameter file to use instead of the software root's traj_gen.toml
    #[structopt(short, long, parse(from_os_str))]
    params: Option<PathBuf>,

    /// Log the trajectory generation library at trace level
    #[structopt(short, long)]
    verbose: bool,

    /// JSON request file
    #[structopt(parse(from_os_str))]
    request: PathBuf,
}

/// A trajectory generation request.
#[derive(Debug, Deserialize)]
struct Request {
    vehicle_state: VehicleState,

    /// Time at which the vehicle state was measured. Units: seconds
    #[serde(default)]
    state_time_s: f64,

    #[serde(flatten)]
    plan: Plan,
}

/// What the trajectory should follow.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Plan {
    Path(Vec<PointSpeedPair>),
    LaneChange { start: Lanelet, end: Lanelet },
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let args = Args::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("traj_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    let kernel_level = if args.verbose {
        LevelFilter::Trace
    } else {
        LevelFilter::Info
    };
    logger_init(LevelFilter::Trace, kernel_level, Some(&session))
        .wrap_err("Failed to initialise logging")?;

    info!("Trajectory Generation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", args);

    // ---- LOAD PARAMETERS ----

    let params: TrajGenParams = match args.params {
        Some(ref path) => util::params::load_from_path(path),
        None => util::params::load(DEFAULT_PARAMS_FILE),
    }
    .wrap_err("Could not load trajectory generation params")?;
    params.validate().wrap_err("Invalid trajectory generation params")?;

    info!("Parameters loaded");
    debug!("{:#?}", params);

    // ---- LOAD REQUEST ----

    let request_str = std::fs::read_to_string(&args.request)
        .wrap_err_with(|| format!("Could not read the request file {:?}", args.request))?;
    let request: Request =
        serde_json::from_str(&request_str).wrap_err("Could not parse the request")?;

    info!(
        "Vehicle at ({:.2}, {:.2}) m heading {:.3} rad, speed {:.2} m/s",
        request.vehicle_state.x_pos_global,
        request.vehicle_state.y_pos_global,
        request.vehicle_state.orientation,
        request.vehicle_state.longitudinal_vel
    );

    // ---- GENERATE ----

    let trajectory = match request.plan {
        Plan::Path(ref path) => {
            info!("Following a path of {} points", path.len());
            traj::compose_from_path(
                path,
                &request.vehicle_state,
                request.state_time_s,
                &params,
            )
        }
        Plan::LaneChange { ref start, ref end } => {
            info!("Changing lane from lanelet {} to {}", start.id, end.id);
            traj::compose_lane_change_trajectory(
                start,
                end,
                &request.vehicle_state,
                request.state_time_s,
                &params,
            )
        }
    }
    .wrap_err("Failed to generate the trajectory")?;

    match (trajectory.first(), trajectory.last()) {
        (Some(first), Some(last)) => info!(
            "Generated {} points from ({:.2}, {:.2}) to ({:.2}, {:.2}) over {:.2} s",
            trajectory.len(),
            first.x,
            first.y,
            last.x,
            last.y,
            last.target_time_s - first.target_time_s
        ),
        _ => info!("Generated an empty trajectory"),
    }

    session.save(TRAJECTORY_FILE, trajectory);

    // ---- SHUTDOWN ----

    session.exit();

    info!("End of execution");

    Ok(())
}
