//! Logging setup for the executables
//!
//! Records are prefixed with the seconds elapsed since the session epoch and a coloured level
//! tag. Debug and trace records also carry their target, so chatty kernel records can be traced
//! back to their module.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{info, Level};
use thiserror::Error;

// Internal imports
use crate::session::{self, Session};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Log target of the trajectory generation library.
pub const KERNEL_TARGET: &str = "traj_lib";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The minimum log level must include `INFO`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Could not open the session log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("A logger has already been set: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// Records go to stdout and, when a session is given, to the session's log file.
/// `kernel_level` applies to the trajectory generation library only and can't be more verbose
/// than `min_level`.
///
/// # Notes
///
/// - `min_level` must be at least `Info`.
/// - Only the first call can succeed.
pub fn logger_init(
    min_level: LevelFilter,
    kernel_level: LevelFilter,
    session: Option<&Session>,
) -> Result<(), LoggerInitError> {
    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }
    let kernel_level = kernel_filter(min_level, kernel_level);

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            let elapsed = elapsed_field(session::try_get_elapsed_seconds());
            let tag = level_to_str(record.level());

            if record.level() > Level::Info {
                out.finish(format_args!(
                    "[{} {}] {}: {}",
                    elapsed,
                    tag,
                    record.target(),
                    message
                ))
            } else {
                out.finish(format_args!("[{} {}] {}", elapsed, tag, message))
            }
        })
        .level(min_level)
        .level_for(KERNEL_TARGET, kernel_level)
        .chain(std::io::stdout());

    if let Some(s) = session {
        let log_file =
            fern::log_file(&s.log_file_path).map_err(LoggerInitError::LogFileInitError)?;
        dispatch = dispatch.chain(log_file);
    }

    dispatch.apply().map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised at {:?} (kernel {:?})", min_level, kernel_level);
    if let Some(s) = session {
        info!("Session epoch {}, log file {:?}", session::get_epoch(), s.log_file_path);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn kernel_filter(min_level: LevelFilter, kernel_level: LevelFilter) -> LevelFilter {
    kernel_level.min(min_level)
}

/// Fixed width elapsed time, or a dash before the session has started.
fn elapsed_field(elapsed_s: Option<f64>) -> String {
    match elapsed_s {
        Some(s) => format!("{:10.6}", s),
        None => format!("{:>10}", "-"),
    }
}

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Trace => "TRC",
        Level::Debug => "DBG",
        Level::Info => "INF",
        Level::Warn => "WRN",
        Level::Error => "ERR",
    }
}

fn level_to_str(level: Level) -> ColoredString {
    let tag = level_tag(level);
    match level {
        Level::Trace => tag.dimmed().italic(),
        Level::Debug => tag.dimmed(),
        Level::Info => tag.normal(),
        Level::Warn => tag.yellow(),
        Level::Error => tag.red().bold(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_elapsed_field() {
        assert_eq!(elapsed_field(Some(1.5)), "  1.500000");
        assert_eq!(elapsed_field(None), "         -");
        assert_eq!(elapsed_field(Some(1.5)).len(), elapsed_field(None).len());
    }

    #[test]
    fn test_kernel_filter() {
        assert_eq!(
            kernel_filter(LevelFilter::Trace, LevelFilter::Info),
            LevelFilter::Info
        );
        assert_eq!(
            kernel_filter(LevelFilter::Info, LevelFilter::Trace),
            LevelFilter::Info
        );
    }

    #[test]
    fn test_level_tag() {
        assert_eq!(level_tag(Level::Trace), "TRC");
        assert_eq!(level_tag(Level::Warn), "WRN");
    }

    #[test]
    fn test_invalid_min_level() {
        assert!(matches!(
            logger_init(LevelFilter::Warn, LevelFilter::Warn, None),
            Err(LoggerInitError::InvalidMinLogLevel(LevelFilter::Warn))
        ));
    }
}
