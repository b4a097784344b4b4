use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use thiserror::Error;

/// Where formatted log lines end up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogDestination {
    /// Write to the error stream, with colors.
    Stderr,

    /// Truncate and write to the given file, without colors.
    File(PathBuf),
}

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Unable to create log file {path:?}: {source}")]
    CreateFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("A global subscriber has already been installed")]
    AlreadyInstalled,
}

/// Maps the numeric `--debug-level` flag onto a level filter.
///
/// 1 is debug, 2 info, 3 warning, 4 error. 5 was "critical" in older builds and is
/// treated as error, as `tracing` has nothing above it. 6 and anything higher silences
/// output entirely; 0 opens everything up to trace.
pub fn verbosity_to_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::TRACE,
        1 => LevelFilter::DEBUG,
        2 => LevelFilter::INFO,
        3 => LevelFilter::WARN,
        4 | 5 => LevelFilter::ERROR,
        _ => LevelFilter::OFF,
    }
}

/// Installs the global `tracing` subscriber.
///
/// This should be called once, as early as possible in `main`. Calling it twice returns
/// `LoggerError::AlreadyInstalled` rather than panicking.
pub fn init(level: LevelFilter, destination: LogDestination) -> Result<(), LoggerError> {
    let builder = tracing_subscriber::fmt().with_max_level(level).with_target(true);

    let result = match destination {
        LogDestination::Stderr => builder.with_writer(std::io::stderr).try_init(),

        LogDestination::File(path) => {
            let file = File::create(&path).map_err(|source| LoggerError::CreateFile { path, source })?;

            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        },
    };

    result.map_err(|_| LoggerError::AlreadyInstalled)
}
