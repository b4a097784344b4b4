//! Shared plumbing for the workspace: log targets that every crate routes its
//! `tracing` events through, and the subscriber setup the binary installs on boot.

pub mod logger;
pub use logger::{LogDestination, LoggerError, verbosity_to_level};

/// Log targets for each subsystem.
///
/// These are used as the `target` of `tracing` events so that output can be
/// filtered (or at least grepped) per subsystem:
///
/// ```no_run
/// use ow_integrations::Log;
///
/// tracing::info!(target: Log::Spotify, "Started playback");
/// ```
#[allow(non_snake_case, non_upper_case_globals)]
pub mod Log {
    /// Pixel sampling and state classification.
    pub const Screen: &str = "ow::screen";

    /// Playback commands sent to the Web API.
    pub const Spotify: &str = "ow::spotify";

    /// Token exchange, refresh and credential persistence.
    pub const Auth: &str = "ow::auth";

    /// Action configuration and transition dispatch.
    pub const Dispatch: &str = "ow::dispatch";

    /// Process lifecycle: startup, poll loop, shutdown.
    pub const App: &str = "ow::app";
}
