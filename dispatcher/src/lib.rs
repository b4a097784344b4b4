//! Turns game state transitions into playback commands.
//!
//! Each state name maps to an ordered list of actions (see `ActionConfig`). When the
//! watcher reports a transition, `ActionDispatcher::dispatch` runs that list against a
//! `MediaControl` implementation, absorbing the failures we expect to see in normal use.

mod action;
pub use action::{Action, ActionParseError};

mod config;
pub use config::{ActionConfig, DEFAULT_CONFIG_FILE};

mod dispatch;
pub use dispatch::{ActionDispatcher, ActionOutcome, DispatchReport, Outcome};

mod handled;
pub use handled::HandledErrorSet;

mod watcher;
pub use watcher::TransitionWatcher;
