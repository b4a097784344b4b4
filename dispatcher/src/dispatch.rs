use serde_json::Value;

use ow_integrations::Log;
use spotify_api::{ApiError, MediaControl};

use crate::{Action, ActionConfig, HandledErrorSet};

/// What happened to one configured action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The command went through.
    Applied,

    /// The command failed in a way we expect (no session, or a handled message).
    Handled(String),

    /// The command failed unexpectedly. This was logged as an error.
    Unhandled(String),

    /// The entry was malformed and never sent.
    Skipped(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionOutcome {
    /// The action as configured, e.g `set_volume(80)`, or the raw entry if it was skipped.
    pub action: String,
    pub outcome: Outcome,
}

/// The result of running one state's action list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub state: String,
    pub actions: Vec<ActionOutcome>,
}

impl DispatchReport {
    pub fn applied(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Applied))
    }

    pub fn unhandled(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Unhandled(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Skipped(_)))
    }

    fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Outcome) -> bool,
    {
        self.actions.iter().filter(|action| predicate(&action.outcome)).count()
    }
}

/// Runs configured actions against a player.
#[derive(Debug)]
pub struct ActionDispatcher<M> {
    player: M,
    config: ActionConfig,
    handled: HandledErrorSet,
}

impl<M> ActionDispatcher<M>
where
    M: MediaControl,
{
    pub fn new(player: M, config: ActionConfig) -> Self {
        Self {
            player,
            config,
            handled: HandledErrorSet::default(),
        }
    }

    pub fn with_handled_errors(mut self, handled: HandledErrorSet) -> Self {
        self.handled = handled;
        self
    }

    pub fn player(&self) -> &M {
        &self.player
    }

    pub fn config(&self) -> &ActionConfig {
        &self.config
    }

    /// Runs every action configured for `state`, in order. Individual failures never stop
    /// the list.
    pub fn dispatch(&mut self, state: &str) -> DispatchReport {
        let mut report = DispatchReport {
            state: state.to_string(),
            actions: Vec::new(),
        };

        let entries = self.config.actions(state).to_vec();

        if entries.is_empty() {
            tracing::debug!(target: Log::Dispatch, state, "No actions configured");
            return report;
        }

        if self.player.session_expired() {
            tracing::info!(target: Log::Dispatch, "Session expired, refreshing access token");

            if let Err(error) = self.player.resume_session() {
                tracing::warn!(target: Log::Dispatch, %error, "Unable to refresh session; actions will be skipped until re-authorized");
            }
        }

        for entry in &entries {
            report.actions.push(self.run_entry(entry));
        }

        report
    }

    fn run_entry(&mut self, entry: &Value) -> ActionOutcome {
        let action = match Action::parse(entry) {
            Ok(action) => action,

            Err(error) => {
                tracing::debug!(target: Log::Dispatch, %entry, %error, "Skipping action");

                return ActionOutcome {
                    action: entry.to_string(),
                    outcome: Outcome::Skipped(error.to_string()),
                };
            },
        };

        let result = match action {
            Action::SetVolume(volume) => self.player.set_volume(volume),
            Action::Play => self.player.play(),
            Action::Pause => self.player.pause(),
        };

        ActionOutcome {
            action: action.to_string(),
            outcome: self.classify(action, result),
        }
    }

    fn classify(&self, action: Action, result: Result<(), ApiError>) -> Outcome {
        let error = match result {
            Ok(()) => return Outcome::Applied,
            Err(error) => error,
        };

        match &error {
            ApiError::InvalidToken | ApiError::NotAuthenticated => {
                tracing::debug!(target: Log::Dispatch, %action, %error, "Action not sent");
                Outcome::Handled(error.to_string())
            },

            ApiError::RequestFailed(message) if self.handled.is_handled(action.name(), message) => {
                tracing::debug!(target: Log::Dispatch, %action, %error, "Handled failure");
                Outcome::Handled(message.clone())
            },

            _ => {
                tracing::error!(target: Log::Dispatch, %action, "Spotify: An unhandled error has been raised");
                tracing::debug!(target: Log::Dispatch, ?error);
                Outcome::Unhandled(error.to_string())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug)]
    enum Fail {
        Message(&'static str),
        InvalidToken,
        NotAuthenticated,
        Timeout,
    }

    impl Fail {
        fn to_error(self) -> ApiError {
            match self {
                Self::Message(message) => ApiError::RequestFailed(message.into()),
                Self::InvalidToken => ApiError::InvalidToken,
                Self::NotAuthenticated => ApiError::NotAuthenticated,
                Self::Timeout => ApiError::Timeout,
            }
        }
    }

    #[derive(Debug, Default)]
    struct FakePlayer {
        calls: Vec<String>,
        failures: Vec<(&'static str, Fail)>,
        expired: bool,
        refresh_succeeds: bool,
        refreshes: usize,
    }

    impl FakePlayer {
        fn record(&mut self, call: String, name: &str) -> Result<(), ApiError> {
            self.calls.push(call);

            match self.failures.iter().find(|(action, _)| *action == name) {
                Some((_, fail)) => Err(fail.to_error()),
                None => Ok(()),
            }
        }
    }

    impl MediaControl for FakePlayer {
        fn play(&mut self) -> Result<(), ApiError> {
            self.record("play".into(), "play")
        }

        fn pause(&mut self) -> Result<(), ApiError> {
            self.record("pause".into(), "pause")
        }

        fn set_volume(&mut self, volume_percent: i64) -> Result<(), ApiError> {
            self.record(format!("set_volume({})", volume_percent), "set_volume")
        }

        fn session_expired(&self) -> bool {
            self.expired
        }

        fn resume_session(&mut self) -> Result<(), ApiError> {
            self.refreshes += 1;

            if self.refresh_succeeds {
                self.expired = false;
                Ok(())
            } else {
                Err(ApiError::InvalidToken)
            }
        }
    }

    fn dispatcher(config: &str, player: FakePlayer) -> ActionDispatcher<FakePlayer> {
        ActionDispatcher::new(player, ActionConfig::from_json_str(config).unwrap())
    }

    #[test]
    fn single_volume_action_makes_one_call() {
        let mut dispatcher = dispatcher(r#"{"waiting": {"actions": [["set_volume", 80]]}}"#, FakePlayer::default());

        let report = dispatcher.dispatch("waiting");

        assert_eq!(dispatcher.player().calls, vec!["set_volume(80)"]);
        assert_eq!(report.applied(), 1);
        assert_eq!(report.actions[0].action, "set_volume(80)");
    }

    #[test]
    fn actions_run_in_configured_order() {
        let mut dispatcher = ActionDispatcher::new(FakePlayer::default(), ActionConfig::default());

        dispatcher.dispatch("main_menu");
        dispatcher.dispatch("character_select");

        assert_eq!(dispatcher.player().calls, vec!["set_volume(80)", "play", "pause"]);
    }

    #[test]
    fn unknown_and_unconfigured_states_do_nothing() {
        let mut dispatcher = ActionDispatcher::new(FakePlayer::default(), ActionConfig::default());

        assert!(dispatcher.dispatch("unknown").actions.is_empty());
        assert!(dispatcher.dispatch("scoreboard").actions.is_empty());
        assert!(dispatcher.player().calls.is_empty());
    }

    #[test]
    fn malformed_entries_are_skipped_and_the_rest_still_run() {
        let mut dispatcher = dispatcher(
            r#"{"main_menu": {"actions": [[], ["skip"], ["set_volume"], ["set_volume", "x"], "pause", ["play"]]}}"#,
            FakePlayer::default(),
        );

        let report = dispatcher.dispatch("main_menu");

        assert_eq!(dispatcher.player().calls, vec!["play"]);
        assert_eq!(report.skipped(), 5);
        assert_eq!(report.applied(), 1);
    }

    #[test]
    fn expected_failures_are_handled() {
        let player = FakePlayer {
            failures: vec![
                ("play", Fail::Message("Unable to play")),
                ("set_volume", Fail::InvalidToken),
                ("pause", Fail::NotAuthenticated),
            ],
            ..Default::default()
        };

        let mut dispatcher = dispatcher(
            r#"{"main_menu": {"actions": [["set_volume", 80], ["play"], ["pause"]]}}"#,
            player,
        );

        let report = dispatcher.dispatch("main_menu");

        assert_eq!(report.actions.len(), 3);
        assert_eq!(report.unhandled(), 0);
        assert!(report.actions.iter().all(|action| matches!(action.outcome, Outcome::Handled(_))));
    }

    #[test]
    fn unexpected_failures_are_reported_but_do_not_stop_the_list() {
        let player = FakePlayer {
            failures: vec![
                ("set_volume", Fail::Message("Playback device not found")),
                ("pause", Fail::Timeout),
            ],
            ..Default::default()
        };

        let mut dispatcher = dispatcher(
            r#"{"main_menu": {"actions": [["set_volume", 80], ["pause"], ["play"]]}}"#,
            player,
        );

        let report = dispatcher.dispatch("main_menu");

        assert_eq!(dispatcher.player().calls, vec!["set_volume(80)", "pause", "play"]);
        assert_eq!(report.unhandled(), 2);
        assert_eq!(report.applied(), 1);
        assert_eq!(
            report.actions[0].outcome,
            Outcome::Unhandled("Playback device not found".into())
        );
    }

    #[test]
    fn handled_messages_are_per_action() {
        let player = FakePlayer {
            failures: vec![("pause", Fail::Message("Unable to play"))],
            ..Default::default()
        };

        let mut dispatcher = dispatcher(r#"{"waiting": {"actions": [["pause"]]}}"#, player);

        assert_eq!(dispatcher.dispatch("waiting").unhandled(), 1);
    }

    #[test]
    fn expired_session_is_resumed_before_running_actions() {
        let player = FakePlayer {
            expired: true,
            refresh_succeeds: true,
            ..Default::default()
        };

        let mut dispatcher = dispatcher(r#"{"waiting": {"actions": [["set_volume", 80]]}}"#, player);
        dispatcher.dispatch("waiting");
        dispatcher.dispatch("waiting");

        assert_eq!(dispatcher.player().refreshes, 1);
        assert!(!dispatcher.player().expired);
    }

    #[test]
    fn failed_resume_still_attempts_the_actions() {
        let player = FakePlayer {
            expired: true,
            ..Default::default()
        };

        let mut dispatcher = dispatcher(r#"{"waiting": {"actions": [["pause"]]}}"#, player);
        let report = dispatcher.dispatch("waiting");

        assert_eq!(dispatcher.player().refreshes, 1);
        assert_eq!(report.actions.len(), 1);
    }

    #[test]
    fn nothing_configured_means_no_refresh() {
        let player = FakePlayer {
            expired: true,
            ..Default::default()
        };

        let mut dispatcher = ActionDispatcher::new(player, ActionConfig::default());
        dispatcher.dispatch("unknown");

        assert_eq!(dispatcher.player().refreshes, 0);
    }

    #[test]
    fn custom_handled_errors_replace_the_defaults() {
        let player = FakePlayer {
            failures: vec![("play", Fail::Message("Playback device not found"))],
            ..Default::default()
        };

        let mut handled = HandledErrorSet::empty();
        handled.insert("play", "Playback device not found");

        let mut dispatcher =
            dispatcher(r#"{"main_menu": {"actions": [["play"]]}}"#, player).with_handled_errors(handled);

        assert_eq!(dispatcher.dispatch("main_menu").unhandled(), 0);
    }
}
