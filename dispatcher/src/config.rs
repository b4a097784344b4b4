use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::{Value, json};

use ow_integrations::Log;

/// Where the action configuration lives unless told otherwise.
pub const DEFAULT_CONFIG_FILE: &str = "overwatch_spotify.cfg";

const UNKNOWN_STATE: &str = "unknown";

#[derive(Debug, Default, serde::Deserialize)]
struct StateEntry {
    #[serde(default)]
    actions: Vec<Value>,
}

/// Which actions to run when a state is entered.
///
/// Entries are kept as raw JSON so that one bad entry only costs that entry; they are
/// validated when dispatched. The `unknown` state never has any actions.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionConfig {
    states: BTreeMap<String, Vec<Value>>,
}

impl Default for ActionConfig {
    /// Volume up and play in the menus, volume up while waiting, pause on character select.
    fn default() -> Self {
        let mut states = BTreeMap::new();
        states.insert("main_menu".into(), vec![json!(["set_volume", 80]), json!(["play"])]);
        states.insert("waiting".into(), vec![json!(["set_volume", 80])]);
        states.insert("character_select".into(), vec![json!(["pause"])]);
        states.insert(UNKNOWN_STATE.into(), Vec::new());

        Self { states }
    }
}

impl ActionConfig {
    /// Reads the configuration at `path`, falling back to the defaults if the file is
    /// missing or isn't valid.
    pub fn load(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,

            Err(error) => {
                tracing::info!(target: Log::Dispatch, ?path, "Could not access action config, using defaults");
                tracing::debug!(target: Log::Dispatch, ?error);
                return Self::default();
            },
        };

        match Self::from_json_str(&contents) {
            Ok(config) => {
                tracing::info!(target: Log::Dispatch, ?path, "Successfully loaded action config");
                config
            },

            Err(error) => {
                tracing::info!(target: Log::Dispatch, ?path, "Action config is invalid, using defaults");
                tracing::debug!(target: Log::Dispatch, ?error);
                Self::default()
            },
        }
    }

    /// Parses a configuration document. The top level must be an object keyed by state
    /// name; a state whose value isn't `{"actions": [...]}` gets no actions.
    pub fn from_json_str(contents: &str) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, Value> = serde_json::from_str(contents)?;

        let mut states: BTreeMap<String, Vec<Value>> = raw
            .into_iter()
            .map(|(state, value)| {
                let entry = serde_json::from_value::<StateEntry>(value).unwrap_or_else(|error| {
                    tracing::debug!(target: Log::Dispatch, state = %state, ?error, "Ignoring malformed state entry");
                    StateEntry::default()
                });

                (state, entry.actions)
            })
            .collect();

        states.insert(UNKNOWN_STATE.into(), Vec::new());

        Ok(Self { states })
    }

    /// The configured entries for `state`, in order. States that aren't configured have
    /// none.
    pub fn actions(&self, state: &str) -> &[Value] {
        self.states.get(state).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }
}
