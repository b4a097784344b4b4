use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Why a configured action entry could not be run.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ActionParseError {
    #[error("action entry must be a non-empty array")]
    NotAnArray,

    #[error("action entry is empty")]
    Empty,

    #[error("action name must be a string")]
    NameNotAString,

    #[error("unknown action `{0}`")]
    UnknownAction(String),

    #[error("`{action}` expects {expected}")]
    BadArguments { action: &'static str, expected: &'static str },
}

/// A single playback command, with its arguments already validated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    SetVolume(i64),
    Play,
    Pause,
}

impl Action {
    /// The name this action goes by in the configuration file.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetVolume(_) => "set_volume",
            Self::Play => "play",
            Self::Pause => "pause",
        }
    }

    /// Parses an `[actionName, ...args]` entry.
    ///
    /// `set_volume` takes exactly one integer. The value is not range checked.
    pub fn parse(entry: &Value) -> Result<Self, ActionParseError> {
        let Value::Array(parts) = entry else {
            return Err(ActionParseError::NotAnArray);
        };

        let (name, args) = parts.split_first().ok_or(ActionParseError::Empty)?;
        let name = name.as_str().ok_or(ActionParseError::NameNotAString)?;

        match (name, args) {
            ("set_volume", [volume]) => volume.as_i64().map(Self::SetVolume).ok_or(
                ActionParseError::BadArguments {
                    action: "set_volume",
                    expected: "an integer volume",
                },
            ),

            ("set_volume", _) => Err(ActionParseError::BadArguments {
                action: "set_volume",
                expected: "exactly one argument",
            }),

            ("play", []) => Ok(Self::Play),
            ("pause", []) => Ok(Self::Pause),

            ("play", _) => Err(ActionParseError::BadArguments {
                action: "play",
                expected: "no arguments",
            }),

            ("pause", _) => Err(ActionParseError::BadArguments {
                action: "pause",
                expected: "no arguments",
            }),

            (other, _) => Err(ActionParseError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetVolume(volume) => write!(f, "set_volume({})", volume),
            other => write!(f, "{}()", other.name()),
        }
    }
}
