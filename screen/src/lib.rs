//! Watches the game through a handful of fixed screen pixels.
//!
//! Each recognized state has a `DetectorRule`: a set of sample points, a color predicate
//! and a mismatch allowance. A `StateClassifier` walks the rules in priority order and
//! reports the first one that accepts, falling back to `GameState::Unknown`.

use std::fmt;

mod classifier;
pub use classifier::StateClassifier;

mod color;
pub use color::{Color, ColorMatcher, Coordinate};

mod errors;
pub use errors::ScreenError;

mod rules;
pub use rules::{DetectorRule, Resolution, RuleSet};

mod sampler;
pub use sampler::{PixelSampler, ScreenSampler};

/// The discrete states we can recognize on screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GameState {
    #[default]
    Unknown,
    InMenu,
    Waiting,
    CharacterSelect,
}

impl GameState {
    /// The key this state's actions are configured under.
    pub const fn config_key(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::InMenu => "main_menu",
            Self::Waiting => "waiting",
            Self::CharacterSelect => "character_select",
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "Unknown"),
            Self::InMenu => write!(f, "Main Menu"),
            Self::Waiting => write!(f, "Waiting"),
            Self::CharacterSelect => write!(f, "Character Select"),
        }
    }
}
