use std::str::FromStr;

use crate::{Color, ColorMatcher, Coordinate, GameState, ScreenError};

/// Recognizes one game state from a fixed set of screen samples.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorRule {
    state: GameState,
    coordinates: Vec<Coordinate>,
    matcher: ColorMatcher,
    allowed_mismatches: usize,
}

impl DetectorRule {
    /// Builds a rule, rejecting one with nothing to sample.
    ///
    /// The rule matches when strictly fewer than `allowed_mismatches` samples fail
    /// `matcher`; an allowance above one tolerates the cursor sitting over a sample point.
    pub fn new(
        state: GameState,
        coordinates: Vec<Coordinate>,
        matcher: ColorMatcher,
        allowed_mismatches: usize,
    ) -> Result<Self, ScreenError> {
        if coordinates.is_empty() {
            return Err(ScreenError::EmptyRule(state));
        }

        Ok(Self {
            state,
            coordinates,
            matcher,
            allowed_mismatches,
        })
    }

    /// The rule name, which is also the key its actions live under in the action config.
    pub fn name(&self) -> &'static str {
        self.state.config_key()
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn matcher(&self) -> ColorMatcher {
        self.matcher
    }

    pub fn allowed_mismatches(&self) -> usize {
        self.allowed_mismatches
    }

    /// Whether a given mismatch count is low enough for this rule to win.
    pub fn accepts(&self, mismatches: usize) -> bool {
        mismatches < self.allowed_mismatches
    }
}

/// Detector rules in priority order. The first rule that accepts wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleSet(Vec<DetectorRule>);

impl RuleSet {
    pub fn new(rules: Vec<DetectorRule>) -> Self {
        Self(rules)
    }

    /// The built-in rules for a given display resolution.
    pub fn for_resolution(resolution: Resolution) -> Self {
        let coordinates = match resolution {
            Resolution::Qhd => [
                vec![(1936, 49), (1936, 109), (1989, 49), (1976, 87)],
                vec![(2369, 1204), (2415, 1245), (2377, 1249), (2343, 1270)],
                vec![(2357, 250), (2402, 250), (2437, 250), (2483, 250)],
            ],

            Resolution::FullHd => [
                vec![(1490, 40), (1458, 74)],
                vec![(1780, 904), (1810, 949), (1742, 942), (1782, 935)],
                vec![(1766, 185), (1787, 193), (1815, 188), (1862, 192)],
            ],
        };

        let [in_menu, waiting, character_select] =
            coordinates.map(|points| points.into_iter().map(|(x, y)| Coordinate::new(x, y)).collect::<Vec<_>>());

        Self(vec![
            DetectorRule {
                state: GameState::InMenu,
                coordinates: in_menu,
                matcher: ColorMatcher::Reference {
                    color: Color::new(24, 113, 186),
                    tolerance: 2,
                },
                allowed_mismatches: 2,
            },
            DetectorRule {
                state: GameState::Waiting,
                coordinates: waiting,
                matcher: ColorMatcher::Greyscale { tolerance: 12 },
                allowed_mismatches: 1,
            },
            DetectorRule {
                state: GameState::CharacterSelect,
                coordinates: character_select,
                matcher: ColorMatcher::Reference {
                    color: Color::new(255, 255, 255),
                    tolerance: 3,
                },
                allowed_mismatches: 2,
            },
        ])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DetectorRule> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a DetectorRule;
    type IntoIter = std::slice::Iter<'a, DetectorRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Display resolutions that ship with sample coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
pub enum Resolution {
    /// 2560x1440.
    #[default]
    #[serde(rename = "1440p")]
    Qhd,

    /// 1920x1080.
    #[serde(rename = "1080p")]
    FullHd,
}

impl FromStr for Resolution {
    type Err = ScreenError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "1440p" | "2560x1440" => Ok(Self::Qhd),
            "1080p" | "1920x1080" => Ok(Self::FullHd),
            other => Err(ScreenError::UnknownResolution(other.to_string())),
        }
    }
}
