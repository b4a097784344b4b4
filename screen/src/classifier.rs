use ow_integrations::Log;

use crate::{ColorMatcher, Coordinate, DetectorRule, GameState, PixelSampler, RuleSet};

/// Turns screen samples into a `GameState` by walking an ordered `RuleSet`.
#[derive(Debug)]
pub struct StateClassifier<S> {
    sampler: S,
    rules: RuleSet,
}

impl<S> StateClassifier<S>
where
    S: PixelSampler,
{
    pub fn new(sampler: S, rules: RuleSet) -> Self {
        Self { sampler, rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    /// Returns the state of the first rule (in priority order) that accepts the current
    /// screen, or `GameState::Unknown` if none do. Later rules are not sampled once one
    /// matches.
    pub fn classify(&self) -> GameState {
        for rule in &self.rules {
            let mismatches = self.count_mismatches(rule);

            if rule.accepts(mismatches) {
                tracing::trace!(target: Log::Screen, rule = rule.name(), mismatches, "Rule matched");
                return rule.state();
            }
        }

        GameState::Unknown
    }

    fn count_mismatches(&self, rule: &DetectorRule) -> usize {
        let matcher = rule.matcher();

        rule.coordinates()
            .iter()
            .filter(|at| !self.sample_matches(**at, matcher))
            .count()
    }

    /// An unreadable pixel counts as a mismatch; a flaky read never surfaces as an error.
    fn sample_matches(&self, at: Coordinate, matcher: ColorMatcher) -> bool {
        match self.sampler.sample(at) {
            Ok(color) => matcher.matches(color),

            Err(error) => {
                tracing::debug!(target: Log::Screen, ?error, "Pixel sample failed");
                false
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;
    use crate::{Color, ScreenError};

    #[derive(Default)]
    struct FakeScreen {
        pixels: HashMap<Coordinate, Color>,
        reads: RefCell<Vec<Coordinate>>,
    }

    impl FakeScreen {
        fn paint(&mut self, points: &[(i32, i32)], color: Color) {
            for (x, y) in points {
                self.pixels.insert(Coordinate::new(*x, *y), color);
            }
        }
    }

    impl PixelSampler for FakeScreen {
        fn sample(&self, at: Coordinate) -> Result<Color, ScreenError> {
            self.reads.borrow_mut().push(at);

            self.pixels
                .get(&at)
                .copied()
                .ok_or(ScreenError::SampleFailed { x: at.x, y: at.y })
        }
    }

    const BLUE: Color = Color::new(24, 113, 186);
    const RED: Color = Color::new(200, 10, 10);

    fn rule(state: GameState, points: &[(i32, i32)], allowed: usize) -> DetectorRule {
        DetectorRule::new(
            state,
            points.iter().map(|(x, y)| Coordinate::new(*x, *y)).collect(),
            ColorMatcher::Reference { color: BLUE, tolerance: 2 },
            allowed,
        )
        .unwrap()
    }

    #[test]
    fn zero_mismatches_classifies_as_rule_state() {
        let mut screen = FakeScreen::default();
        screen.paint(&[(0, 0), (1, 0)], BLUE);

        let rules = RuleSet::new(vec![rule(GameState::InMenu, &[(0, 0), (1, 0)], 1)]);
        let classifier = StateClassifier::new(&screen, rules);

        assert_eq!(classifier.classify(), GameState::InMenu);
    }

    #[test]
    fn mismatches_equal_to_threshold_do_not_match() {
        let mut screen = FakeScreen::default();
        screen.paint(&[(0, 0), (1, 0)], BLUE);
        screen.paint(&[(2, 0), (3, 0)], RED);

        let points = [(0, 0), (1, 0), (2, 0), (3, 0)];

        let strict = StateClassifier::new(&screen, RuleSet::new(vec![rule(GameState::InMenu, &points, 2)]));
        assert_eq!(strict.classify(), GameState::Unknown);

        let loose = StateClassifier::new(&screen, RuleSet::new(vec![rule(GameState::InMenu, &points, 3)]));
        assert_eq!(loose.classify(), GameState::InMenu);
    }

    #[test]
    fn first_matching_rule_wins_and_later_rules_are_not_sampled() {
        let mut screen = FakeScreen::default();
        screen.paint(&[(0, 0), (5, 5)], BLUE);

        let rules = RuleSet::new(vec![
            rule(GameState::Waiting, &[(0, 0)], 1),
            rule(GameState::CharacterSelect, &[(5, 5)], 1),
        ]);

        let classifier = StateClassifier::new(&screen, rules);

        assert_eq!(classifier.classify(), GameState::Waiting);
        assert_eq!(*screen.reads.borrow(), vec![Coordinate::new(0, 0)]);
    }

    #[test]
    fn duplicate_coordinates_across_rules_are_independent() {
        let mut screen = FakeScreen::default();
        screen.paint(&[(0, 0)], BLUE);

        let greyscale = DetectorRule::new(
            GameState::Waiting,
            vec![Coordinate::new(0, 0)],
            ColorMatcher::Greyscale { tolerance: 12 },
            1,
        )
        .unwrap();

        let rules = RuleSet::new(vec![greyscale, rule(GameState::CharacterSelect, &[(0, 0)], 1)]);
        let classifier = StateClassifier::new(&screen, rules);

        assert_eq!(classifier.classify(), GameState::CharacterSelect);
    }

    #[test]
    fn failed_reads_count_as_mismatches() {
        let screen = FakeScreen::default();

        let classifier = StateClassifier::new(&screen, RuleSet::new(vec![rule(GameState::InMenu, &[(9, 9)], 1)]));

        assert_eq!(classifier.classify(), GameState::Unknown);
    }

    #[test]
    fn empty_rule_set_is_always_unknown() {
        let screen = FakeScreen::default();
        let classifier = StateClassifier::new(&screen, RuleSet::default());

        assert_eq!(classifier.classify(), GameState::Unknown);
    }
}
