/// Remembers the last observed state and reports when it changes.
///
/// The very first observation always counts as a transition, so the startup state gets
/// its actions too.
#[derive(Clone, Debug, Default)]
pub struct TransitionWatcher<T> {
    last: Option<T>,
}

impl<T> TransitionWatcher<T>
where
    T: Copy + PartialEq,
{
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Records `state`, returning it if it differs from the previous observation.
    pub fn observe(&mut self, state: T) -> Option<T> {
        if self.last == Some(state) {
            return None;
        }

        self.last = Some(state);
        Some(state)
    }

    pub fn current(&self) -> Option<T> {
        self.last
    }
}
