use std::collections::{BTreeMap, BTreeSet};

/// Per action, the failure messages that are routine for it and shouldn't be reported
/// as unhandled. A 403 on `play` while something is already playing is the classic case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandledErrorSet {
    messages: BTreeMap<String, BTreeSet<String>>,
}

impl Default for HandledErrorSet {
    fn default() -> Self {
        let mut handled = Self::empty();
        handled.insert("set_volume", "Unable to set volume");
        handled.insert("play", "Unable to play");
        handled.insert("pause", "Unable to pause");
        handled
    }
}

impl HandledErrorSet {
    /// A set that handles nothing.
    pub fn empty() -> Self {
        Self {
            messages: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, action: &str, message: &str) {
        self.messages
            .entry(action.to_string())
            .or_default()
            .insert(message.to_string());
    }

    pub fn is_handled(&self, action: &str, message: &str) -> bool {
        self.messages
            .get(action)
            .is_some_and(|messages| messages.contains(message))
    }
}
