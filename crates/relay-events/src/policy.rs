use std::collections::HashMap;

use crate::kind::EventKind;

/// Which event types are relayed. Built once at startup and never mutated.
///
/// A tag that is absent from the map is treated exactly like one mapped to
/// `false`.
#[derive(Debug, Clone, Default)]
pub struct EventPolicy {
    enabled: HashMap<String, bool>,
}

impl EventPolicy {
    pub fn new(enabled: HashMap<String, bool>) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self, tag: &str) -> bool {
        self.enabled.get(tag).copied().unwrap_or(false)
    }

    pub fn allows(&self, kind: &EventKind) -> bool {
        self.is_enabled(kind.tag())
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for EventPolicy {
    fn from_iter<I: IntoIterator<Item = (S, bool)>>(iter: I) -> Self {
        Self {
            enabled: iter.into_iter().map(|(tag, on)| (tag.into(), on)).collect(),
        }
    }
}
