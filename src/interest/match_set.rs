use std::collections::BTreeSet;
use std::sync::Arc;

use crate::Payload;
use crate::Watcher;

/// Ordered, duplicate-free set of watchers matched by one transition.
///
/// Follows [`Watcher`] ordering, so the delivery order is the registration
/// order regardless of which bucket or group a watcher was found in, and
/// distinct watchers sharing an ordinal are both kept.
pub struct MatchSet<P: Payload> {
    watchers: BTreeSet<Arc<Watcher<P>>>,
}

impl<P: Payload> MatchSet<P> {
    pub fn new() -> Self {
        Self {
            watchers: BTreeSet::new(),
        }
    }

    /// Returns `false` if the watcher was already present.
    pub fn insert(
        &mut self,
        watcher: &Arc<Watcher<P>>,
    ) -> bool {
        self.watchers.insert(Arc::clone(watcher))
    }

    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Watcher<P>>> {
        self.watchers.iter()
    }

    /// Watchers in ascending ordinal order
    pub fn into_vec(self) -> Vec<Arc<Watcher<P>>> {
        self.watchers.into_iter().collect()
    }
}

impl<P: Payload> Default for MatchSet<P> {
    fn default() -> Self {
        Self::new()
    }
}
