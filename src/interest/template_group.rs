use std::fmt;
use std::sync::Arc;
use std::sync::Weak;
use std::time::SystemTime;

use parking_lot::RwLock;
use tracing::debug;
use tracing::trace;

use super::InterestBucket;
use super::MatchSet;
use crate::registry::ConcurrentRegistry;
use crate::watcher::LinkOutcome;
use crate::EntryTransition;
use crate::Payload;
use crate::Watcher;

/// All watchers registered against one exact template.
///
/// # Locking
///
/// The `removed` flag doubles as the group lock:
/// - shared: `add_watcher`, `collect_interested`, `reap`
/// - exclusive: `remove_if_empty`
///
/// `remove_if_empty` and `add_watcher` are therefore mutually exclusive, so
/// no caller can successfully add a watcher to a group that then vanishes
/// unobserved.
pub struct TemplateGroup<P: Payload> {
    template: Arc<P>,
    removed: RwLock<bool>,
    watchers: ConcurrentRegistry<Arc<Watcher<P>>>,
    owner: Weak<InterestBucket<P>>,
}

impl<P: Payload> TemplateGroup<P> {
    pub(crate) fn new(
        template: Arc<P>,
        owner: Weak<InterestBucket<P>>,
    ) -> Self {
        Self {
            template,
            removed: RwLock::new(false),
            watchers: ConcurrentRegistry::new(),
            owner,
        }
    }

    pub fn template(&self) -> &Arc<P> {
        &self.template
    }

    pub fn is_removed(&self) -> bool {
        *self.removed.read()
    }

    /// Live watchers currently in the group
    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    /// Adds `watcher` to the group.
    ///
    /// Returns `false` only if the group has been removed. Adding a watcher
    /// that is already a member is a no-op that returns `true`. A watcher
    /// that reached a terminal state is not added, since it can never be
    /// reported again, but the group itself is alive so the call returns `true`.
    pub fn add_watcher(
        self: &Arc<Self>,
        watcher: &Arc<Watcher<P>>,
    ) -> bool {
        let removed = self.removed.read();
        if *removed {
            return false;
        }

        match watcher.link(self, || self.watchers.add(Arc::clone(watcher))) {
            LinkOutcome::Linked => {
                trace!(
                    watcher = watcher.ordinal(),
                    template = ?self.template,
                    "Watcher added to template group"
                );
            }
            LinkOutcome::AlreadyLinked => {}
            LinkOutcome::Inactive => {
                debug!(
                    watcher = watcher.ordinal(),
                    state = ?watcher.state(),
                    "Skipped adding inactive watcher"
                );
            }
        }
        true
    }

    /// Removes `watcher` from the group. Idempotent, a no-op when the
    /// watcher is not a member.
    pub fn remove_watcher(
        &self,
        watcher: &Watcher<P>,
    ) -> bool {
        watcher.unlink(self)
    }

    /// Adds every interested member to `out`.
    ///
    /// No-op when the group has been removed or its template does not match
    /// the transitioning entry.
    pub fn collect_interested(
        &self,
        transition: &EntryTransition<P>,
        ordinal: u64,
        out: &mut MatchSet<P>,
    ) {
        let removed = self.removed.read();
        if *removed || !self.template.matches(transition.entry()) {
            return;
        }

        for handle in self.watchers.iter() {
            let watcher = handle.payload();
            if watcher.is_active() && watcher.is_interested(transition, ordinal) {
                out.insert(watcher);
            }
        }
    }

    /// Expires every member whose lease ran out as of `now`.
    ///
    /// Candidates are collected under the shared lock; expiring them detaches
    /// them from all their groups, which happens after the lock is released.
    /// Returns the number of watchers expired by this call.
    pub fn reap(
        &self,
        now: SystemTime,
    ) -> usize {
        let expired: Vec<Arc<Watcher<P>>> = {
            let removed = self.removed.read();
            if *removed {
                return 0;
            }
            self.watchers
                .iter()
                .map(|handle| Arc::clone(handle.payload()))
                .filter(|watcher| watcher.is_expired(now))
                .collect()
        };

        let reaped = expired.iter().filter(|watcher| watcher.expire_if_due(now)).count();
        self.watchers.reap();

        if reaped > 0 {
            debug!(reaped, template = ?self.template, "Expired watchers reaped");
        }
        reaped
    }

    /// Marks the group removed and unlinks it from its bucket, but only if
    /// no live watcher remains while the exclusive lock is held.
    pub fn remove_if_empty(&self) -> bool {
        {
            let mut removed = self.removed.write();
            if *removed || !self.watchers.is_empty() {
                return false;
            }
            *removed = true;
        }

        if let Some(owner) = self.owner.upgrade() {
            owner.detach(self);
        }
        trace!(template = ?self.template, "Template group removed");
        true
    }
}

impl<P: Payload> fmt::Debug for TemplateGroup<P> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("TemplateGroup")
            .field("template", &self.template)
            .field("removed", &self.is_removed())
            .field("watchers", &self.watcher_count())
            .finish_non_exhaustive()
    }
}
