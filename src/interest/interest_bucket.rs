use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use dashmap::DashMap;
use tracing::trace;

use super::MatchSet;
use super::ReapStats;
use super::TemplateGroup;
use crate::registry::ConcurrentRegistry;
use crate::registry::Handle;
use crate::EntryTransition;
use crate::Payload;

type GroupHandle<P> = Arc<Handle<Arc<TemplateGroup<P>>>>;

/// Every template group whose template has one exact type name.
///
/// Groups are iterated through a [`ConcurrentRegistry`] so matching never
/// holds a map lock, and looked up by template content through a `DashMap`
/// index so that equal templates share one group.
pub struct InterestBucket<P: Payload> {
    type_name: String,
    groups: ConcurrentRegistry<Arc<TemplateGroup<P>>>,
    index: DashMap<Arc<P>, GroupHandle<P>>,
}

impl<P: Payload> InterestBucket<P> {
    pub(crate) fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            groups: ConcurrentRegistry::new(),
            index: DashMap::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the live group for `template`, creating it if needed.
    ///
    /// Lookup and creation happen under the index entry lock, so only one
    /// group is ever published per template. A group found already removed is
    /// replaced in the same critical section.
    pub fn group_for(
        self: &Arc<Self>,
        template: &Arc<P>,
    ) -> Arc<TemplateGroup<P>> {
        let mut entry = self
            .index
            .entry(Arc::clone(template))
            .or_insert_with(|| self.publish(template));

        if entry.payload().is_removed() {
            let stale = std::mem::replace(&mut *entry, self.publish(template));
            stale.remove();
            trace!(template = ?template, "Replaced removed template group");
        }

        Arc::clone(entry.payload())
    }

    fn publish(
        self: &Arc<Self>,
        template: &Arc<P>,
    ) -> GroupHandle<P> {
        let group = Arc::new(TemplateGroup::new(Arc::clone(template), Arc::downgrade(self)));
        self.groups.add(group)
    }

    /// Unlinks a removed group from the registry and the index.
    pub(crate) fn detach(
        &self,
        group: &TemplateGroup<P>,
    ) {
        let detached = self.index.remove_if(group.template(), |_, handle| {
            std::ptr::eq(Arc::as_ptr(handle.payload()), group)
        });

        if let Some((_, handle)) = detached {
            handle.remove();
        }
    }

    pub fn collect_interested(
        &self,
        transition: &EntryTransition<P>,
        ordinal: u64,
        out: &mut MatchSet<P>,
    ) {
        for handle in self.groups.iter() {
            handle.payload().collect_interested(transition, ordinal, out);
        }
    }

    /// Reaps expired watchers in every group, then prunes groups left empty.
    pub fn reap(
        &self,
        now: SystemTime,
    ) -> ReapStats {
        let mut stats = ReapStats::default();

        for handle in self.groups.iter() {
            let group = handle.payload();
            stats.watchers_reaped += group.reap(now);
            if group.watcher_count() == 0 && group.remove_if_empty() {
                stats.groups_pruned += 1;
            }
        }
        self.groups.reap();

        stats
    }

    /// Live template groups
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Live watcher memberships across all groups
    pub fn watcher_count(&self) -> usize {
        self.groups.iter().map(|handle| handle.payload().watcher_count()).sum()
    }
}

impl<P: Payload> fmt::Debug for InterestBucket<P> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("InterestBucket")
            .field("type_name", &self.type_name)
            .field("groups", &self.group_count())
            .finish_non_exhaustive()
    }
}
