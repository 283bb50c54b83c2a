//! Interest indexing: watchers grouped by exact template, templates grouped
//! by exact type name.
//!
//! ```text
//! TransitionDispatcher
//!   ├─ "Alert"  ─> InterestBucket ─┬─ TemplateGroup(Alert{level=high}) ─> [w1, w4]
//!   │                              └─ TemplateGroup(Alert{})           ─> [w2]
//!   ├─ "Event"  ─> InterestBucket ──── TemplateGroup(Event{})           ─> [w3]
//!   └─ wildcard ─> InterestBucket ──── TemplateGroup(*)                 ─> [w5]
//! ```

mod interest_bucket;
mod match_set;
mod template_group;


use std::ops::AddAssign;

pub use interest_bucket::InterestBucket;
pub use match_set::MatchSet;
pub use template_group::TemplateGroup;

/// Outcome of one reap pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReapStats {
    pub watchers_reaped: usize,
    pub groups_pruned: usize,
}

impl AddAssign for ReapStats {
    fn add_assign(
        &mut self,
        other: Self,
    ) {
        self.watchers_reaped += other.watchers_reaped;
        self.groups_pruned += other.groups_pruned;
    }
}
