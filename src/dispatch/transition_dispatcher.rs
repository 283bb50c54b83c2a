//! Routes entry transitions to interested watchers
//!
//! # Matching
//!
//! ```text
//! matches_for(Alert{..} extends [Event, Entry])
//!   ├─ bucket "Alert"  ─┐
//!   ├─ bucket "Event"  ─┤ collect_interested ─> MatchSet (ordinal order)
//!   ├─ bucket "Entry"  ─┤                          │
//!   └─ wildcard bucket ─┘                          ▼
//!                                     one-shot claims, sorted Vec<Watcher>
//! ```
//!
//! Only buckets created by a registration are consulted; the match path
//! never creates buckets. No lock spans more than one template group.

use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use std::time::SystemTime;

use dashmap::DashMap;
use tracing::debug;
use tracing::trace;

use crate::metrics::CANCELLED_WATCHERS;
use crate::metrics::MATCHED_WATCHERS;
use crate::metrics::MATCH_SCAN_DURATION;
use crate::metrics::PRUNED_TEMPLATE_GROUPS;
use crate::metrics::REAPED_WATCHERS;
use crate::metrics::WATCHER_REGISTRATIONS;
use crate::DispatchConfig;
use crate::EntryTransition;
use crate::InterestBucket;
use crate::MatchSet;
use crate::Payload;
use crate::ReapStats;
use crate::RegistrationError;
use crate::Result;
use crate::TransitionError;
use crate::Watcher;

/// Point-in-time counts, for monitoring and tests
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherStats {
    /// Type buckets created so far, wildcard bucket excluded
    pub buckets: usize,
    /// Live template groups across all buckets
    pub groups: usize,
    /// Live watcher memberships across all groups
    pub watchers: usize,
}

/// Top-level façade of the notification core.
///
/// # Thread Safety
///
/// Every method may be called concurrently from any number of threads.
/// Buckets and groups are independently lockable; no lock is global.
pub struct TransitionDispatcher<P: Payload> {
    /// Type name -> bucket, created on first registration for that type
    buckets: DashMap<String, Arc<InterestBucket<P>>>,

    /// Templates that match every type
    wildcard: Arc<InterestBucket<P>>,

    /// Highest transition ordinal handed to `matches_for`
    last_ordinal: AtomicU64,

    config: DispatchConfig,
}

impl<P: Payload> TransitionDispatcher<P> {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            wildcard: Arc::new(InterestBucket::new(config.wildcard_type_name.clone())),
            last_ordinal: AtomicU64::new(0),
            config,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Returns the bucket for `type_name`, creating it on first access.
    ///
    /// Exactly one bucket is ever published per type name, even when several
    /// threads race on the first registration.
    pub fn bucket_for(
        &self,
        type_name: &str,
    ) -> Arc<InterestBucket<P>> {
        if type_name == self.config.wildcard_type_name {
            return Arc::clone(&self.wildcard);
        }
        if let Some(bucket) = self.buckets.get(type_name) {
            return Arc::clone(bucket.value());
        }

        let bucket = self
            .buckets
            .entry(type_name.to_string())
            .or_insert_with(|| {
                debug!(type_name, "Interest bucket created");
                Arc::new(InterestBucket::new(type_name))
            });
        Arc::clone(bucket.value())
    }

    fn existing_bucket(
        &self,
        type_name: &str,
    ) -> Option<Arc<InterestBucket<P>>> {
        self.buckets.get(type_name).map(|bucket| Arc::clone(bucket.value()))
    }

    /// Registers `watcher` against `template`.
    ///
    /// Once this returns, every later `matches_for` call considers the
    /// watcher. A watcher may be registered against several templates; it is
    /// reported at most once per transition.
    ///
    /// # Errors
    /// - [`RegistrationError::EmptyTypeName`] for a template without type name
    /// - [`RegistrationError::WatcherInactive`] for a cancelled, expired or
    ///   delivered watcher
    pub fn register(
        &self,
        watcher: &Arc<Watcher<P>>,
        template: Arc<P>,
    ) -> Result<()> {
        if template.type_name().is_empty() {
            return Err(RegistrationError::EmptyTypeName.into());
        }
        if !watcher.is_active() {
            return Err(RegistrationError::WatcherInactive {
                ordinal: watcher.ordinal(),
            }
            .into());
        }

        let bucket = self.bucket_for(template.type_name());

        // A group found by lookup can be pruned before we add to it; the
        // next lookup then publishes a fresh one.
        loop {
            let group = bucket.group_for(&template);
            if group.add_watcher(watcher) {
                break;
            }
            trace!(
                watcher = watcher.ordinal(),
                "Template group pruned during registration, retrying"
            );
        }

        if !watcher.is_active() {
            // Cancelled or expired concurrently; it never becomes visible.
            return Err(RegistrationError::WatcherInactive {
                ordinal: watcher.ordinal(),
            }
            .into());
        }

        if self.config.enable_metrics {
            WATCHER_REGISTRATIONS.inc();
        }
        trace!(
            watcher = watcher.ordinal(),
            template = ?template,
            "Watcher registered"
        );
        Ok(())
    }

    /// Explicit cancellation: removes the watcher from every group it is in.
    ///
    /// Immediate and idempotent. A `matches_for` call already scanning may
    /// still report the watcher; no later call will.
    pub fn cancel(
        &self,
        watcher: &Watcher<P>,
    ) -> bool {
        let cancelled = watcher.cancel();
        if cancelled && self.config.enable_metrics {
            CANCELLED_WATCHERS.inc();
        }
        cancelled
    }

    /// Watchers to notify for `transition`, in ascending watcher ordinal.
    ///
    /// Consults the bucket of the entry's exact type, the bucket of every
    /// supertype and the wildcard bucket. One-shot watchers are claimed here:
    /// only the call that claims one reports it.
    ///
    /// # Errors
    /// - [`TransitionError::InvalidOrdinal`] for ordinal 0
    /// - [`TransitionError::EmptyTypeName`] for an entry without type name
    pub fn matches_for(
        &self,
        transition: &EntryTransition<P>,
        ordinal: u64,
    ) -> Result<Vec<Arc<Watcher<P>>>> {
        if ordinal == 0 {
            return Err(TransitionError::InvalidOrdinal.into());
        }
        let entry = transition.entry();
        if entry.type_name().is_empty() {
            return Err(TransitionError::EmptyTypeName.into());
        }

        let previous = self.last_ordinal.fetch_max(ordinal, Ordering::AcqRel);
        if ordinal <= previous {
            debug!(ordinal, previous, "Transition ordinal arrived out of order");
        }

        let started = Instant::now();
        let mut matched = MatchSet::new();

        let type_names =
            std::iter::once(entry.type_name()).chain(entry.super_type_names().iter().map(String::as_str));
        for type_name in type_names {
            if type_name == self.config.wildcard_type_name {
                continue;
            }
            if let Some(bucket) = self.existing_bucket(type_name) {
                bucket.collect_interested(transition, ordinal, &mut matched);
            }
        }
        self.wildcard.collect_interested(transition, ordinal, &mut matched);

        let watchers: Vec<_> = matched
            .into_vec()
            .into_iter()
            .filter(|watcher| watcher.claim_delivery())
            .collect();

        if self.config.enable_metrics {
            MATCH_SCAN_DURATION.observe(started.elapsed().as_micros() as f64);
            MATCHED_WATCHERS
                .with_label_values(&[transition.kind().as_str()])
                .inc_by(watchers.len() as u64);
        }
        trace!(
            ordinal,
            kind = %transition.kind(),
            type_name = entry.type_name(),
            matched = watchers.len(),
            "Transition matched"
        );

        Ok(watchers)
    }

    /// Expires every watcher whose lease ran out as of `now` and prunes the
    /// template groups left empty.
    ///
    /// Buckets are snapshotted first, so matching is never blocked for longer
    /// than one template group's scan.
    pub fn reap_all(
        &self,
        now: SystemTime,
    ) -> ReapStats {
        let buckets: Vec<_> = self.buckets.iter().map(|entry| Arc::clone(entry.value())).collect();

        let mut stats = ReapStats::default();
        for bucket in buckets.iter().chain(std::iter::once(&self.wildcard)) {
            stats += bucket.reap(now);
        }

        if self.config.enable_metrics {
            REAPED_WATCHERS.inc_by(stats.watchers_reaped as u64);
            PRUNED_TEMPLATE_GROUPS.inc_by(stats.groups_pruned as u64);
        }
        if stats.watchers_reaped > 0 || stats.groups_pruned > 0 {
            debug!(
                watchers_reaped = stats.watchers_reaped,
                groups_pruned = stats.groups_pruned,
                "Reap pass finished"
            );
        }

        stats
    }

    pub fn stats(&self) -> DispatcherStats {
        let buckets: Vec<_> = self.buckets.iter().map(|entry| Arc::clone(entry.value())).collect();

        let mut stats = DispatcherStats {
            buckets: buckets.len(),
            ..Default::default()
        };
        for bucket in buckets.iter().chain(std::iter::once(&self.wildcard)) {
            stats.groups += bucket.group_count();
            stats.watchers += bucket.watcher_count();
        }
        stats
    }

    /// Highest transition ordinal seen so far, 0 before the first match
    pub fn last_ordinal(&self) -> u64 {
        self.last_ordinal.load(Ordering::Acquire)
    }
}

impl<P: Payload> Default for TransitionDispatcher<P> {
    fn default() -> Self {
        Self::new(DispatchConfig::default())
    }
}

impl<P: Payload> fmt::Debug for TransitionDispatcher<P> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("TransitionDispatcher")
            .field("buckets", &self.buckets.len())
            .field("last_ordinal", &self.last_ordinal())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
