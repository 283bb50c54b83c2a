use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Weak;
use std::time::Duration;
use std::time::SystemTime;

use parking_lot::Mutex;
use tracing::trace;

use super::AnyTransition;
use super::DeliveryPolicy;
use super::Interest;
use super::RemovalCause;
use super::WatcherState;
use crate::registry::Handle;
use crate::time::from_millis;
use crate::time::to_millis;
use crate::time::NEVER_EXPIRES;
use crate::EntryTransition;
use crate::Payload;
use crate::TemplateGroup;

type RemovalCallback = Box<dyn FnOnce(u64, RemovalCause) + Send>;

/// Link from a watcher to one template group it was added to.
struct Membership<P: Payload> {
    group: Weak<TemplateGroup<P>>,
    handle: Weak<Handle<Arc<Watcher<P>>>>,
}

pub(crate) enum LinkOutcome {
    Linked,
    AlreadyLinked,
    Inactive,
}

/// One registered client interest.
///
/// Watchers are ordered by their ordinal, which the registration surface
/// mints strictly increasing per registration. The lease expiration is held
/// as milliseconds since the Unix epoch and may be renewed at any time by the
/// lease manager; reaping reads it.
pub struct Watcher<P: Payload> {
    ordinal: u64,
    expiration_ms: AtomicU64,
    policy: DeliveryPolicy,
    state: AtomicU8,
    interest: Box<dyn Interest<P>>,
    memberships: Mutex<Vec<Membership<P>>>,
    on_removed: Mutex<Option<RemovalCallback>>,
}

impl<P: Payload> Watcher<P> {
    pub fn builder(ordinal: u64) -> WatcherBuilder<P> {
        WatcherBuilder {
            ordinal,
            expiration_ms: NEVER_EXPIRES,
            policy: DeliveryPolicy::default(),
            interest: Box::new(AnyTransition),
            on_removed: None,
        }
    }

    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    pub fn policy(&self) -> DeliveryPolicy {
        self.policy
    }

    pub fn state(&self) -> WatcherState {
        WatcherState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_active(&self) -> bool {
        self.state() == WatcherState::Active
    }

    /// Lease expiration, `None` for a watcher that never expires
    pub fn expiration(&self) -> Option<SystemTime> {
        from_millis(self.expiration_ms.load(Ordering::Acquire))
    }

    /// Moves the lease expiration. Takes effect at the next reap.
    pub fn renew(
        &self,
        expiration: SystemTime,
    ) {
        self.expiration_ms.store(to_millis(expiration), Ordering::Release);
    }

    pub fn is_expired(
        &self,
        now: SystemTime,
    ) -> bool {
        self.expiration_ms.load(Ordering::Acquire) <= to_millis(now)
    }

    pub fn is_interested(
        &self,
        transition: &EntryTransition<P>,
        ordinal: u64,
    ) -> bool {
        self.interest.is_interested(transition, ordinal)
    }

    /// Number of template groups this watcher is currently linked to
    pub fn group_count(&self) -> usize {
        self.memberships.lock().len()
    }

    /// Explicit cancellation. Immediate and idempotent; returns `true` only
    /// for the call that cancelled the watcher.
    pub fn cancel(&self) -> bool {
        self.terminate(RemovalCause::Cancelled)
    }

    /// Expires the watcher if its lease has run out as of `now`.
    ///
    /// The lease is re-read here, so a renewal that lands between a reap scan
    /// and this call keeps the watcher alive.
    pub fn expire_if_due(
        &self,
        now: SystemTime,
    ) -> bool {
        self.is_expired(now) && self.terminate(RemovalCause::Expired)
    }

    /// Claims the watcher for delivery of one matching transition.
    ///
    /// Repeat watchers are claimable while active. One-shot watchers are
    /// claimed at most once, by whichever caller wins the state transition,
    /// and are detached from every group as part of the claim.
    pub fn claim_delivery(&self) -> bool {
        match self.policy {
            DeliveryPolicy::Repeat => self.is_active(),
            DeliveryPolicy::OneShot => self.terminate(RemovalCause::Delivered),
        }
    }

    fn terminate(
        &self,
        cause: RemovalCause,
    ) -> bool {
        let target = cause.terminal_state() as u8;
        if self
            .state
            .compare_exchange(
                WatcherState::Active as u8,
                target,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return false;
        }

        let memberships = std::mem::take(&mut *self.memberships.lock());
        for membership in &memberships {
            if let Some(handle) = membership.handle.upgrade() {
                handle.remove();
            }
        }

        trace!(
            watcher = self.ordinal,
            %cause,
            groups = memberships.len(),
            "Watcher detached"
        );

        let callback = self.on_removed.lock().take();
        if let Some(callback) = callback {
            callback(self.ordinal, cause);
        }
        true
    }

    /// Records membership in `group`, adding the watcher to the group's
    /// registry through `add` only if the watcher is active and not already
    /// a member.
    pub(crate) fn link(
        &self,
        group: &Arc<TemplateGroup<P>>,
        add: impl FnOnce() -> Arc<Handle<Arc<Watcher<P>>>>,
    ) -> LinkOutcome {
        let mut memberships = self.memberships.lock();

        // Checked under the membership lock: terminate flips the state before
        // it drains, so a link that observes Active is always drained.
        if !self.is_active() {
            return LinkOutcome::Inactive;
        }
        if memberships.iter().any(|m| std::ptr::eq(m.group.as_ptr(), Arc::as_ptr(group))) {
            return LinkOutcome::AlreadyLinked;
        }

        let handle = add();
        memberships.push(Membership {
            group: Arc::downgrade(group),
            handle: Arc::downgrade(&handle),
        });
        LinkOutcome::Linked
    }

    /// Drops membership in `group`. Returns `true` if a membership was removed.
    pub(crate) fn unlink(
        &self,
        group: &TemplateGroup<P>,
    ) -> bool {
        let removed = {
            let mut memberships = self.memberships.lock();
            memberships
                .iter()
                .position(|m| std::ptr::eq(m.group.as_ptr(), group))
                .map(|index| memberships.swap_remove(index))
        };

        match removed {
            Some(membership) => {
                if let Some(handle) = membership.handle.upgrade() {
                    handle.remove();
                }
                true
            }
            None => false,
        }
    }
}

/// Watchers compare by identity. Ordering is by ordinal, with ties between
/// distinct watchers broken by address.
impl<P: Payload> PartialEq for Watcher<P> {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        std::ptr::eq(self, other)
    }
}

impl<P: Payload> Eq for Watcher<P> {}

impl<P: Payload> PartialOrd for Watcher<P> {
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl<P: Payload> Ord for Watcher<P> {
    fn cmp(
        &self,
        other: &Self,
    ) -> CmpOrdering {
        self.ordinal
            .cmp(&other.ordinal)
            .then_with(|| (self as *const Self as usize).cmp(&(other as *const Self as usize)))
    }
}

impl<P: Payload> fmt::Debug for Watcher<P> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("ordinal", &self.ordinal)
            .field("state", &self.state())
            .field("policy", &self.policy)
            .field("expiration", &self.expiration())
            .finish_non_exhaustive()
    }
}

pub struct WatcherBuilder<P: Payload> {
    ordinal: u64,
    expiration_ms: u64,
    policy: DeliveryPolicy,
    interest: Box<dyn Interest<P>>,
    on_removed: Option<RemovalCallback>,
}

impl<P: Payload> WatcherBuilder<P> {
    pub fn interest(
        mut self,
        interest: impl Interest<P> + 'static,
    ) -> Self {
        self.interest = Box::new(interest);
        self
    }

    pub fn expires_at(
        mut self,
        expiration: SystemTime,
    ) -> Self {
        self.expiration_ms = to_millis(expiration);
        self
    }

    /// Lease of `duration` starting now
    pub fn lease(
        self,
        duration: Duration,
    ) -> Self {
        match SystemTime::now().checked_add(duration) {
            Some(expiration) => self.expires_at(expiration),
            None => self,
        }
    }

    pub fn policy(
        mut self,
        policy: DeliveryPolicy,
    ) -> Self {
        self.policy = policy;
        self
    }

    /// Callback fired exactly once, after the watcher left every group.
    pub fn on_removed(
        mut self,
        callback: impl FnOnce(u64, RemovalCause) + Send + 'static,
    ) -> Self {
        self.on_removed = Some(Box::new(callback));
        self
    }

    pub fn build(self) -> Arc<Watcher<P>> {
        Arc::new(Watcher {
            ordinal: self.ordinal,
            expiration_ms: AtomicU64::new(self.expiration_ms),
            policy: self.policy,
            state: AtomicU8::new(WatcherState::Active as u8),
            interest: self.interest,
            memberships: Mutex::new(Vec::new()),
            on_removed: Mutex::new(self.on_removed),
        })
    }
}
