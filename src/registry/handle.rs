use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Weak;

use super::concurrent_registry::RegistryShared;

/// A single payload placed into a [`ConcurrentRegistry`](super::ConcurrentRegistry).
///
/// The handle owns exactly one removal right. `remove` is a compare-and-set
/// on the `removed` flag, so among any number of racing callers exactly one
/// observes `true`. Physical unlinking is left to the registry's `reap`.
pub struct Handle<T> {
    payload: T,
    seq: u64,
    removed: AtomicBool,
    owner: Weak<RegistryShared<T>>,
}

impl<T> Handle<T> {
    pub(super) fn new(
        payload: T,
        seq: u64,
        owner: Weak<RegistryShared<T>>,
    ) -> Self {
        Self {
            payload,
            seq,
            removed: AtomicBool::new(false),
            owner,
        }
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Insertion sequence inside the owning registry
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    /// Logically removes the handle from its registry.
    ///
    /// Returns `true` only for the call that performed the removal.
    pub fn remove(&self) -> bool {
        if self
            .removed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        // Registry may already be gone; the flag alone is authoritative.
        if let Some(owner) = self.owner.upgrade() {
            owner.record_removal();
        }
        true
    }

    pub(super) fn is_owned_by(
        &self,
        shared: &Arc<RegistryShared<T>>,
    ) -> bool {
        std::ptr::eq(self.owner.as_ptr(), Arc::as_ptr(shared))
    }
}

impl<T: fmt::Debug> fmt::Debug for Handle<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Handle")
            .field("seq", &self.seq)
            .field("removed", &self.is_removed())
            .field("payload", &self.payload)
            .finish()
    }
}
