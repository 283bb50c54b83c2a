use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

/// Monotonic ordinal minting.
///
/// The write path mints one ordinal per observable transition and the
/// registration surface mints one per watcher. Ordinals start at 1; 0 is
/// reserved and rejected by the dispatcher.
#[derive(Debug)]
pub struct OrdinalSource {
    next: AtomicU64,
}

impl OrdinalSource {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Resume minting after a restart, e.g. from the highest ordinal seen.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first.max(1)),
        }
    }

    /// Returns the next ordinal. Strictly increasing across all callers.
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// The ordinal the next call to [`OrdinalSource::next`] will return.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

impl Default for OrdinalSource {
    fn default() -> Self {
        Self::new()
    }
}
