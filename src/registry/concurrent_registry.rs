//! Insertion-ordered concurrent collection with logical removal
//!
//! # Storage
//!
//! Handles live in an append-only list of immutable chunks followed by a
//! short mutable tail:
//!
//! ```text
//! sealed: [chunk 0][chunk 1] ... [chunk k]   tail: [h h h]
//!          Arc<[Arc<Handle>]>, never mutated   < CHUNK_CAPACITY
//! ```
//!
//! # Concurrency Model
//!
//! - **add**: O(1) amortised, short exclusive section; a full tail is sealed
//!   into a new chunk
//! - **remove**: lock-free, single compare-and-set on the handle
//! - **iter**: copies chunk pointers and the tail under a shared lock, removal
//!   flag re-checked at yield time (weakly consistent)
//! - **reap**: seals the tail and copies chunk pointers under the lock,
//!   filters every handle with no lock held, then swaps the compacted chunks
//!   in for the scanned prefix
//!
//! Lock sections are O(chunks), never O(handles). Reaps are serialised, and
//! nothing else removes chunks, so the prefix scanned by a reap is exactly
//! the prefix it replaces.

use std::fmt;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use parking_lot::RwLock;
use tracing::trace;

use super::Handle;

pub(crate) const CHUNK_CAPACITY: usize = 64;

type Chunk<T> = Arc<[Arc<Handle<T>>]>;

struct Slots<T> {
    sealed: Vec<Chunk<T>>,
    tail: Vec<Arc<Handle<T>>>,
}

impl<T> Slots<T> {
    fn seal_tail(&mut self) {
        if !self.tail.is_empty() {
            let tail = std::mem::replace(&mut self.tail, Vec::with_capacity(CHUNK_CAPACITY));
            self.sealed.push(Chunk::from(tail));
        }
    }
}

pub(crate) struct RegistryShared<T> {
    slots: RwLock<Slots<T>>,
    live: AtomicUsize,
    /// Logically removed but still linked. Signed because a reap may discard
    /// a handle between its flag flip and its counter update.
    pending: AtomicI64,
    next_seq: AtomicU64,
    reap_lock: Mutex<()>,
}

impl<T> RegistryShared<T> {
    pub(super) fn record_removal(&self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
        self.pending.fetch_add(1, Ordering::AcqRel);
    }
}

/// Thread-safe, insertion-ordered set of [`Handle`]s.
pub struct ConcurrentRegistry<T> {
    shared: Arc<RegistryShared<T>>,
}

impl<T> ConcurrentRegistry<T> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(RegistryShared {
                slots: RwLock::new(Slots {
                    sealed: Vec::new(),
                    tail: Vec::with_capacity(CHUNK_CAPACITY),
                }),
                live: AtomicUsize::new(0),
                pending: AtomicI64::new(0),
                next_seq: AtomicU64::new(0),
                reap_lock: Mutex::new(()),
            }),
        }
    }

    /// Places `payload` into the registry and returns its handle.
    ///
    /// The handle is fully built before it becomes reachable by iterators.
    pub fn add(
        &self,
        payload: T,
    ) -> Arc<Handle<T>> {
        let seq = self.shared.next_seq.fetch_add(1, Ordering::Relaxed);
        let handle = Arc::new(Handle::new(payload, seq, Arc::downgrade(&self.shared)));

        self.shared.live.fetch_add(1, Ordering::AcqRel);
        {
            let mut slots = self.shared.slots.write();
            slots.tail.push(Arc::clone(&handle));
            if slots.tail.len() >= CHUNK_CAPACITY {
                slots.seal_tail();
            }
        }

        handle
    }

    /// Removes `handle` if it belongs to this registry.
    ///
    /// Idempotent. Returns `true` only for the call that performed the
    /// removal; handles owned by another registry are left untouched.
    pub fn remove(
        &self,
        handle: &Handle<T>,
    ) -> bool {
        if !handle.is_owned_by(&self.shared) {
            return false;
        }
        handle.remove()
    }

    /// Weakly consistent iterator over live handles in insertion order.
    pub fn iter(&self) -> RegistryIter<T> {
        let (sealed, tail) = {
            let slots = self.shared.slots.read();
            (slots.sealed.clone(), slots.tail.clone())
        };
        RegistryIter {
            chunks: sealed.into_iter(),
            current: None,
            position: 0,
            tail: tail.into_iter(),
        }
    }

    /// Physically discards logically removed handles.
    ///
    /// Never holds the slot lock while scanning handles, so concurrent `add`
    /// and `iter` calls wait at most for a copy of the chunk list.
    /// Returns the number of handles discarded by this call.
    pub fn reap(&self) -> usize {
        let _serialised = self.shared.reap_lock.lock();

        if self.shared.pending.load(Ordering::Acquire) <= 0 {
            return 0;
        }

        let scanned: Vec<Chunk<T>> = {
            let mut slots = self.shared.slots.write();
            slots.seal_tail();
            slots.sealed.clone()
        };

        let mut compacted = Vec::new();
        let mut current: Vec<Arc<Handle<T>>> = Vec::with_capacity(CHUNK_CAPACITY);
        let mut total = 0;
        for chunk in &scanned {
            total += chunk.len();
            for handle in chunk.iter().filter(|h| !h.is_removed()) {
                current.push(Arc::clone(handle));
                if current.len() == CHUNK_CAPACITY {
                    let full = std::mem::replace(&mut current, Vec::with_capacity(CHUNK_CAPACITY));
                    compacted.push(Chunk::from(full));
                }
            }
        }
        if !current.is_empty() {
            compacted.push(Chunk::from(current));
        }
        let kept: usize = compacted.iter().map(|chunk| chunk.len()).sum();
        let discarded = total - kept;

        {
            let mut slots = self.shared.slots.write();
            let appended = slots.sealed.split_off(scanned.len());
            slots.sealed = compacted;
            slots.sealed.extend(appended);
        }

        self.shared.pending.fetch_sub(discarded as i64, Ordering::AcqRel);

        trace!(scanned = total, discarded, "registry reaped");
        discarded
    }

    /// Live (not logically removed) handles
    pub fn len(&self) -> usize {
        self.shared.live.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handles removed but not yet discarded by [`ConcurrentRegistry::reap`]
    pub fn pending_reap(&self) -> usize {
        self.shared.pending.load(Ordering::Acquire).max(0) as usize
    }

    #[cfg(test)]
    pub(crate) fn chunk_count(&self) -> usize {
        self.shared.slots.read().sealed.len()
    }
}

impl<T> Default for ConcurrentRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ConcurrentRegistry<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ConcurrentRegistry")
            .field("live", &self.len())
            .field("pending_reap", &self.pending_reap())
            .finish_non_exhaustive()
    }
}

/// Iterator returned by [`ConcurrentRegistry::iter`].
///
/// Never yields a handle whose removal completed before the handle is reached.
pub struct RegistryIter<T> {
    chunks: std::vec::IntoIter<Chunk<T>>,
    current: Option<Chunk<T>>,
    position: usize,
    tail: std::vec::IntoIter<Arc<Handle<T>>>,
}

impl<T> RegistryIter<T> {
    fn next_in_chunks(&mut self) -> Option<Arc<Handle<T>>> {
        loop {
            if let Some(chunk) = &self.current {
                if let Some(handle) = chunk.get(self.position) {
                    self.position += 1;
                    return Some(Arc::clone(handle));
                }
            }
            self.current = Some(self.chunks.next()?);
            self.position = 0;
        }
    }
}

impl<T> Iterator for RegistryIter<T> {
    type Item = Arc<Handle<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(handle) = self.next_in_chunks() {
            if !handle.is_removed() {
                return Some(handle);
            }
        }
        self.tail.by_ref().find(|handle| !handle.is_removed())
    }
}
