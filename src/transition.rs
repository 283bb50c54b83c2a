//! Entries, templates and the transitions that move them through the space.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::registry::Handle;

/// An entry or template value matched by the engine.
///
/// Payloads are owned by the storage layer and never mutated here. Type
/// hierarchy is precomputed: `super_type_names` lists every supertype, most
/// specific first, so dispatch never needs runtime type inspection.
///
/// Equality and hashing must follow matching semantics: two templates that
/// match exactly the same entries should compare equal, so that they share a
/// single template group.
pub trait Payload: Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Exact type name of this payload
    fn type_name(&self) -> &str;

    /// Every supertype name, most specific first
    fn super_type_names(&self) -> &[String];

    /// Whether `self`, acting as a template, matches `entry`.
    fn matches(
        &self,
        entry: &Self,
    ) -> bool;
}

/// Kind of observable change an entry went through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    /// Entry was written and became visible
    Arrival,
    /// Entry was taken, cancelled or expired
    Departure,
    /// Entry visibility changed, e.g. a transaction committed or released a lock
    VisibilityChange,
}

impl TransitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::Arrival => "arrival",
            TransitionKind::Departure => "departure",
            TransitionKind::VisibilityChange => "visibility_change",
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observable transition of one entry.
///
/// The ordinal is minted by the write path at the moment the transition
/// becomes externally observable and is the single source of truth for
/// happened-before between transitions.
pub struct EntryTransition<P> {
    entry: Arc<Handle<P>>,
    kind: TransitionKind,
    ordinal: u64,
}

impl<P: Payload> EntryTransition<P> {
    pub fn new(
        entry: Arc<Handle<P>>,
        kind: TransitionKind,
        ordinal: u64,
    ) -> Self {
        Self {
            entry,
            kind,
            ordinal,
        }
    }

    pub fn handle(&self) -> &Arc<Handle<P>> {
        &self.entry
    }

    pub fn entry(&self) -> &P {
        self.entry.payload()
    }

    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }
}

impl<P> Clone for EntryTransition<P> {
    fn clone(&self) -> Self {
        Self {
            entry: Arc::clone(&self.entry),
            kind: self.kind,
            ordinal: self.ordinal,
        }
    }
}

impl<P: fmt::Debug> fmt::Debug for EntryTransition<P> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("EntryTransition")
            .field("entry", self.entry.payload())
            .field("kind", &self.kind)
            .field("ordinal", &self.ordinal)
            .finish()
    }
}
