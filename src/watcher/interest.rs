use std::collections::HashSet;

#[cfg(test)]
use mockall::automock;

use crate::EntryTransition;
use crate::Payload;
use crate::TransitionKind;

/// Relevance predicate of one registered interest.
///
/// Called from many dispatch threads at once, under a template group's
/// shared lock. Implementations must be cheap and must not call back into
/// the dispatcher.
#[cfg_attr(test, automock)]
pub trait Interest<P: Payload>: Send + Sync {
    fn is_interested(
        &self,
        transition: &EntryTransition<P>,
        ordinal: u64,
    ) -> bool;
}

/// Adapts a closure into an [`Interest`].
pub struct InterestFn<F>(pub F);

impl<P, F> Interest<P> for InterestFn<F>
where
    P: Payload,
    F: Fn(&EntryTransition<P>, u64) -> bool + Send + Sync,
{
    fn is_interested(
        &self,
        transition: &EntryTransition<P>,
        ordinal: u64,
    ) -> bool {
        (self.0)(transition, ordinal)
    }
}

/// Interested in every transition the template matches.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnyTransition;

impl<P: Payload> Interest<P> for AnyTransition {
    fn is_interested(
        &self,
        _transition: &EntryTransition<P>,
        _ordinal: u64,
    ) -> bool {
        true
    }
}

/// Interested only in the listed transition kinds, e.g. arrivals for a
/// notify-style registration or departures for a take waiter.
#[derive(Debug, Clone)]
pub struct KindFilter {
    kinds: HashSet<TransitionKind>,
}

impl KindFilter {
    pub fn new(kinds: impl IntoIterator<Item = TransitionKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    pub fn arrivals() -> Self {
        Self::new([TransitionKind::Arrival])
    }
}

impl<P: Payload> Interest<P> for KindFilter {
    fn is_interested(
        &self,
        transition: &EntryTransition<P>,
        _ordinal: u64,
    ) -> bool {
        self.kinds.contains(&transition.kind())
    }
}
