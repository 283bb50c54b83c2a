use crate::ordinal::OrdinalSource;
use crate::registry::ConcurrentRegistry;
use crate::EntryTransition;
use crate::TransitionKind;

use super::TestPayload;

/// Stands in for the space's write path: stores entries and mints one
/// ordinal per transition.
pub struct EntryBuilder {
    store: ConcurrentRegistry<TestPayload>,
    ordinals: OrdinalSource,
}

impl EntryBuilder {
    pub fn new() -> Self {
        Self {
            store: ConcurrentRegistry::new(),
            ordinals: OrdinalSource::new(),
        }
    }

    pub fn arrival(
        &self,
        entry: TestPayload,
    ) -> EntryTransition<TestPayload> {
        let handle = self.store.add(entry);
        EntryTransition::new(handle, TransitionKind::Arrival, self.ordinals.next())
    }

    pub fn departure(
        &self,
        arrived: &EntryTransition<TestPayload>,
    ) -> EntryTransition<TestPayload> {
        arrived.handle().remove();
        EntryTransition::new(
            arrived.handle().clone(),
            TransitionKind::Departure,
            self.ordinals.next(),
        )
    }

    pub fn transition(
        &self,
        entry: TestPayload,
        kind: TransitionKind,
    ) -> EntryTransition<TestPayload> {
        let handle = self.store.add(entry);
        EntryTransition::new(handle, kind, self.ordinals.next())
    }
}

impl Default for EntryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
