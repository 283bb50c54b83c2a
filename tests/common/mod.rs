use std::sync::Arc;
use std::sync::Mutex;

use space_notify::ordinal::OrdinalSource;
use space_notify::registry::ConcurrentRegistry;
use space_notify::EntryTransition;
use space_notify::Payload;
use space_notify::RemovalCause;
use space_notify::TransitionKind;

pub const ANY_TYPE: &str = "*";

/// Tuple with positional fields. As a template, a `None` field matches any
/// value and the `*` type matches every tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tuple {
    type_name: String,
    super_types: Vec<String>,
    fields: Vec<Option<String>>,
}

impl Tuple {
    pub fn new(
        type_name: &str,
        fields: &[Option<&str>],
    ) -> Self {
        Self {
            type_name: type_name.to_string(),
            super_types: Vec::new(),
            fields: fields.iter().map(|f| f.map(str::to_string)).collect(),
        }
    }

    pub fn any() -> Self {
        Self::new(ANY_TYPE, &[])
    }

    pub fn extends(
        mut self,
        super_types: &[&str],
    ) -> Self {
        self.super_types = super_types.iter().map(|s| s.to_string()).collect();
        self
    }
}

impl Payload for Tuple {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn super_type_names(&self) -> &[String] {
        &self.super_types
    }

    fn matches(
        &self,
        entry: &Self,
    ) -> bool {
        if self.type_name == ANY_TYPE {
            return true;
        }
        let type_ok = self.type_name == entry.type_name || entry.super_types.contains(&self.type_name);
        type_ok
            && self.fields.len() <= entry.fields.len()
            && self
                .fields
                .iter()
                .zip(&entry.fields)
                .all(|(want, have)| want.is_none() || want == have)
    }
}

/// Minimal write path: stores tuples and mints transition ordinals.
#[derive(Default)]
pub struct Space {
    entries: ConcurrentRegistry<Tuple>,
    ordinals: OrdinalSource,
}

impl Space {
    pub fn write(
        &self,
        tuple: Tuple,
    ) -> EntryTransition<Tuple> {
        let handle = self.entries.add(tuple);
        EntryTransition::new(handle, TransitionKind::Arrival, self.ordinals.next())
    }

    pub fn take(
        &self,
        written: &EntryTransition<Tuple>,
    ) -> Option<EntryTransition<Tuple>> {
        if !self.entries.remove(written.handle()) {
            return None;
        }
        Some(EntryTransition::new(
            Arc::clone(written.handle()),
            TransitionKind::Departure,
            self.ordinals.next(),
        ))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Collects removal callbacks fired by watchers.
#[derive(Clone, Default)]
pub struct RemovalLog {
    events: Arc<Mutex<Vec<(u64, RemovalCause)>>>,
}

impl RemovalLog {
    pub fn recorder(&self) -> impl FnOnce(u64, RemovalCause) + Send + 'static {
        let events = Arc::clone(&self.events);
        move |ordinal, cause| events.lock().unwrap().push((ordinal, cause))
    }

    pub fn events(&self) -> Vec<(u64, RemovalCause)> {
        let mut events = self.events.lock().unwrap().clone();
        events.sort_by_key(|(ordinal, _)| *ordinal);
        events
    }
}
