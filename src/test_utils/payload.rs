use std::collections::BTreeMap;

use crate::Payload;

pub const WILDCARD: &str = "*";

/// Entry/template with a flat field map and a precomputed supertype chain.
///
/// As a template it matches an entry of its own type or of any subtype, when
/// every template field is present on the entry with the same value. The
/// `*` type matches every entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestPayload {
    type_name: String,
    super_types: Vec<String>,
    fields: BTreeMap<String, String>,
}

impl TestPayload {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            super_types: Vec::new(),
            fields: BTreeMap::new(),
        }
    }

    pub fn wildcard() -> Self {
        Self::new(WILDCARD)
    }

    /// Supertypes, most specific first
    pub fn extends(
        mut self,
        super_types: &[&str],
    ) -> Self {
        self.super_types = super_types.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn field(
        mut self,
        name: &str,
        value: &str,
    ) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }
}

impl Payload for TestPayload {
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
        let type_ok = self.type_name == WILDCARD
            || self.type_name == entry.type_name
            || entry.super_types.iter().any(|s| *s == self.type_name);

        type_ok && self.fields.iter().all(|(k, v)| entry.fields.get(k) == Some(v))
    }
}
