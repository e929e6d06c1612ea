//! The Identities table: declared type name to value shape.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::elem::Elem;

/// Mapping from top-level type name to its IR node, in insertion order.
///
/// Order is kept so that output is deterministic; it carries no meaning
/// beyond that.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identities {
    entries: IndexMap<String, Elem>,
}

impl Identities {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an identity, returning the previous node.
    pub fn insert(&mut self, name: impl Into<String>, elem: impl Into<Elem>) -> Option<Elem> {
        self.entries.insert(name.into(), elem.into())
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, elem: impl Into<Elem>) -> Self {
        self.insert(name, elem);
        self
    }

    /// Look up an identity by name.
    pub fn get(&self, name: &str) -> Option<&Elem> {
        self.entries.get(name)
    }

    /// Iterate identities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Elem)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of identities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Identities {
    type Item = (String, Elem);
    type IntoIter = indexmap::map::IntoIter<String, Elem>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, Elem)> for Identities {
    fn from_iter<I: IntoIterator<Item = (String, Elem)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
