//! The normalized store and the patches merged into it.
//!
//! Collections are held behind an [`Arc`], so cloning a [`Store`] is cheap
//! and a transform that leaves a collection alone hands the very same
//! allocation to the next store. Readers of the previous store are never
//! affected by a later transform.

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::sync::Arc;

/// An ordered, shared sequence of entities.
pub type Collection = Arc<Vec<Value>>;

/// Mapping from collection name to its entities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Store {
    collections: BTreeMap<String, Collection>,
}

impl Store {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a store from a JSON object of arrays.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Builder-style insert, handy for fixtures.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, entities: Vec<Value>) -> Self {
        self.insert(name, entities);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    /// Entities of a collection, empty when the collection is absent.
    pub fn entities(&self, name: &str) -> &[Value] {
        self.collections
            .get(name)
            .map(|entities| entities.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Replaces a collection with freshly built content.
    pub fn insert(&mut self, name: impl Into<String>, entities: Vec<Value>) {
        self.collections.insert(name.into(), Arc::new(entities));
    }

    pub fn remove(&mut self, name: &str) -> Option<Collection> {
        self.collections.remove(name)
    }

    /// Keeps only the collections for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.collections.retain(|name, _| keep(name));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Collection> {
        self.collections.iter()
    }

    /// Number of collections.
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Encodes the store as a JSON object of arrays.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// A partial, store-shaped payload: collection name to raw entities.
///
/// Raw entities may still embed records that belong to other collections;
/// the normalizer peels those out during a merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Patch {
    entries: BTreeMap<String, Vec<Value>>,
}

/// Patch values arrive either as arrays or as a single record.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Value>),
    One(Value),
}

impl From<OneOrMany> for Vec<Value> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::Many(entities) => entities,
            OneOrMany::One(Value::Null) => Vec::new(),
            OneOrMany::One(entity) => vec![entity],
        }
    }
}

impl<'de> Deserialize<'de> for Patch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = BTreeMap::<String, OneOrMany>::deserialize(deserializer)?;
        Ok(Self {
            entries: raw.into_iter().map(|(name, value)| (name, value.into())).collect(),
        })
    }
}

impl Patch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a patch from a JSON object. A single record under a key is
    /// promoted to a one-element array.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::InvalidPatch("patch must be a JSON object".into()));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, entities: Vec<Value>) -> Self {
        self.insert(name, entities);
        self
    }

    /// Sets the entities for a collection, replacing earlier ones.
    pub fn insert(&mut self, name: impl Into<String>, entities: Vec<Value>) {
        self.entries.insert(name.into(), entities);
    }

    pub fn get(&self, name: &str) -> Option<&[Value]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Vec<Value>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Patch {
    type Item = (String, Vec<Value>);
    type IntoIter = btree_map::IntoIter<String, Vec<Value>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Patch {
    type Item = (&'a String, &'a Vec<Value>);
    type IntoIter = btree_map::Iter<'a, String, Vec<Value>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
