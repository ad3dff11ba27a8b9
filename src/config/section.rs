//! Config sections and their entry tables

use indexmap::IndexMap;

use super::value::ValueCell;

/// Named group of entries with an optional parent to inherit from
#[derive(Debug, Clone)]
pub struct Section {
    name: String,
    parent: Option<String>,
    entries: IndexMap<String, ValueCell>,
}

impl Section {
    pub fn new(name: impl Into<String>, parent: Option<String>) -> Self {
        Self {
            name: name.into(),
            parent,
            entries: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub(crate) fn set_parent(&mut self, parent: Option<String>) {
        self.parent = parent;
    }

    pub fn get(&self, key: &str) -> Option<&ValueCell> {
        self.entries.get(key)
    }

    pub(crate) fn get_full(&self, key: &str) -> Option<(usize, &ValueCell)> {
        self.entries.get_full(key).map(|(index, _, cell)| (index, cell))
    }

    pub(crate) fn get_index(&self, index: usize) -> Option<&ValueCell> {
        self.entries.get_index(index).map(|(_, cell)| cell)
    }

    pub(crate) fn get_index_mut(&mut self, index: usize) -> Option<&mut ValueCell> {
        self.entries.get_index_mut(index).map(|(_, cell)| cell)
    }

    /// Store a value. An existing entry is dropped first, so the key always
    /// moves to the end of the iteration order.
    pub fn insert(&mut self, key: impl Into<String>, cell: ValueCell) {
        let key = key.into();
        self.entries.shift_remove(&key);
        self.entries.insert(key, cell);
    }

    pub fn remove(&mut self, key: &str) -> Option<ValueCell> {
        self.entries.shift_remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Entries in insertion order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ValueCell)> {
        self.entries.iter().map(|(key, cell)| (key.as_str(), cell))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
