//! Specialized collection types

use std::collections::HashMap;

pub use slotmap::{SlotMap, DefaultKey};

/// Handle-based map using slot map for stable references
pub type HandleMap<T> = SlotMap<DefaultKey, T>;

/// Table of records addressed by small integer ids
///
/// Ids start at 1 and are never reused, so 0 stays free to mean "no object"
/// and a stale id held after removal can never alias a newer record. Storage
/// lives in a [`HandleMap`]; the id-to-key index mirrors how graphics APIs
/// hand out integer names for their objects.
#[derive(Debug)]
pub struct ResourceTable<T> {
    records: HandleMap<T>,
    index: HashMap<u32, DefaultKey>,
    next_id: u32,
}

impl<T> ResourceTable<T> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            records: HandleMap::new(),
            index: HashMap::new(),
            next_id: 1,
        }
    }

    /// Insert a record and return its freshly issued id
    pub fn insert(&mut self, record: T) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        let key = self.records.insert(record);
        self.index.insert(id, key);
        id
    }

    /// Remove a record by id
    pub fn remove(&mut self, id: u32) -> Option<T> {
        let key = self.index.remove(&id)?;
        self.records.remove(key)
    }

    /// Get a record by id
    pub fn get(&self, id: u32) -> Option<&T> {
        self.records.get(*self.index.get(&id)?)
    }

    /// Get a mutable record by id
    pub fn get_mut(&mut self, id: u32) -> Option<&mut T> {
        self.records.get_mut(*self.index.get(&id)?)
    }

    /// Whether `id` names a live record
    pub fn contains(&self, id: u32) -> bool {
        self.index.contains_key(&id)
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over live `(id, record)` pairs in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> + '_ {
        self.index
            .iter()
            .filter_map(|(id, key)| self.records.get(*key).map(|record| (*id, record)))
    }
}

impl<T> Default for ResourceTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
