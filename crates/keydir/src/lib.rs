use std::collections::HashMap;

/// Location of a durably written record: which segment holds it, where the
/// record starts, how long its value is, and the timestamp it carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    pub file_id: u64,
    pub value_size: u32,
    pub value_pos: u64,
    pub stamp: u64,
}

/// Keydir slot: either a write still sitting in the pending buffer (no valid
/// file location yet) or a durable record locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Pending { stamp: u64 },
    Durable(Locator),
}

impl Slot {
    pub fn stamp(&self) -> u64 {
        match self {
            Slot::Pending { stamp } => *stamp,
            Slot::Durable(loc) => loc.stamp,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Slot::Pending { .. })
    }
}

/// The in-memory index: every live key mapped to the location of its most
/// recent value. Unordered; sorted key listings are produced on demand.
#[derive(Debug, Default)]
pub struct Keydir {
    map: HashMap<String, Slot>,
}

impl Keydir {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Slot> {
        self.map.get(key)
    }

    /// Insert or replace the slot for `key`.
    pub fn insert(&mut self, key: String, slot: Slot) {
        self.map.insert(key, slot);
    }

    pub fn remove(&mut self, key: &str) -> Option<Slot> {
        self.map.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Slot)> {
        self.map.iter()
    }

    /// All keys, sorted ascending.
    pub fn sorted_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.map.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// A write staged in memory, waiting for the next flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    pub stamp: u64,
    pub value: Vec<u8>,
}

/// Unflushed puts and deletes, keyed by key. A second write for the same key
/// before the buffer drains replaces the first (last-writer-wins).
#[derive(Debug, Default)]
pub struct PendingBuffer {
    map: HashMap<String, PendingWrite>,
}

impl PendingBuffer {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: String, write: PendingWrite) {
        self.map.insert(key, write);
    }

    pub fn get(&self, key: &str) -> Option<&PendingWrite> {
        self.map.get(key)
    }

    /// Empties the buffer, handing the staged writes to the caller.
    pub fn take(&mut self) -> HashMap<String, PendingWrite> {
        std::mem::take(&mut self.map)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
