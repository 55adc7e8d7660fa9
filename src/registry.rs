// src/registry.rs
//! Ordered registries shared by every connection of a server.
//!
//! Entries are kept sorted by key (byte-wise). Equal keys keep their
//! arrival order: a new entry goes after every existing entry with the
//! same key.

use parking_lot::Mutex;
use std::sync::Arc;

/// A record stored in a [`Registry`].
pub trait Entry: Clone + Send + 'static {
    /// Sort and lookup key.
    fn key(&self) -> &str;
}

/// Directory entry: an airport id and the port its control listens on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Airport {
    pub id: String,
    pub port: String,
}

impl Airport {
    pub fn new(id: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            port: port.into(),
        }
    }
}

impl Entry for Airport {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Log entry: one visit by an aircraft. The same aircraft may appear many
/// times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    pub aircraft: String,
}

impl Visit {
    pub fn new(aircraft: impl Into<String>) -> Self {
        Self {
            aircraft: aircraft.into(),
        }
    }
}

impl Entry for Visit {
    fn key(&self) -> &str {
        &self.aircraft
    }
}

/// Sorted sequence of entries.
///
/// Not synchronized on its own; servers wrap it in a [`SharedRegistry`].
#[derive(Debug, Clone)]
pub struct Registry<E> {
    entries: Vec<E>,
}

/// The single lock-guarded registry a server hands to all its handlers.
pub type SharedRegistry<E> = Arc<Mutex<Registry<E>>>;

impl<E: Entry> Registry<E> {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create an empty registry already wrapped for sharing.
    pub fn shared() -> SharedRegistry<E> {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Index of the first entry with `key`, if any.
    pub fn find(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.key() == key)
    }

    /// First entry with `key`, if any.
    pub fn get(&self, key: &str) -> Option<&E> {
        self.find(key).map(|i| &self.entries[i])
    }

    /// Insert keeping keys non-decreasing; returns the index used.
    ///
    /// The entry lands before the first strictly greater key, so it follows
    /// any entries whose key is equal.
    pub fn insert_ordered(&mut self, entry: E) -> usize {
        let at = self
            .entries
            .partition_point(|e| e.key().as_bytes() <= entry.key().as_bytes());
        self.entries.insert(at, entry);
        at
    }

    /// Insert unless the key is already present. An existing entry is never
    /// updated.
    pub fn insert_if_absent(&mut self, entry: E) -> bool {
        if self.find(entry.key()).is_some() {
            return false;
        }
        self.insert_ordered(entry);
        true
    }

    /// Copy of the full ordered contents.
    pub fn snapshot_all(&self) -> Vec<E> {
        self.entries.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E: Entry> Default for Registry<E> {
    fn default() -> Self {
        Self::new()
    }
}
