//! # Entity Registry Snapshot
//!
//! The read-only alias index consumed by the query planner. Derived once
//! from the graph store at load time; the planner never touches the store
//! itself.

use crate::types::{EntityId, EntityKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One registry entry: the entity an alias resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub id: EntityId,
    pub canonical_name: String,
    pub kind: EntityKind,
}

/// Read-only mapping from lowercased alias to entity record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    entries: BTreeMap<String, RegistryEntry>,
}

impl RegistrySnapshot {
    #[must_use]
    pub fn new(entries: BTreeMap<String, RegistryEntry>) -> Self {
        Self { entries }
    }

    /// Case-insensitive lookup.
    #[must_use]
    pub fn lookup(&self, alias: &str) -> Option<&RegistryEntry> {
        self.entries.get(&alias.to_lowercase())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
