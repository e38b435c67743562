//! # Graph Store
//!
//! Loads the three persisted KG artifacts (entities, events, participation
//! edges), validates every structural invariant, and serves constant-time
//! lookups for the rest of the pipeline.
//!
//! The store is built once at startup and read-only afterwards. All maps
//! are `BTreeMap` so iteration order — and therefore every downstream
//! trace and result — is deterministic.

use crate::registry::{RegistryEntry, RegistrySnapshot};
use crate::types::{Entity, EntityId, Event, EventId, ItihasaError, ParticipationEdge};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// =============================================================================
// ARTIFACT PATHS
// =============================================================================

/// Locations of the three persisted artifacts.
#[derive(Debug, Clone)]
pub struct GraphPaths {
    pub entities: PathBuf,
    pub events: PathBuf,
    pub edges: PathBuf,
}

impl GraphPaths {
    /// Conventional layout: `<dir>/entities.json` etc.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            entities: dir.join("entities.json"),
            events: dir.join("events.json"),
            edges: dir.join("edges.json"),
        }
    }
}

// =============================================================================
// GRAPH STORE
// =============================================================================

/// The in-memory event graph.
///
/// Indexes built once at load:
/// 1. entity id → entity
/// 2. lowercased alias → entity id (collisions are a load failure)
/// 3. event id → event
/// 4. entity id → incident event ids, sorted ascending by integer suffix
///
/// The incident index is computed by scanning events; the edge file is
/// validated against it but never drives traversal.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    entities: BTreeMap<EntityId, Entity>,
    alias_index: BTreeMap<String, EntityId>,
    events: BTreeMap<EventId, Event>,
    incident: BTreeMap<EntityId, Vec<EventId>>,
    /// All event ids in narrative order (ascending suffix).
    narrative_order: Vec<EventId>,
    edge_count: usize,
}

impl GraphStore {
    /// Load and validate the three artifacts.
    ///
    /// Every failure here is fatal and happens before any query is
    /// accepted: missing files, malformed records, unknown referenced
    /// ids, alias collisions, duplicate ids, tier/type disagreements.
    pub fn load(paths: &GraphPaths) -> Result<Self, ItihasaError> {
        let entities: Vec<Entity> = read_artifact(&paths.entities)?;
        let events: Vec<Event> = read_artifact(&paths.events)?;
        let edges: Vec<ParticipationEdge> = read_artifact(&paths.edges)?;

        let mut store = Self::from_parts(entities, events)?;
        store.validate_edges(&edges)?;
        store.edge_count = edges.len();

        tracing::info!(
            entities = store.entities.len(),
            events = store.events.len(),
            edges = store.edge_count,
            "graph store loaded"
        );
        Ok(store)
    }

    /// Build a store from already-parsed records. Used by `load` and by
    /// tests that construct small graphs inline.
    pub fn from_parts(entities: Vec<Entity>, events: Vec<Event>) -> Result<Self, ItihasaError> {
        let mut store = Self::default();

        for entity in entities {
            if store.entities.contains_key(&entity.id) {
                return Err(ItihasaError::DuplicateEntity(entity.id));
            }
            // The alias set must cover the canonical name; index both.
            let mut aliases: Vec<String> =
                entity.aliases.iter().map(|a| a.to_lowercase()).collect();
            let canonical = entity.canonical_name.to_lowercase();
            if !aliases.contains(&canonical) {
                aliases.push(canonical);
            }
            for alias in aliases {
                if alias.is_empty() {
                    continue;
                }
                if let Some(existing) = store.alias_index.get(&alias) {
                    if *existing != entity.id {
                        return Err(ItihasaError::AliasCollision {
                            alias,
                            first: existing.clone(),
                            second: entity.id,
                        });
                    }
                } else {
                    store.alias_index.insert(alias, entity.id.clone());
                }
            }
            store.entities.insert(entity.id.clone(), entity);
        }

        let mut ordered: Vec<(u64, EventId)> = Vec::with_capacity(events.len());
        for mut event in events {
            let Some(suffix) = event.id.index() else {
                return Err(ItihasaError::Malformed {
                    path: "events".to_string(),
                    message: format!("event id '{}' does not match E<number>", event.id),
                });
            };
            if store.events.contains_key(&event.id) {
                return Err(ItihasaError::DuplicateEvent(event.id));
            }
            if event.tier != event.event_type.tier() {
                return Err(ItihasaError::Malformed {
                    path: "events".to_string(),
                    message: format!(
                        "event {} tier {} disagrees with type {}",
                        event.id, event.tier, event.event_type
                    ),
                });
            }
            // Participant lists are deduplicated preserving first occurrence.
            let mut seen = Vec::with_capacity(event.participants.len());
            for participant in event.participants {
                if !store.entities.contains_key(&participant) {
                    return Err(ItihasaError::UnknownParticipant {
                        event: event.id,
                        entity: participant,
                    });
                }
                if !seen.contains(&participant) {
                    seen.push(participant);
                }
            }
            if seen.is_empty() {
                return Err(ItihasaError::Malformed {
                    path: "events".to_string(),
                    message: format!("event {} has no participants", event.id),
                });
            }
            event.participants = seen;

            for participant in &event.participants {
                store
                    .incident
                    .entry(participant.clone())
                    .or_default()
                    .push(event.id.clone());
            }
            ordered.push((suffix, event.id.clone()));
            store.events.insert(event.id.clone(), event);
        }

        // Incident lists and the narrative order are sorted by suffix once;
        // no index is rebuilt after load.
        for list in store.incident.values_mut() {
            list.sort_by_key(|id| id.index().unwrap_or(u64::MAX));
            list.dedup();
        }
        ordered.sort();
        store.narrative_order = ordered.into_iter().map(|(_, id)| id).collect();

        Ok(store)
    }

    /// Check the edge file against the event-derived participant lists.
    fn validate_edges(&self, edges: &[ParticipationEdge]) -> Result<(), ItihasaError> {
        for edge in edges {
            if edge.relation != "PARTICIPATED_IN" {
                return Err(ItihasaError::InvalidEdge {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    message: format!("unknown relation '{}'", edge.relation),
                });
            }
            if !self.entities.contains_key(&edge.source) {
                return Err(ItihasaError::InvalidEdge {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    message: "unknown source entity".to_string(),
                });
            }
            let Some(event) = self.events.get(&edge.target) else {
                return Err(ItihasaError::InvalidEdge {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    message: "unknown target event".to_string(),
                });
            };
            if !event.participants.contains(&edge.source) {
                return Err(ItihasaError::InvalidEdge {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    message: "source is not a participant of the target event".to_string(),
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // LOOKUPS
    // =========================================================================

    #[must_use]
    pub fn entity_by_id(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Case-insensitive alias lookup.
    #[must_use]
    pub fn entity_by_alias(&self, alias: &str) -> Option<&EntityId> {
        self.alias_index.get(&alias.to_lowercase())
    }

    #[must_use]
    pub fn event_by_id(&self, id: &EventId) -> Option<&Event> {
        self.events.get(id)
    }

    /// Incident event ids for an entity, ascending by integer suffix.
    /// Unknown entities yield an empty slice.
    #[must_use]
    pub fn events_incident_to(&self, entity: &EntityId) -> &[EventId] {
        self.incident.get(entity).map_or(&[], Vec::as_slice)
    }

    /// Participant ids of an event, order preserved from the record.
    #[must_use]
    pub fn participants_of(&self, event: &EventId) -> &[EntityId] {
        self.events
            .get(event)
            .map_or(&[], |e| e.participants.as_slice())
    }

    /// Every event id in narrative order (ascending suffix).
    #[must_use]
    pub fn events_in_narrative_order(&self) -> &[EventId] {
        &self.narrative_order
    }

    /// All entities in deterministic (id) order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// All events in deterministic (id) order.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Derive the planner's registry snapshot: every lowercased alias
    /// mapped to the entity it names.
    #[must_use]
    pub fn registry_snapshot(&self) -> RegistrySnapshot {
        let mut entries = BTreeMap::new();
        for (alias, id) in &self.alias_index {
            if let Some(entity) = self.entities.get(id) {
                entries.insert(
                    alias.clone(),
                    RegistryEntry {
                        id: entity.id.clone(),
                        canonical_name: entity.canonical_name.clone(),
                        kind: entity.kind,
                    },
                );
            }
        }
        RegistrySnapshot::new(entries)
    }
}

/// Read and parse one artifact file.
fn read_artifact<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, ItihasaError> {
    let text = std::fs::read_to_string(path).map_err(|e| ItihasaError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|e| ItihasaError::Malformed {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

// =============================================================================
// TESTS
// =============================================================================
