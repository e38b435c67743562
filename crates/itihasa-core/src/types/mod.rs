//! # Core Type Definitions
//!
//! Shared types for the Itihasa query core:
//! - Graph identifiers (`EntityId`, `EventId`)
//! - The entity/event ontology (`EntityKind`, `EventType`, `Tier`)
//! - Persisted records (`Entity`, `Event`, `ParticipationEdge`)
//! - Error types (`ItihasaError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Implement `Ord` so they can key `BTreeMap`/`BTreeSet` deterministically
//! - Use integer arithmetic only (no floating-point)
//! - Serialize to stable, self-describing JSON

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Stable identifier for an entity, e.g. `person_karna`.
///
/// Entity ids are opaque strings assigned by the upstream graph builder
/// and globally unique within a loaded graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for EntityId {}

/// Identifier for an event: `E` followed by an integer (`E713`).
///
/// The integer suffix is the canonical narrative order and the only
/// temporal signal in the graph. Ids are validated at load time, so
/// `index()` is infallible on ids that came out of a loaded store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the integer suffix, if the id is well-formed.
    #[must_use]
    pub fn index(&self) -> Option<u64> {
        self.0.strip_prefix('E')?.parse().ok()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// ONTOLOGY
// =============================================================================

/// The five entity kinds produced by the upstream extraction pass.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityKind {
    Person,
    Group,
    Place,
    Time,
    Literal,
}

impl EntityKind {
    /// Disambiguation priority: lower ranks win when surface text is shared.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Person => 0,
            Self::Group => 1,
            Self::Place => 2,
            Self::Time => 3,
            Self::Literal => 4,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Person => "PERSON",
            Self::Group => "GROUP",
            Self::Place => "PLACE",
            Self::Time => "TIME",
            Self::Literal => "LITERAL",
        };
        f.write_str(s)
    }
}

/// Event tier: MACRO events carry the main narrative, MESO events the
/// tactical texture around it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Macro,
    Meso,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Macro => f.write_str("MACRO"),
            Self::Meso => f.write_str("MESO"),
        }
    }
}

/// The closed set of twenty event types (8 MACRO + 12 MESO).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    // MACRO
    Kill,
    Death,
    Battle,
    Command,
    Boon,
    Vow,
    Curse,
    Coronation,
    // MESO
    EngagedInBattle,
    Defeated,
    Protected,
    Pursued,
    Rescued,
    AppointedAs,
    Abandoned,
    Attacked,
    Defended,
    Retreated,
    Surrounded,
    Supported,
}

impl EventType {
    /// The tier is derived from the type; files carry it redundantly and
    /// the loader checks they agree.
    #[must_use]
    pub const fn tier(self) -> Tier {
        match self {
            Self::Kill
            | Self::Death
            | Self::Battle
            | Self::Command
            | Self::Boon
            | Self::Vow
            | Self::Curse
            | Self::Coronation => Tier::Macro,
            _ => Tier::Meso,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Kill => "KILL",
            Self::Death => "DEATH",
            Self::Battle => "BATTLE",
            Self::Command => "COMMAND",
            Self::Boon => "BOON",
            Self::Vow => "VOW",
            Self::Curse => "CURSE",
            Self::Coronation => "CORONATION",
            Self::EngagedInBattle => "ENGAGED_IN_BATTLE",
            Self::Defeated => "DEFEATED",
            Self::Protected => "PROTECTED",
            Self::Pursued => "PURSUED",
            Self::Rescued => "RESCUED",
            Self::AppointedAs => "APPOINTED_AS",
            Self::Abandoned => "ABANDONED",
            Self::Attacked => "ATTACKED",
            Self::Defended => "DEFENDED",
            Self::Retreated => "RETREATED",
            Self::Surrounded => "SURROUNDED",
            Self::Supported => "SUPPORTED",
        };
        f.write_str(s)
    }
}

// =============================================================================
// PERSISTED RECORDS
// =============================================================================

/// An entity record as persisted by the upstream graph builder.
///
/// The alias set always contains the canonical name; alias matching is
/// case-insensitive (both sides lowercased).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub canonical_name: String,
    pub kind: EntityKind,
    /// Incident-event count, used as a popularity tiebreak when ranking.
    pub event_count: u64,
    pub aliases: Vec<String>,
}

/// A narrative occurrence.
///
/// Participants are deduplicated in first-occurrence order; position
/// within the list is what role inference keys on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub tier: Tier,
    pub sentence: String,
    pub participants: Vec<EntityId>,
}

/// A participation relation between an entity and an event.
///
/// Redundant with the event's participant list; the loader validates it
/// for consistency but traversal is driven by the event-derived index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationEdge {
    pub source: EntityId,
    pub relation: String,
    pub target: EventId,
    pub evidence: String,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can surface to a caller of the Itihasa core.
///
/// Only two classes exist: load failures (fatal, before any query is
/// accepted) and internal invariant violations (should be impossible
/// after load validation). Everything else — unresolved seeds, empty
/// matches, role-inference misses — is absorbed into results and traces.
#[derive(Debug, Error)]
pub enum ItihasaError {
    /// A graph artifact could not be read.
    #[error("cannot read {path}: {message}")]
    Io { path: String, message: String },

    /// A graph artifact failed to parse or violated its schema.
    #[error("malformed {path}: {message}")]
    Malformed { path: String, message: String },

    /// Two entities claim the same (lowercased) alias.
    #[error("alias '{alias}' maps to both {first} and {second}")]
    AliasCollision {
        alias: String,
        first: EntityId,
        second: EntityId,
    },

    /// Two event records share one id.
    #[error("duplicate event id {0}")]
    DuplicateEvent(EventId),

    /// Two entity records share one id.
    #[error("duplicate entity id {0}")]
    DuplicateEntity(EntityId),

    /// An event names a participant that is not in the entity set.
    #[error("event {event} references unknown entity {entity}")]
    UnknownParticipant { event: EventId, entity: EntityId },

    /// An edge references an id that does not exist, or a source that is
    /// not among the target event's participants.
    #[error("edge {source} -> {target}: {message}")]
    InvalidEdge {
        source: EntityId,
        target: EventId,
        message: String,
    },

    /// A condition that load validation should have made impossible.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}

// =============================================================================
// TESTS
// =============================================================================
