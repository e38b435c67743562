//! # Innate Bounds
//!
//! Hardcoded runtime constants for the Itihasa query core.
//!
//! Every traversal and every result list is computationally bounded by a
//! constant in this module; nothing here is configurable at runtime.

use crate::types::EventType;

/// Maximum traversal depth for any query strategy.
///
/// FACT plans run at depth 1, every other intent at depth 2. No strategy
/// is ever permitted deeper; the executor checks depth before enqueueing.
pub const MAX_TRAVERSAL_DEPTH: usize = 2;

/// Maximum number of events returned by the TEMPORAL full-graph scan.
///
/// The scan walks every event in narrative order; without this cap an
/// AFTER query anchored early in the corpus would return most of it.
pub const TEMPORAL_SCAN_CAP: usize = 20;

/// Maximum number of events in an `EVENT_LIST` answer payload.
pub const EVENT_LIST_CAP: usize = 5;

/// Maximum number of agents in a FACT `ENTITY` answer payload.
pub const FACT_AGENT_CAP: usize = 2;

/// Maximum number of beneficiaries in a MULTI_HOP `ENTITY` answer payload.
pub const BENEFICIARY_CAP: usize = 5;

/// Widest token window tried during seed entity extraction.
///
/// Registry aliases are at most three tokens long in practice; wider
/// windows only add scan cost.
pub const MAX_SEED_WINDOW: usize = 3;

/// Trigger types for the MULTI_HOP first phase: the violent upstream
/// cause a benefit question pivots on.
pub const TRIGGER_TYPES: [EventType; 2] = [EventType::Kill, EventType::Death];

/// Consequence types for the MULTI_HOP second phase.
///
/// A benefit is a non-violent follow-up; KILL/DEATH/BATTLE are excluded
/// from this phase unconditionally so death-cascades never count as
/// benefits. The whitelist is deliberately conservative — widen it only
/// with an ontology change, never ad hoc.
pub const CONSEQUENCE_TYPES: [EventType; 6] = [
    EventType::AppointedAs,
    EventType::Coronation,
    EventType::Boon,
    EventType::Supported,
    EventType::Command,
    EventType::Rescued,
];

/// Event types excluded from MULTI_HOP consequence discovery regardless
/// of the plan's target set.
pub const CONSEQUENCE_EXCLUDED: [EventType; 3] =
    [EventType::Kill, EventType::Death, EventType::Battle];
