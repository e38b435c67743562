//! # itihasa-core
//!
//! The deterministic query core for Itihasa — grounded question answering
//! over an event-centric knowledge graph of the Mahabharata.
//!
//! The pipeline is three pure stages over a load-once, read-only store:
//!
//! ```text
//! question text ──► Planner ──► QueryPlan ──► Executor ──► QueryResult ──► Resolver ──► Answer
//!                      ▲                         ▲
//!               registry snapshot           graph store
//! ```
//!
//! ## Architectural Constraints
//!
//! - The graph store is the only process-wide state: loaded at startup,
//!   immutable afterwards, shared by reference.
//! - Every stage is a pure function; plans, results, and answers hold ids
//!   only and never reference back into the store.
//! - Every decision is recorded in an ordered trace; the core refuses to
//!   fabricate results (`NO_ANSWER` over a guess, always).
//! - No async, no network, no interior mutability.

// =============================================================================
// MODULES
// =============================================================================

pub mod executor;
pub mod planner;
pub mod primitives;
pub mod registry;
pub mod resolver;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{
    Entity, EntityId, EntityKind, Event, EventId, EventType, ItihasaError, ParticipationEdge, Tier,
};

// =============================================================================
// RE-EXPORTS: Pipeline Stages
// =============================================================================

pub use executor::{execute, MatchedEntity, MatchedEvent, QueryResult, TraversalStats};
pub use planner::{plan, Constraints, Intent, QueryPlan, TemporalOrder};
pub use registry::{RegistryEntry, RegistrySnapshot};
pub use resolver::{
    resolve, Answer, AnswerPayload, ChainNode, Confidence, EntityAnswer, EventSummary,
    RankedEntity, Role,
};
pub use store::{GraphPaths, GraphStore};

/// Run the full pipeline for one question against a loaded store.
///
/// Convenience wrapper used by the CLI and the integration tests; the
/// three stages remain independently callable.
pub fn answer_question(
    question: &str,
    store: &GraphStore,
    registry: &RegistrySnapshot,
) -> Result<(QueryPlan, QueryResult, Answer), ItihasaError> {
    let plan = planner::plan(question, registry);
    let result = executor::execute(&plan, store, question)?;
    let answer = resolver::resolve(&plan, &result);
    Ok((plan, result, answer))
}
