//! # Graph Executor
//!
//! Evaluates a [`QueryPlan`] against the [`GraphStore`] with an
//! intent-specific strategy, under the plan's depth bound. Pure structural
//! filtering — no scoring, no popularity pruning.
//!
//! The executor never reports a partial graph: unresolved seeds, empty
//! candidate sets, and constraint combinations with no survivors all
//! surface as `found=false` with a full decision trace. The only error a
//! caller can see is an internal invariant violation, which load
//! validation makes unreachable.

use crate::planner::{Intent, QueryPlan, TemporalOrder};
use crate::primitives::{
    CONSEQUENCE_EXCLUDED, CONSEQUENCE_TYPES, MAX_TRAVERSAL_DEPTH, TEMPORAL_SCAN_CAP, TRIGGER_TYPES,
};
use crate::store::GraphStore;
use crate::types::{EntityId, EntityKind, EventId, EventType, ItihasaError, Tier};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::time::Instant;

// =============================================================================
// RESULT TYPES
// =============================================================================

/// An event that satisfied the plan, detached from the store (ids only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedEvent {
    pub id: EventId,
    pub tier: Tier,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub participants: Vec<EntityId>,
    pub sentence: String,
}

/// An entity reachable from the matched events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedEntity {
    pub id: EntityId,
    pub canonical_name: String,
    pub kind: EntityKind,
    pub event_count: u64,
}

/// Traversal statistics for one execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalStats {
    /// Deepest level actually reached; never exceeds the plan's depth.
    pub max_depth_reached: usize,
    pub events_found: usize,
    pub entities_found: usize,
}

/// Structured result of executing one plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub question: String,
    pub intent: Intent,
    pub found: bool,
    /// Seed ids that resolved against the store.
    pub seed_entities: Vec<EntityId>,
    pub matched_events: Vec<MatchedEvent>,
    pub matched_entities: Vec<MatchedEntity>,
    /// Constraints that rejected at least one candidate (not merely set).
    pub constraints_applied: Vec<String>,
    pub traversal: TraversalStats,
    /// Ordered record of every accept/reject decision. Part of the
    /// contract, not a debug aid.
    pub trace: Vec<String>,
    /// Wall-clock time, integer microseconds. Excluded from determinism
    /// comparisons.
    pub elapsed_micros: u64,
}

// =============================================================================
// EXECUTION
// =============================================================================

/// Execute a plan against the store.
pub fn execute(
    plan: &QueryPlan,
    store: &GraphStore,
    question: &str,
) -> Result<QueryResult, ItihasaError> {
    let started = Instant::now();
    let mut trace: Vec<String> = Vec::new();

    trace.push(format!(
        "[START] executing {} query with max_depth={}",
        plan.intent, plan.traversal_depth
    ));
    trace.push(format!(
        "[SEEDS] {}",
        join_ids(plan.seed_entities.iter().map(EntityId::as_str))
    ));
    trace.push(format!(
        "[TARGET] {}",
        join_ids(plan.target_event_types.iter().map(|t| t.to_string()))
    ));

    // Plans carry entity ids already; re-verify against the store so a
    // stale registry snapshot degrades to found=false, never a panic.
    let mut seeds: Vec<EntityId> = Vec::new();
    for seed in &plan.seed_entities {
        if store.entity_by_id(seed).is_some() {
            trace.push(format!("[RESOLVE] {seed} → {seed}"));
            if !seeds.contains(seed) {
                seeds.push(seed.clone());
            }
        } else {
            trace.push(format!("[RESOLVE] {seed} → UNRESOLVED"));
        }
    }

    let mut constraints_applied: Vec<String> = Vec::new();
    let mut stats = TraversalStats::default();

    let matched_ids: Vec<EventId> = if seeds.is_empty() {
        trace.push(format!("[{}] no seed entities resolved", plan.intent));
        Vec::new()
    } else {
        match plan.intent {
            Intent::Fact => execute_fact(
                plan,
                store,
                &seeds,
                &mut trace,
                &mut constraints_applied,
                &mut stats,
            ),
            Intent::Temporal => execute_temporal(
                plan,
                store,
                &seeds,
                &mut trace,
                &mut constraints_applied,
                &mut stats,
            ),
            Intent::Causal => execute_causal(plan, store, &seeds, &mut trace, &mut stats),
            Intent::MultiHop => execute_multi_hop(plan, store, &seeds, &mut trace, &mut stats),
        }
    };

    let matched_events = materialize_events(store, &matched_ids)?;
    let matched_entities = extract_entities(store, &matched_events)?;

    stats.events_found = matched_events.len();
    stats.entities_found = matched_entities.len();
    trace.push(format!(
        "[RESULT] found {} events, {} entities",
        matched_events.len(),
        matched_entities.len()
    ));

    Ok(QueryResult {
        question: question.to_string(),
        intent: plan.intent,
        found: !matched_events.is_empty(),
        seed_entities: seeds,
        matched_events,
        matched_entities,
        constraints_applied,
        traversal: stats,
        trace,
        elapsed_micros: u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
    })
}

// =============================================================================
// INTENT STRATEGIES
// =============================================================================

/// FACT: depth-1 enumeration of events incident to the seeds.
fn execute_fact(
    plan: &QueryPlan,
    store: &GraphStore,
    seeds: &[EntityId],
    trace: &mut Vec<String>,
    constraints_applied: &mut Vec<String>,
    stats: &mut TraversalStats,
) -> Vec<EventId> {
    trace.push("[FACT] direct entity lookup".to_string());
    stats.max_depth_reached = 1;

    let mut accepted: BTreeSet<EventId> = BTreeSet::new();
    let mut agent_rejections = 0usize;

    for seed in seeds {
        let incident = store.events_incident_to(seed);
        trace.push(format!("[FACT] {seed}: {} incident events", incident.len()));
        for event_id in incident {
            let Some(event) = store.event_by_id(event_id) else {
                continue;
            };
            if !plan.target_event_types.is_empty()
                && !plan.target_event_types.contains(&event.event_type)
            {
                trace.push(format!(
                    "[FACT] ✗ {event_id} type {} not targeted",
                    event.event_type
                ));
                continue;
            }
            if plan.constraints.agent_required && event.participants.len() < 2 {
                trace.push(format!(
                    "[FACT] ✗ {event_id} agent required but {} participant(s)",
                    event.participants.len()
                ));
                agent_rejections += 1;
                continue;
            }
            if accepted.insert(event_id.clone()) {
                trace.push(format!("[FACT] ✓ {event_id} matched ({})", event.event_type));
            }
        }
    }

    if agent_rejections > 0 {
        constraints_applied.push("agent_required".to_string());
    }

    // BTreeSet ordering is lexicographic; the contract is suffix order.
    sorted_by_suffix(accepted.into_iter().collect(), false)
}

/// TEMPORAL: anchor events around the seeds define a pivot suffix; a
/// capped full scan collects events on the requested side of it.
fn execute_temporal(
    plan: &QueryPlan,
    store: &GraphStore,
    seeds: &[EntityId],
    trace: &mut Vec<String>,
    constraints_applied: &mut Vec<String>,
    stats: &mut TraversalStats,
) -> Vec<EventId> {
    let order = plan.constraints.temporal_order;
    trace.push(format!(
        "[TEMPORAL] anchor search, order={}",
        order.map_or_else(|| "NONE".to_string(), |o| o.to_string())
    ));
    stats.max_depth_reached = 1;

    let mut anchors: Vec<EventId> = Vec::new();
    let mut anchor_set: BTreeSet<EventId> = BTreeSet::new();
    for seed in seeds {
        for event_id in store.events_incident_to(seed) {
            let Some(event) = store.event_by_id(event_id) else {
                continue;
            };
            if plan.target_event_types.contains(&event.event_type)
                && anchor_set.insert(event_id.clone())
            {
                trace.push(format!(
                    "[TEMPORAL] anchor {event_id} ({})",
                    event.event_type
                ));
                anchors.push(event_id.clone());
            }
        }
    }

    if anchors.is_empty() {
        trace.push("[TEMPORAL] no anchor events".to_string());
        return Vec::new();
    }

    let Some(order) = order else {
        // No ordering keyword: the anchors themselves are the answer.
        trace.push(format!(
            "[TEMPORAL] no order constraint, returning {} anchors",
            anchors.len()
        ));
        return sorted_by_suffix(anchors, false);
    };

    let suffixes: Vec<u64> = anchors.iter().filter_map(EventId::index).collect();
    let pivot = match order {
        TemporalOrder::After | TemporalOrder::During => {
            suffixes.iter().copied().min().unwrap_or(0)
        }
        TemporalOrder::Before => suffixes.iter().copied().max().unwrap_or(0),
    };
    trace.push(format!("[TEMPORAL] pivot suffix {pivot}"));
    stats.max_depth_reached = 2;

    let mut matched: Vec<EventId> = Vec::new();
    let mut excluded = 0usize;
    for event_id in store.events_in_narrative_order() {
        let Some(event) = store.event_by_id(event_id) else {
            continue;
        };
        if !plan.target_event_types.contains(&event.event_type) {
            continue;
        }
        let Some(suffix) = event_id.index() else {
            continue;
        };
        let keep = match order {
            TemporalOrder::After => suffix > pivot,
            TemporalOrder::Before => suffix < pivot,
            TemporalOrder::During => suffix == pivot,
        };
        if keep {
            trace.push(format!("[TEMPORAL] ✓ {event_id} is {order}"));
            matched.push(event_id.clone());
        } else {
            excluded += 1;
        }
    }

    if excluded > 0 {
        constraints_applied.push("temporal_order".to_string());
    }

    // The anchors travel with the scan output; the resolver re-derives
    // the pivot from the matched set and filters the anchors back out.
    for anchor in anchors {
        if !matched.contains(&anchor) {
            matched.push(anchor);
        }
    }

    let descending = order == TemporalOrder::Before;
    let mut matched = sorted_by_suffix(matched, descending);
    if matched.len() > TEMPORAL_SCAN_CAP {
        trace.push(format!(
            "[TEMPORAL] capping {} matches to {TEMPORAL_SCAN_CAP}",
            matched.len()
        ));
        matched.truncate(TEMPORAL_SCAN_CAP);
    }
    matched
}

/// CAUSAL: breadth-first traversal over participation, depth-bounded,
/// with a visited-entity set. Events may be reached through several
/// participants but are accepted once.
fn execute_causal(
    plan: &QueryPlan,
    store: &GraphStore,
    seeds: &[EntityId],
    trace: &mut Vec<String>,
    stats: &mut TraversalStats,
) -> Vec<EventId> {
    trace.push("[CAUSAL] depth-limited traversal".to_string());
    let max_depth = plan.traversal_depth.min(MAX_TRAVERSAL_DEPTH);

    let mut queue: VecDeque<(EntityId, usize)> = VecDeque::new();
    let mut visited: BTreeSet<EntityId> = BTreeSet::new();
    for seed in seeds {
        queue.push_back((seed.clone(), 0));
        visited.insert(seed.clone());
    }

    let mut accepted_set: BTreeSet<EventId> = BTreeSet::new();
    let mut accepted: Vec<EventId> = Vec::new();

    while let Some((entity, depth)) = queue.pop_front() {
        stats.max_depth_reached = stats.max_depth_reached.max(depth);
        for event_id in store.events_incident_to(&entity) {
            let Some(event) = store.event_by_id(event_id) else {
                continue;
            };
            if !plan.target_event_types.contains(&event.event_type) {
                continue;
            }
            if accepted_set.insert(event_id.clone()) {
                trace.push(format!("[CAUSAL] ✓ depth={depth} event={event_id}"));
                accepted.push(event_id.clone());
            }
            // Depth is checked before enqueue, so the bound cannot be
            // exceeded; the visited set keeps the walk finite on cycles.
            if depth < max_depth {
                for participant in &event.participants {
                    if visited.insert(participant.clone()) {
                        queue.push_back((participant.clone(), depth + 1));
                        trace.push(format!(
                            "[CAUSAL] → enqueue {participant} at depth {}",
                            depth + 1
                        ));
                    }
                }
            }
        }
    }

    accepted
}

/// MULTI_HOP: trigger discovery (violent events around the seeds), then
/// consequence discovery (non-violent follow-ups around the triggers'
/// other participants).
fn execute_multi_hop(
    plan: &QueryPlan,
    store: &GraphStore,
    seeds: &[EntityId],
    trace: &mut Vec<String>,
    stats: &mut TraversalStats,
) -> Vec<EventId> {
    trace.push("[MULTI_HOP] trigger/consequence traversal".to_string());
    stats.max_depth_reached = 1;

    // Phase 1: violent events incident to a seed.
    let mut trigger_set: BTreeSet<EventId> = BTreeSet::new();
    let mut triggers: Vec<EventId> = Vec::new();
    for seed in seeds {
        for event_id in store.events_incident_to(seed) {
            let Some(event) = store.event_by_id(event_id) else {
                continue;
            };
            if !TRIGGER_TYPES.contains(&event.event_type)
                || !plan.target_event_types.contains(&event.event_type)
            {
                continue;
            }
            if !event.participants.contains(seed) {
                continue;
            }
            if trigger_set.insert(event_id.clone()) {
                trace.push(format!(
                    "[MULTI_HOP] ✓ trigger {event_id} ({})",
                    event.event_type
                ));
                triggers.push(event_id.clone());
            }
        }
    }

    if triggers.is_empty() {
        trace.push("[MULTI_HOP] no trigger events".to_string());
        return Vec::new();
    }

    // Phase 2: non-seed trigger participants and their non-violent
    // follow-ups. The violent types never count as benefits, whatever the
    // plan targeted.
    let seed_set: BTreeSet<&EntityId> = seeds.iter().collect();
    let mut pivots: BTreeSet<EntityId> = BTreeSet::new();
    for trigger in &triggers {
        for participant in store.participants_of(trigger) {
            if !seed_set.contains(participant) {
                pivots.insert(participant.clone());
            }
        }
    }
    trace.push(format!(
        "[MULTI_HOP] phase 2 over {} trigger participants",
        pivots.len()
    ));
    stats.max_depth_reached = 2;

    let mut consequence_set: BTreeSet<EventId> = BTreeSet::new();
    let mut consequences: Vec<EventId> = Vec::new();
    for pivot in &pivots {
        for event_id in store.events_incident_to(pivot) {
            if trigger_set.contains(event_id) || consequence_set.contains(event_id) {
                continue;
            }
            let Some(event) = store.event_by_id(event_id) else {
                continue;
            };
            if CONSEQUENCE_EXCLUDED.contains(&event.event_type) {
                trace.push(format!(
                    "[MULTI_HOP] ✗ {event_id} ({}) violent follow-ups are not benefits",
                    event.event_type
                ));
                continue;
            }
            if !CONSEQUENCE_TYPES.contains(&event.event_type) {
                continue;
            }
            consequence_set.insert(event_id.clone());
            trace.push(format!(
                "[MULTI_HOP] ✓ consequence {event_id} ({})",
                event.event_type
            ));
            consequences.push(event_id.clone());
        }
    }

    trace.push(format!(
        "[MULTI_HOP] {} triggers + {} consequences",
        triggers.len(),
        consequences.len()
    ));
    triggers.extend(consequences);
    triggers
}

// =============================================================================
// POST-PROCESSING
// =============================================================================

/// Order event ids by integer suffix.
fn sorted_by_suffix(mut ids: Vec<EventId>, descending: bool) -> Vec<EventId> {
    ids.sort_by_key(|id| id.index().unwrap_or(u64::MAX));
    if descending {
        ids.reverse();
    }
    ids
}

fn materialize_events(
    store: &GraphStore,
    ids: &[EventId],
) -> Result<Vec<MatchedEvent>, ItihasaError> {
    let mut events = Vec::with_capacity(ids.len());
    for id in ids {
        let event = store.event_by_id(id).ok_or_else(|| {
            ItihasaError::InvariantViolation(format!("matched event {id} missing from store"))
        })?;
        events.push(MatchedEvent {
            id: event.id.clone(),
            tier: event.tier,
            event_type: event.event_type,
            participants: event.participants.clone(),
            sentence: event.sentence.clone(),
        });
    }
    Ok(events)
}

/// Entity records for every participant of every matched event, first
/// seen first, deduplicated by id.
fn extract_entities(
    store: &GraphStore,
    events: &[MatchedEvent],
) -> Result<Vec<MatchedEntity>, ItihasaError> {
    let mut seen: BTreeSet<EntityId> = BTreeSet::new();
    let mut entities: Vec<MatchedEntity> = Vec::new();
    for event in events {
        for participant in &event.participants {
            if !seen.insert(participant.clone()) {
                continue;
            }
            let entity = store.entity_by_id(participant).ok_or_else(|| {
                ItihasaError::InvariantViolation(format!(
                    "participant {participant} of {} missing from store",
                    event.id
                ))
            })?;
            entities.push(MatchedEntity {
                id: entity.id.clone(),
                canonical_name: entity.canonical_name.clone(),
                kind: entity.kind,
                event_count: entity.event_count,
            });
        }
    }
    Ok(entities)
}

fn join_ids(iter: impl Iterator<Item = impl AsRef<str>>) -> String {
    let parts: Vec<String> = iter.map(|s| s.as_ref().to_string()).collect();
    if parts.is_empty() {
        "(none)".to_string()
    } else {
        parts.join(", ")
    }
}

// =============================================================================
// TESTS
// =============================================================================
