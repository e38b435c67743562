//! # Answer Resolver
//!
//! Reduces a [`QueryResult`] to a structured [`Answer`]: a typed payload,
//! a structural confidence label, the supporting event ids, and a trace of
//! every reduction decision. Pure — no graph access beyond the matched
//! collections on the result, never fails, never guesses.
//!
//! Roles are not stored in the graph; they are inferred from event type
//! and participant position (first participant is usually the AGENT).
//! That rule is known to be imperfect, so every inference lands in the
//! trace where consumers can audit it; the resolver never swaps roles to
//! improve an answer.

use crate::executor::{MatchedEntity, MatchedEvent, QueryResult};
use crate::planner::{Intent, QueryPlan, TemporalOrder};
use crate::primitives::{BENEFICIARY_CAP, CONSEQUENCE_TYPES, EVENT_LIST_CAP, FACT_AGENT_CAP};
use crate::types::{EntityId, EntityKind, EventId, EventType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// ANSWER TYPES
// =============================================================================

/// Structural confidence label. Derived from the cardinality and clarity
/// of the matches, never from probabilities.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => f.write_str("high"),
            Self::Medium => f.write_str("medium"),
            Self::Low => f.write_str("low"),
        }
    }
}

/// A ranked entity in an `ENTITY` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntity {
    pub id: EntityId,
    pub name: String,
    pub frequency: usize,
}

/// One event in an `EVENT_LIST` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: EventId,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub sentence: String,
}

/// A node in a `CHAIN` payload; entities and events strictly alternate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ChainNode {
    #[serde(rename = "ENTITY")]
    Entity { id: EntityId, name: String },
    #[serde(rename = "EVENT")]
    Event {
        id: EventId,
        #[serde(rename = "type")]
        event_type: EventType,
    },
}

/// The `ENTITY` payload body: who acted, or who gained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityAnswer {
    Agents(Vec<RankedEntity>),
    Beneficiaries(Vec<RankedEntity>),
}

impl EntityAnswer {
    #[must_use]
    pub fn members(&self) -> &[RankedEntity] {
        match self {
            Self::Agents(m) | Self::Beneficiaries(m) => m,
        }
    }
}

/// The discriminated answer payload. The tag and the shape always agree;
/// callers match on the variant, never on a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "answer_type")]
pub enum AnswerPayload {
    #[serde(rename = "ENTITY")]
    Entity(EntityAnswer),
    #[serde(rename = "CHAIN")]
    Chain { chain: Vec<ChainNode> },
    #[serde(rename = "EVENT_LIST")]
    EventList { events: Vec<EventSummary> },
    #[serde(rename = "NO_ANSWER")]
    NoAnswer,
}

/// The resolved answer handed to downstream synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(flatten)]
    pub payload: AnswerPayload,
    pub confidence: Confidence,
    pub supporting_events: Vec<EventId>,
    pub trace: Vec<String>,
}

impl Answer {
    fn no_answer(reason: &str, mut trace: Vec<String>) -> Self {
        trace.push(format!("[RESOLVE] NO_ANSWER: {reason}"));
        Self {
            payload: AnswerPayload::NoAnswer,
            // We are certain there is no grounded answer.
            confidence: Confidence::High,
            supporting_events: Vec::new(),
            trace,
        }
    }
}

// =============================================================================
// ROLE INFERENCE
// =============================================================================

/// Narrative role assigned to a participant by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Agent,
    Patient,
}

/// Positional role pattern for an event type: roles of the first and
/// (optionally) second participant. Types outside the table fall back on
/// arity: two or more participants read as (AGENT, PATIENT), a lone
/// participant as (PATIENT, —).
#[must_use]
pub fn role_pattern(event_type: EventType, participant_count: usize) -> (Role, Option<Role>) {
    match event_type {
        EventType::Death => (Role::Patient, None),
        EventType::Vow => (Role::Agent, None),
        EventType::Kill
        | EventType::Battle
        | EventType::Coronation
        | EventType::Supported
        | EventType::Defended
        | EventType::Boon
        | EventType::Curse
        | EventType::AppointedAs
        | EventType::Command
        | EventType::Rescued => (Role::Agent, Some(Role::Patient)),
        _ if participant_count >= 2 => (Role::Agent, Some(Role::Patient)),
        _ => (Role::Patient, None),
    }
}

/// The inferred AGENT of an event, if its pattern has one.
#[must_use]
pub fn inferred_agent(event: &MatchedEvent) -> Option<&EntityId> {
    let (first, _) = role_pattern(event.event_type, event.participants.len());
    match first {
        Role::Agent => event.participants.first(),
        Role::Patient => None,
    }
}

/// The inferred PATIENT of an event, if its pattern has one.
#[must_use]
pub fn inferred_patient(event: &MatchedEvent) -> Option<&EntityId> {
    let (first, second) = role_pattern(event.event_type, event.participants.len());
    match (first, second) {
        (Role::Patient, _) => event.participants.first(),
        (_, Some(Role::Patient)) => event.participants.get(1),
        _ => None,
    }
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Reduce a query result to an answer. Dispatches on the plan's intent.
#[must_use]
pub fn resolve(plan: &QueryPlan, result: &QueryResult) -> Answer {
    let mut trace: Vec<String> = vec![format!("[RESOLVE] intent={}", plan.intent)];

    if result.matched_events.is_empty() {
        return Answer::no_answer("no matched events", trace);
    }

    let kinds = kind_index(&result.matched_entities);

    match plan.intent {
        Intent::Fact => resolve_fact(plan, result, &kinds, trace),
        Intent::Temporal => resolve_temporal(plan, result, trace),
        Intent::MultiHop => resolve_multi_hop(result, &kinds, trace),
        Intent::Causal => {
            let answer = resolve_causal(result, &kinds, &mut trace);
            answer.unwrap_or_else(|| Answer::no_answer("no support event with a seed agent", trace))
        }
    }
}

fn kind_index(entities: &[MatchedEntity]) -> BTreeMap<EntityId, &MatchedEntity> {
    entities.iter().map(|e| (e.id.clone(), e)).collect()
}

fn is_person(kinds: &BTreeMap<EntityId, &MatchedEntity>, id: &EntityId) -> bool {
    kinds.get(id).is_some_and(|e| e.kind == EntityKind::Person)
}

/// FACT: infer the AGENT of each surviving event, rank by frequency.
fn resolve_fact(
    plan: &QueryPlan,
    result: &QueryResult,
    kinds: &BTreeMap<EntityId, &MatchedEntity>,
    mut trace: Vec<String>,
) -> Answer {
    // Defence in depth: the executor already filtered, but the reduction
    // must hold on its own.
    let mut agents: BTreeMap<EntityId, (usize, Vec<EventId>)> = BTreeMap::new();

    for event in &result.matched_events {
        if !plan.target_event_types.is_empty()
            && !plan.target_event_types.contains(&event.event_type)
        {
            continue;
        }
        if plan.constraints.agent_required && event.participants.len() < 2 {
            continue;
        }
        let Some(agent) = inferred_agent(event) else {
            trace.push(format!(
                "[RESOLVE] {} ({}) has no inferable agent",
                event.id, event.event_type
            ));
            continue;
        };
        if !is_person(kinds, agent) {
            trace.push(format!(
                "[RESOLVE] {} agent {agent} is not a PERSON, skipped",
                event.id
            ));
            continue;
        }
        trace.push(format!("[RESOLVE] {} AGENT={agent}", event.id));
        let slot = agents.entry(agent.clone()).or_default();
        slot.0 += 1;
        slot.1.push(event.id.clone());
    }

    if agents.is_empty() {
        return Answer::no_answer("no agents survived role inference", trace);
    }

    let distinct = agents.len();
    let mut ranked: Vec<(EntityId, usize, Vec<EventId>)> = agents
        .into_iter()
        .map(|(id, (freq, events))| (id, freq, events))
        .collect();
    // Frequency desc, incident-event count desc, id asc.
    ranked.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| {
                let count_a = kinds.get(&a.0).map_or(0, |e| e.event_count);
                let count_b = kinds.get(&b.0).map_or(0, |e| e.event_count);
                count_b.cmp(&count_a)
            })
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(FACT_AGENT_CAP);

    let mut supporting: Vec<EventId> = Vec::new();
    let members: Vec<RankedEntity> = ranked
        .into_iter()
        .map(|(id, frequency, events)| {
            for event in events {
                if !supporting.contains(&event) {
                    supporting.push(event);
                }
            }
            let name = kinds
                .get(&id)
                .map_or_else(|| id.as_str().to_string(), |e| e.canonical_name.clone());
            RankedEntity {
                id,
                name,
                frequency,
            }
        })
        .collect();

    let confidence = match distinct {
        1 => Confidence::High,
        2 | 3 => Confidence::Medium,
        _ => Confidence::Low,
    };
    trace.push(format!(
        "[RESOLVE] {distinct} distinct agent(s), confidence={confidence}"
    ));

    Answer {
        payload: AnswerPayload::Entity(EntityAnswer::Agents(members)),
        confidence,
        supporting_events: supporting,
        trace,
    }
}

/// TEMPORAL: the earliest seed-incident DEATH/BATTLE anchors the
/// ordering; matched events on the requested side of it are listed.
fn resolve_temporal(plan: &QueryPlan, result: &QueryResult, mut trace: Vec<String>) -> Answer {
    let anchor = result
        .matched_events
        .iter()
        .filter(|e| {
            matches!(e.event_type, EventType::Death | EventType::Battle)
                && e.participants
                    .iter()
                    .any(|p| result.seed_entities.contains(p))
        })
        .min_by_key(|e| e.id.index().unwrap_or(u64::MAX));

    let Some(anchor) = anchor else {
        return Answer::no_answer("no seed-incident anchor event", trace);
    };
    let pivot = anchor.id.index().unwrap_or(0);
    trace.push(format!("[RESOLVE] anchor {} at suffix {pivot}", anchor.id));

    let order = plan.constraints.temporal_order;
    let mut events: Vec<&MatchedEvent> = result
        .matched_events
        .iter()
        .filter(|e| {
            let Some(suffix) = e.id.index() else {
                return false;
            };
            match order {
                Some(TemporalOrder::After) => suffix > pivot,
                Some(TemporalOrder::Before) => suffix < pivot,
                // DURING has no reliable semantics on the id proxy; list
                // everything matched rather than guess a neighborhood.
                Some(TemporalOrder::During) | None => true,
            }
        })
        .collect();

    events.sort_by_key(|e| e.id.index().unwrap_or(u64::MAX));
    if order == Some(TemporalOrder::Before) {
        events.reverse();
    }
    events.truncate(EVENT_LIST_CAP);

    if events.is_empty() {
        return Answer::no_answer("no events on the requested side of the anchor", trace);
    }

    let supporting: Vec<EventId> = events.iter().map(|e| e.id.clone()).collect();
    let summaries: Vec<EventSummary> = events
        .into_iter()
        .map(|e| EventSummary {
            id: e.id.clone(),
            event_type: e.event_type,
            sentence: e.sentence.clone(),
        })
        .collect();
    trace.push(format!("[RESOLVE] {} event(s) listed", summaries.len()));

    Answer {
        payload: AnswerPayload::EventList { events: summaries },
        // Temporal relations are proxied through event ids.
        confidence: Confidence::Medium,
        supporting_events: supporting,
        trace,
    }
}

/// MULTI_HOP: triggers ground the question, consequences name who gained.
fn resolve_multi_hop(
    result: &QueryResult,
    kinds: &BTreeMap<EntityId, &MatchedEntity>,
    mut trace: Vec<String>,
) -> Answer {
    let triggers: Vec<&MatchedEvent> = result
        .matched_events
        .iter()
        .filter(|e| {
            matches!(e.event_type, EventType::Kill | EventType::Death)
                && e.participants
                    .iter()
                    .any(|p| result.seed_entities.contains(p))
        })
        .collect();
    let consequences: Vec<&MatchedEvent> = result
        .matched_events
        .iter()
        .filter(|e| CONSEQUENCE_TYPES.contains(&e.event_type))
        .collect();

    if triggers.is_empty() {
        return Answer::no_answer("no trigger events among matches", trace);
    }
    if consequences.is_empty() {
        return Answer::no_answer("no consequence events among matches", trace);
    }
    trace.push(format!(
        "[RESOLVE] {} trigger(s), {} consequence(s)",
        triggers.len(),
        consequences.len()
    ));

    let mut beneficiaries: BTreeMap<EntityId, (usize, Vec<EventId>)> = BTreeMap::new();
    for event in &consequences {
        // The benefited party: the AGENT, plus the PATIENT for event
        // types where the second position receives the gain (an
        // appointment rewards both the appointer and the appointee).
        let mut candidates: Vec<&EntityId> = Vec::new();
        if let Some(agent) = inferred_agent(event) {
            candidates.push(agent);
        }
        if matches!(
            event.event_type,
            EventType::Boon | EventType::AppointedAs | EventType::Rescued
        ) {
            if let Some(patient) = inferred_patient(event) {
                if !candidates.contains(&patient) {
                    candidates.push(patient);
                }
            }
        }
        for candidate in candidates {
            if result.seed_entities.contains(candidate) {
                continue;
            }
            if !is_person(kinds, candidate) {
                trace.push(format!(
                    "[RESOLVE] {} beneficiary {candidate} is not a PERSON, skipped",
                    event.id
                ));
                continue;
            }
            trace.push(format!("[RESOLVE] {} benefits {candidate}", event.id));
            let slot = beneficiaries.entry(candidate.clone()).or_default();
            slot.0 += 1;
            slot.1.push(event.id.clone());
        }
    }

    if beneficiaries.is_empty() {
        return Answer::no_answer("no PERSON beneficiaries survived role inference", trace);
    }

    let mut ranked: Vec<(EntityId, usize, Vec<EventId>)> = beneficiaries
        .into_iter()
        .map(|(id, (freq, events))| (id, freq, events))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(BENEFICIARY_CAP);

    let mut supporting: Vec<EventId> = triggers.iter().map(|e| e.id.clone()).collect();
    let members: Vec<RankedEntity> = ranked
        .into_iter()
        .map(|(id, frequency, events)| {
            for event in events {
                if !supporting.contains(&event) {
                    supporting.push(event);
                }
            }
            let name = kinds
                .get(&id)
                .map_or_else(|| id.as_str().to_string(), |e| e.canonical_name.clone());
            RankedEntity {
                id,
                name,
                frequency,
            }
        })
        .collect();

    Answer {
        payload: AnswerPayload::Entity(EntityAnswer::Beneficiaries(members)),
        confidence: Confidence::Medium,
        supporting_events: supporting,
        trace,
    }
}

/// CAUSAL: a support-class event with a seed agent, chained back to the
/// closest prior commitment (VOW/COMMAND/BOON) by the same agent.
fn resolve_causal(
    result: &QueryResult,
    kinds: &BTreeMap<EntityId, &MatchedEntity>,
    trace: &mut Vec<String>,
) -> Option<Answer> {
    let support = result
        .matched_events
        .iter()
        .filter(|e| matches!(e.event_type, EventType::Supported | EventType::Defended))
        .filter(|e| {
            inferred_agent(e).is_some_and(|agent| {
                result.seed_entities.contains(agent) && is_person(kinds, agent)
            })
        })
        .min_by_key(|e| e.id.index().unwrap_or(u64::MAX))?;

    let agent = inferred_agent(support)?.clone();
    let support_suffix = support.id.index().unwrap_or(0);
    trace.push(format!(
        "[RESOLVE] support event {} with agent {agent}",
        support.id
    ));

    // Closest prior commitment by the same agent.
    let prior = result
        .matched_events
        .iter()
        .filter(|e| {
            matches!(
                e.event_type,
                EventType::Vow | EventType::Command | EventType::Boon
            )
        })
        .filter(|e| inferred_agent(e) == Some(&agent))
        .filter(|e| e.id.index().is_some_and(|s| s < support_suffix))
        .max_by_key(|e| e.id.index().unwrap_or(0));

    let patient = inferred_patient(support).filter(|p| is_person(kinds, p));
    let agent_name = kinds
        .get(&agent)
        .map_or_else(|| agent.as_str().to_string(), |e| e.canonical_name.clone());

    let mut supporting = vec![support.id.clone()];
    let (chain, confidence) = match (prior, patient) {
        (Some(prior), Some(patient)) => {
            trace.push(format!("[RESOLVE] prior commitment {}", prior.id));
            supporting.insert(0, prior.id.clone());
            let patient_name = kinds
                .get(patient)
                .map_or_else(|| patient.as_str().to_string(), |e| e.canonical_name.clone());
            (
                vec![
                    ChainNode::Entity {
                        id: agent.clone(),
                        name: agent_name,
                    },
                    ChainNode::Event {
                        id: prior.id.clone(),
                        event_type: prior.event_type,
                    },
                    ChainNode::Entity {
                        id: patient.clone(),
                        name: patient_name,
                    },
                    ChainNode::Event {
                        id: support.id.clone(),
                        event_type: support.event_type,
                    },
                ],
                Confidence::Medium,
            )
        }
        _ => {
            trace.push("[RESOLVE] no prior commitment, support event stands alone".to_string());
            (
                vec![
                    ChainNode::Entity {
                        id: agent.clone(),
                        name: agent_name,
                    },
                    ChainNode::Event {
                        id: support.id.clone(),
                        event_type: support.event_type,
                    },
                ],
                Confidence::Low,
            )
        }
    };

    Some(Answer {
        payload: AnswerPayload::Chain { chain },
        confidence,
        supporting_events: supporting,
        trace: std::mem::take(trace),
    })
}

// =============================================================================
// TESTS
// =============================================================================
