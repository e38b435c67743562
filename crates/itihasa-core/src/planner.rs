//! # Query Planner
//!
//! Turns free-form question text plus the entity registry snapshot into a
//! structured [`QueryPlan`]. Purely rule-based: keyword tables, token
//! windows, and a fixed intent priority. No graph access, no guessing —
//! unparseable input still yields a (FACT, depth 1) plan.
//!
//! The keyword tables are compiled in. Matching is token-based: the
//! question is lowercased and split on non-letter boundaries, so `killed`
//! and `Killed?` test equal.

use crate::primitives::MAX_SEED_WINDOW;
use crate::registry::RegistrySnapshot;
use crate::types::{EntityId, EventType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// =============================================================================
// PLAN TYPES
// =============================================================================

/// Question intent. Priority when several trigger: CAUSAL > TEMPORAL >
/// MULTI_HOP > FACT. MULTI_HOP is tested before the FACT fallback so that
/// "who benefited from X" is not mis-tagged as a simple who-question.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    Fact,
    Temporal,
    Causal,
    MultiHop,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Fact => "FACT",
            Self::Temporal => "TEMPORAL",
            Self::Causal => "CAUSAL",
            Self::MultiHop => "MULTI_HOP",
        };
        f.write_str(s)
    }
}

/// Ordering relation for TEMPORAL questions, proxied over event-id
/// suffixes. DURING is a stub on this proxy (see the design notes).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum TemporalOrder {
    Before,
    After,
    During,
}

impl fmt::Display for TemporalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => f.write_str("BEFORE"),
            Self::After => f.write_str("AFTER"),
            Self::During => f.write_str("DURING"),
        }
    }
}

/// Constraint record inferred from the question text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    /// Kill-class verbs require both an actor and a victim; events with a
    /// single participant cannot answer them.
    pub agent_required: bool,
    pub temporal_order: Option<TemporalOrder>,
    pub causal_chain: bool,
}

/// Structured plan for downstream graph execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub intent: Intent,
    /// Resolved seed entity ids, first-hit order, deduplicated.
    pub seed_entities: Vec<EntityId>,
    pub target_event_types: BTreeSet<EventType>,
    pub constraints: Constraints,
    /// 1 for FACT, 2 for everything else. Never deeper.
    pub traversal_depth: usize,
}

// =============================================================================
// KEYWORD TABLES
// =============================================================================

const CAUSAL_TOKENS: [&str; 3] = ["why", "because", "reason"];

const TEMPORAL_TOKENS: [&str; 6] = ["before", "after", "during", "first", "last", "then"];

const MULTI_HOP_TOKENS: [&str; 10] = [
    "benefit",
    "benefited",
    "benefits",
    "consequence",
    "consequences",
    "impact",
    "impacted",
    "impacts",
    "gained",
    "advantage",
];

const MULTI_HOP_BIGRAMS: [(&str, &str); 3] = [("led", "to"), ("result", "in"), ("resulted", "in")];

const KILL_TOKENS: [&str; 7] = ["kill", "killed", "kills", "slew", "slay", "slain", "slays"];

const DEATH_TOKENS: [&str; 5] = ["die", "died", "dies", "death", "deaths"];

const CORONATION_TOKENS: [&str; 4] = ["crown", "crowned", "crowns", "coronation"];

const SUPPORT_TOKENS: [&str; 3] = ["support", "supported", "supports"];

const CURSE_TOKENS: [&str; 4] = ["curse", "cursed", "curses", "cursing"];

const MURDER_TOKENS: [&str; 3] = ["murder", "murdered", "murders"];

/// Pronouns and stopwords that never match a single-token alias window.
const STOPWORDS: [&str; 27] = [
    "i", "me", "my", "he", "she", "him", "her", "they", "them", "who", "whom", "what", "when",
    "where", "why", "how", "the", "a", "an", "of", "to", "from", "in", "on", "by", "and", "or",
];

// =============================================================================
// PLANNING
// =============================================================================

/// Produce a query plan from a natural-language question.
///
/// Deterministic: the same (question, registry) pair always yields the
/// same plan. Never fails — an unparseable question plans as a FACT
/// query with no seeds.
#[must_use]
pub fn plan(question: &str, registry: &RegistrySnapshot) -> QueryPlan {
    let tokens = tokenize(question);
    let intent = classify_intent(&tokens);
    let seed_entities = extract_seeds(&tokens, registry);
    let target_event_types = infer_target_types(intent, &tokens);
    let constraints = infer_constraints(intent, &tokens);
    let traversal_depth = match intent {
        Intent::Fact => 1,
        Intent::Temporal | Intent::Causal | Intent::MultiHop => 2,
    };

    QueryPlan {
        intent,
        seed_entities,
        target_event_types,
        constraints,
        traversal_depth,
    }
}

/// Lowercase and split on non-letter boundaries.
fn tokenize(question: &str) -> Vec<String> {
    question
        .to_lowercase()
        .split(|c: char| !c.is_alphabetic())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn contains_any(tokens: &[String], table: &[&str]) -> bool {
    tokens.iter().any(|t| table.contains(&t.as_str()))
}

fn contains_bigram(tokens: &[String], table: &[(&str, &str)]) -> bool {
    tokens
        .windows(2)
        .any(|w| table.contains(&(w[0].as_str(), w[1].as_str())))
}

/// Intent classification, first match wins in priority order.
fn classify_intent(tokens: &[String]) -> Intent {
    if contains_any(tokens, &CAUSAL_TOKENS) {
        Intent::Causal
    } else if contains_any(tokens, &TEMPORAL_TOKENS) {
        Intent::Temporal
    } else if contains_any(tokens, &MULTI_HOP_TOKENS) || contains_bigram(tokens, &MULTI_HOP_BIGRAMS)
    {
        Intent::MultiHop
    } else {
        Intent::Fact
    }
}

/// Greedy longest-match seed extraction over token windows of width
/// `MAX_SEED_WINDOW..=1`. Accepted windows advance the scan past their
/// last token, so accepted spans never overlap; seeds are deduplicated
/// by id in first-hit order.
fn extract_seeds(tokens: &[String], registry: &RegistrySnapshot) -> Vec<EntityId> {
    let mut seeds: Vec<EntityId> = Vec::new();
    let mut position = 0;

    while position < tokens.len() {
        let mut advanced = false;
        let widest = MAX_SEED_WINDOW.min(tokens.len() - position);
        for width in (1..=widest).rev() {
            if width == 1 && STOPWORDS.contains(&tokens[position].as_str()) {
                continue;
            }
            let window = tokens[position..position + width].join(" ");
            if let Some(entry) = registry.lookup(&window) {
                if !seeds.contains(&entry.id) {
                    seeds.push(entry.id.clone());
                }
                position += width;
                advanced = true;
                break;
            }
        }
        if !advanced {
            position += 1;
        }
    }

    seeds
}

/// Intent defaults narrowed by lexical cues. Cues insert, except the
/// curse cue, which replaces the set outright: curse questions target
/// CURSE events only. The set is never emptied — if it somehow would
/// be, the intent default stands.
fn infer_target_types(intent: Intent, tokens: &[String]) -> BTreeSet<EventType> {
    let defaults: &[EventType] = match intent {
        Intent::Fact => &[
            EventType::Kill,
            EventType::Death,
            EventType::Battle,
            EventType::Coronation,
            EventType::AppointedAs,
        ],
        Intent::Causal => &[
            EventType::Supported,
            EventType::Defended,
            EventType::Vow,
            EventType::Command,
        ],
        Intent::Temporal => &[EventType::Death, EventType::Battle, EventType::Retreated],
        Intent::MultiHop => &[
            EventType::Kill,
            EventType::Death,
            EventType::Boon,
            EventType::Curse,
        ],
    };

    let mut types: BTreeSet<EventType> = defaults.iter().copied().collect();

    if contains_any(tokens, &KILL_TOKENS) {
        types.insert(EventType::Kill);
    }
    if contains_any(tokens, &DEATH_TOKENS) {
        types.insert(EventType::Death);
    }
    if contains_any(tokens, &CORONATION_TOKENS) {
        types.insert(EventType::Coronation);
    }
    if contains_any(tokens, &SUPPORT_TOKENS) || contains_bigram(tokens, &[("side", "with")]) {
        types.insert(EventType::Supported);
    }
    if contains_any(tokens, &CURSE_TOKENS) {
        // Curse questions target CURSE events only; agents drawn from
        // unrelated event types would pollute the answer.
        types = [EventType::Curse].into_iter().collect();
    }

    if types.is_empty() {
        types = defaults.iter().copied().collect();
    }
    types
}

fn infer_constraints(intent: Intent, tokens: &[String]) -> Constraints {
    let agent_required =
        contains_any(tokens, &KILL_TOKENS) || contains_any(tokens, &MURDER_TOKENS);

    let temporal_order = if tokens.iter().any(|t| t == "after") {
        Some(TemporalOrder::After)
    } else if tokens.iter().any(|t| t == "before") {
        Some(TemporalOrder::Before)
    } else if tokens.iter().any(|t| t == "during") {
        Some(TemporalOrder::During)
    } else {
        None
    };

    Constraints {
        agent_required,
        temporal_order,
        causal_chain: intent == Intent::Causal,
    }
}

// =============================================================================
// TESTS
// =============================================================================
