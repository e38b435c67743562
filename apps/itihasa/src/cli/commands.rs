//! # CLI Command Implementations

use itihasa_core::{
    answer_question, plan as build_plan, Answer, AnswerPayload, ChainNode, EntityAnswer,
    GraphPaths, GraphStore, ItihasaError, QueryResult,
};
use std::path::Path;

// =============================================================================
// ASK COMMAND
// =============================================================================

/// Answer a question: load the graph, run plan → execute → resolve,
/// print the answer. `NO_ANSWER` is a successful outcome.
pub fn cmd_ask(
    paths: &GraphPaths,
    question: &str,
    output: Option<&Path>,
    json_mode: bool,
    quiet: bool,
) -> Result<(), ItihasaError> {
    let store = GraphStore::load(paths)?;
    let registry = store.registry_snapshot();

    let (plan, result, answer) = answer_question(question, &store, &registry)?;
    tracing::info!(
        intent = %plan.intent,
        found = result.found,
        events = result.matched_events.len(),
        elapsed_micros = result.elapsed_micros,
        "query executed"
    );

    if let Some(dir) = output {
        write_outputs(dir, &result, &answer)?;
    }

    if json_mode {
        println!("{}", to_pretty_json(&answer)?);
        return Ok(());
    }

    println!("Question: {question}");
    println!("Intent:   {}", plan.intent);
    println!();
    print!("{}", render_answer(&answer));

    if !quiet {
        println!();
        println!("Trace:");
        for line in &result.trace {
            println!("  {line}");
        }
        for line in &answer.trace {
            println!("  {line}");
        }
    }

    Ok(())
}

// =============================================================================
// PLAN COMMAND
// =============================================================================

/// Show the query plan for a question without executing it.
pub fn cmd_plan(paths: &GraphPaths, question: &str, json_mode: bool) -> Result<(), ItihasaError> {
    let store = GraphStore::load(paths)?;
    let registry = store.registry_snapshot();
    let plan = build_plan(question, &registry);

    if json_mode {
        println!("{}", to_pretty_json(&plan)?);
        return Ok(());
    }

    println!("Question: {question}");
    println!("Intent:   {}", plan.intent);
    println!(
        "Seeds:    {}",
        if plan.seed_entities.is_empty() {
            "(none)".to_string()
        } else {
            plan.seed_entities
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        }
    );
    println!(
        "Targets:  {}",
        plan.target_event_types
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Depth:    {}", plan.traversal_depth);
    println!("Constraints:");
    println!("  agent_required: {}", plan.constraints.agent_required);
    println!(
        "  temporal_order: {}",
        plan.constraints
            .temporal_order
            .map_or_else(|| "(unset)".to_string(), |o| o.to_string())
    );
    println!("  causal_chain:   {}", plan.constraints.causal_chain);

    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show graph artifact counts.
pub fn cmd_status(paths: &GraphPaths, json_mode: bool) -> Result<(), ItihasaError> {
    let store = GraphStore::load(paths)?;

    if json_mode {
        let output = serde_json::json!({
            "entities": store.entity_count(),
            "events": store.event_count(),
            "edges": store.edge_count(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Itihasa Graph Status");
    println!("====================");
    println!("Entities: {}", store.entity_count());
    println!("Events:   {}", store.event_count());
    println!("Edges:    {}", store.edge_count());

    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Write answer.json and trace.txt into the output directory.
fn write_outputs(dir: &Path, result: &QueryResult, answer: &Answer) -> Result<(), ItihasaError> {
    std::fs::create_dir_all(dir).map_err(|e| ItihasaError::Io {
        path: dir.display().to_string(),
        message: e.to_string(),
    })?;

    let answer_path = dir.join("answer.json");
    std::fs::write(&answer_path, to_pretty_json(answer)?).map_err(|e| ItihasaError::Io {
        path: answer_path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut trace = String::new();
    for line in result.trace.iter().chain(answer.trace.iter()) {
        trace.push_str(line);
        trace.push('\n');
    }
    let trace_path = dir.join("trace.txt");
    std::fs::write(&trace_path, trace).map_err(|e| ItihasaError::Io {
        path: trace_path.display().to_string(),
        message: e.to_string(),
    })?;

    tracing::info!(dir = %dir.display(), "wrote answer.json and trace.txt");
    Ok(())
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, ItihasaError> {
    serde_json::to_string_pretty(value).map_err(|e| {
        ItihasaError::InvariantViolation(format!("answer failed to serialize: {e}"))
    })
}

/// Human-readable rendering of an answer. The structured payload is the
/// contract; this is only a convenience view over it.
fn render_answer(answer: &Answer) -> String {
    let mut out = String::new();

    match &answer.payload {
        AnswerPayload::Entity(entity_answer) => {
            let label = match entity_answer {
                EntityAnswer::Agents(_) => "agents",
                EntityAnswer::Beneficiaries(_) => "beneficiaries",
            };
            out.push_str(&format!("Answer: ENTITY ({label})\n"));
            for member in entity_answer.members() {
                out.push_str(&format!(
                    "  - {} ({}), frequency {}\n",
                    member.name, member.id, member.frequency
                ));
            }
        }
        AnswerPayload::Chain { chain } => {
            out.push_str("Answer: CHAIN\n  ");
            let parts: Vec<String> = chain
                .iter()
                .map(|node| match node {
                    ChainNode::Entity { name, .. } => name.clone(),
                    ChainNode::Event { id, event_type } => format!("{event_type} {id}"),
                })
                .collect();
            out.push_str(&parts.join(" → "));
            out.push('\n');
        }
        AnswerPayload::EventList { events } => {
            out.push_str("Answer: EVENT_LIST\n");
            for event in events {
                out.push_str(&format!(
                    "  - {} {}: {}\n",
                    event.id,
                    event.event_type,
                    snippet(&event.sentence, 80)
                ));
            }
        }
        AnswerPayload::NoAnswer => {
            out.push_str("Answer: NO_ANSWER\n");
        }
    }

    out.push_str(&format!("Confidence: {}\n", answer.confidence));
    if !answer.supporting_events.is_empty() {
        let ids: Vec<String> = answer
            .supporting_events
            .iter()
            .map(ToString::to_string)
            .collect();
        out.push_str(&format!("Supporting events: {}\n", ids.join(", ")));
    }
    out
}

fn snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{cut}...")
}
