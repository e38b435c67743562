//! # End-to-End Pipeline Scenarios
//!
//! Full plan → execute → resolve runs against a small epic graph,
//! covering each intent strategy and the contract properties the
//! pipeline must uphold (groundedness, constraint honesty, exclusion
//! rules, NO_ANSWER safety, idempotence).

use itihasa_core::{
    answer_question, Answer, AnswerPayload, ChainNode, Confidence, Entity, EntityAnswer, EntityId,
    EntityKind, Event, EventId, EventType, GraphStore, Intent, QueryResult,
};

// =============================================================================
// FIXTURE
// =============================================================================

fn person(id: &str, name: &str, event_count: u64, aliases: &[&str]) -> Entity {
    Entity {
        id: EntityId::new(id),
        canonical_name: name.to_string(),
        kind: EntityKind::Person,
        event_count,
        aliases: aliases.iter().map(|s| (*s).to_string()).collect(),
    }
}

fn event(id: &str, event_type: EventType, sentence: &str, participants: &[&str]) -> Event {
    Event {
        id: EventId::new(id),
        event_type,
        tier: event_type.tier(),
        sentence: sentence.to_string(),
        participants: participants.iter().map(|s| EntityId::new(*s)).collect(),
    }
}

/// A miniature war: Bhishma's vow, Drona's fall and its aftermath,
/// Karna's death, and the battles after Abhimanyu.
fn epic_graph() -> GraphStore {
    let entities = vec![
        person("person_karna", "karna", 12, &["radheya", "vasusena"]),
        person("person_arjuna", "arjuna", 40, &["partha"]),
        person("person_abhimanyu", "abhimanyu", 6, &[]),
        person("person_bhishma", "bhishma", 30, &[]),
        person("person_duryodhana", "duryodhana", 35, &["suyodhana"]),
        person("person_drona", "drona", 25, &[]),
        person("person_dhristadyumna", "dhristadyumna", 9, &[]),
        person("person_yudhishthira", "yudhishthira", 28, &[]),
        person("person_satyaki", "satyaki", 7, &[]),
    ];
    let events = vec![
        event(
            "E100",
            EventType::Vow,
            "Bhishma vowed lifelong celibacy and service to the throne.",
            &["person_bhishma"],
        ),
        event(
            "E200",
            EventType::Death,
            "Dhristadyumna struck down Drona as he laid down his arms.",
            &["person_dhristadyumna", "person_drona"],
        ),
        event(
            "E210",
            EventType::AppointedAs,
            "Yudhishthira appointed Dhristadyumna commander of the host.",
            &["person_yudhishthira", "person_dhristadyumna"],
        ),
        event(
            "E211",
            EventType::Kill,
            "Dhristadyumna slew Satyaki's charioteer in the melee.",
            &["person_dhristadyumna", "person_satyaki"],
        ),
        event(
            "E400",
            EventType::Supported,
            "Bhishma stood by Duryodhana's cause on the field.",
            &["person_bhishma", "person_duryodhana"],
        ),
        event(
            "E500",
            EventType::Kill,
            "Arjuna slew Karna as his wheel sank into the earth.",
            &["person_arjuna", "person_karna"],
        ),
        event(
            "E600",
            EventType::Death,
            "Karna fell on the seventeenth day.",
            &["person_karna"],
        ),
        event(
            "E700",
            EventType::Death,
            "Abhimanyu died inside the wheel formation.",
            &["person_abhimanyu"],
        ),
        event(
            "E710",
            EventType::Battle,
            "Arjuna clashed with the Kaurava host at dusk.",
            &["person_arjuna", "person_duryodhana"],
        ),
        event(
            "E711",
            EventType::Battle,
            "The armies met again at dawn.",
            &["person_arjuna", "person_duryodhana"],
        ),
        event(
            "E712",
            EventType::Battle,
            "Fighting continued along the river.",
            &["person_arjuna", "person_duryodhana"],
        ),
        event(
            "E713",
            EventType::Battle,
            "The lines broke and reformed twice.",
            &["person_arjuna", "person_duryodhana"],
        ),
        event(
            "E714",
            EventType::Battle,
            "Night fighting erupted against custom.",
            &["person_arjuna", "person_duryodhana"],
        ),
    ];
    GraphStore::from_parts(entities, events).expect("fixture graph")
}

fn run(question: &str) -> (GraphStore, QueryResult, Answer) {
    let store = epic_graph();
    let registry = store.registry_snapshot();
    let (_plan, result, answer) = answer_question(question, &store, &registry).expect("pipeline");
    (store, result, answer)
}

// =============================================================================
// S1: FACT — "Who killed Karna?"
// =============================================================================

mod s1_fact {
    use super::*;

    #[test]
    fn killer_identified_with_high_confidence() {
        let (_, result, answer) = run("Who killed Karna?");

        assert_eq!(result.intent, Intent::Fact);
        assert_eq!(result.seed_entities, vec![EntityId::new("person_karna")]);
        assert!(result.found);

        let AnswerPayload::Entity(EntityAnswer::Agents(agents)) = &answer.payload else {
            panic!("expected agents payload, got {:?}", answer.payload);
        };
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].id, EntityId::new("person_arjuna"));
        assert_eq!(answer.confidence, Confidence::High);
        assert_eq!(answer.supporting_events, vec![EventId::new("E500")]);
    }

    #[test]
    fn alias_reaches_the_same_answer() {
        let (_, _, by_name) = run("Who killed Karna?");
        let (_, _, by_alias) = run("Who killed Radheya?");
        assert_eq!(by_name.payload, by_alias.payload);
    }

    #[test]
    fn constraint_honesty_every_matched_event_has_two_participants() {
        let (_, result, _) = run("Who killed Karna?");
        assert!(result
            .constraints_applied
            .contains(&"agent_required".to_string()));
        for event in &result.matched_events {
            assert!(event.participants.len() >= 2);
        }
    }
}

// =============================================================================
// S2: TEMPORAL — "What happened after Abhimanyu's death?"
// =============================================================================

mod s2_temporal {
    use super::*;

    #[test]
    fn events_after_the_death_listed_in_order() {
        let (_, result, answer) = run("What happened after Abhimanyu's death?");

        assert_eq!(result.intent, Intent::Temporal);
        assert!(result.found);

        let AnswerPayload::EventList { events } = &answer.payload else {
            panic!("expected event list, got {:?}", answer.payload);
        };
        assert!(!events.is_empty());
        assert!(events.len() <= 5);
        let suffixes: Vec<u64> = events.iter().filter_map(|e| e.id.index()).collect();
        assert!(suffixes.iter().all(|s| *s > 700));
        let mut sorted = suffixes.clone();
        sorted.sort_unstable();
        assert_eq!(suffixes, sorted);
        assert_eq!(answer.confidence, Confidence::Medium);
    }

    #[test]
    fn depth_bound_holds() {
        let (_, result, _) = run("What happened after Abhimanyu's death?");
        assert!(result.traversal.max_depth_reached <= 2);
    }
}

// =============================================================================
// S3: CAUSAL — "Why did Bhishma support Duryodhana?"
// =============================================================================

mod s3_causal {
    use super::*;

    #[test]
    fn chain_links_vow_to_support() {
        let (_, result, answer) = run("Why did Bhishma support Duryodhana?");

        assert_eq!(result.intent, Intent::Causal);
        let AnswerPayload::Chain { chain } = &answer.payload else {
            panic!("expected chain payload, got {:?}", answer.payload);
        };
        assert_eq!(chain.len(), 4);
        assert!(matches!(
            &chain[0],
            ChainNode::Entity { id, .. } if id == &EntityId::new("person_bhishma")
        ));
        assert!(matches!(
            &chain[1],
            ChainNode::Event { id, event_type: EventType::Vow } if id == &EventId::new("E100")
        ));
        assert!(matches!(
            &chain[2],
            ChainNode::Entity { id, .. } if id == &EntityId::new("person_duryodhana")
        ));
        assert!(matches!(
            &chain[3],
            ChainNode::Event { id, event_type: EventType::Supported }
                if id == &EventId::new("E400")
        ));
        assert_eq!(answer.confidence, Confidence::Medium);
    }

    #[test]
    fn chain_strictly_alternates() {
        let (_, _, answer) = run("Why did Bhishma support Duryodhana?");
        let AnswerPayload::Chain { chain } = &answer.payload else {
            panic!("expected chain payload");
        };
        for (i, node) in chain.iter().enumerate() {
            match node {
                ChainNode::Entity { .. } => assert_eq!(i % 2, 0),
                ChainNode::Event { .. } => assert_eq!(i % 2, 1),
            }
        }
    }
}

// =============================================================================
// S4: MULTI_HOP — "Who benefited from Drona's death?"
// =============================================================================

mod s4_multi_hop {
    use super::*;

    #[test]
    fn beneficiaries_include_the_appointer() {
        let (_, result, answer) = run("Who benefited from Drona's death?");

        assert_eq!(result.intent, Intent::MultiHop);
        let AnswerPayload::Entity(EntityAnswer::Beneficiaries(members)) = &answer.payload else {
            panic!("expected beneficiaries payload, got {:?}", answer.payload);
        };
        let ids: Vec<&str> = members.iter().map(|m| m.id.as_str()).collect();
        assert!(ids.contains(&"person_yudhishthira"));
        assert_eq!(answer.confidence, Confidence::Medium);
    }

    #[test]
    fn violent_follow_ups_are_never_consequences() {
        let (_, result, _) = run("Who benefited from Drona's death?");
        // E211 is a KILL incident to a phase-2 pivot; it must be rejected.
        assert!(result
            .matched_events
            .iter()
            .all(|e| e.id != EventId::new("E211")));
        for event in &result.matched_events {
            let violent = matches!(
                event.event_type,
                EventType::Kill | EventType::Death | EventType::Battle
            );
            let is_trigger = event
                .participants
                .contains(&EntityId::new("person_drona"));
            assert!(!violent || is_trigger, "violent non-trigger {} accepted", event.id);
        }
    }
}

// =============================================================================
// S5/S6: NO_ANSWER SAFETY
// =============================================================================

mod no_answer {
    use super::*;

    #[test]
    fn unknown_entity_is_no_answer_high() {
        let (_, result, answer) = run("Who killed Nobody?");

        assert_eq!(result.intent, Intent::Fact);
        assert!(result.seed_entities.is_empty());
        assert!(!result.found);
        assert_eq!(answer.payload, AnswerPayload::NoAnswer);
        assert_eq!(answer.confidence, Confidence::High);
        assert!(answer.supporting_events.is_empty());
    }

    #[test]
    fn lone_participant_kill_rejected_under_agent_required() {
        let entities = vec![person("person_solo", "solo", 1, &[])];
        let events = vec![event(
            "E1",
            EventType::Kill,
            "Solo killed.",
            &["person_solo"],
        )];
        let store = GraphStore::from_parts(entities, events).expect("graph");
        let registry = store.registry_snapshot();

        let (_, result, answer) =
            answer_question("Who killed Solo?", &store, &registry).expect("pipeline");
        assert!(!result.found);
        assert_eq!(answer.payload, AnswerPayload::NoAnswer);
        assert_eq!(answer.confidence, Confidence::High);
    }

    #[test]
    fn trigger_without_consequences_is_no_answer() {
        // Arjuna's kill has a trigger but no non-violent follow-up in the
        // graph; the resolver must refuse rather than improvise.
        let (_, result, answer) = run("Who benefited from Arjuna's advantage?");
        assert_eq!(result.intent, Intent::MultiHop);
        assert_eq!(answer.payload, AnswerPayload::NoAnswer);
        assert_eq!(answer.confidence, Confidence::High);
    }
}

// =============================================================================
// CONTRACT PROPERTIES
// =============================================================================

mod contract {
    use super::*;

    const QUESTIONS: [&str; 5] = [
        "Who killed Karna?",
        "What happened after Abhimanyu's death?",
        "Why did Bhishma support Duryodhana?",
        "Who benefited from Drona's death?",
        "Who killed Nobody?",
    ];

    #[test]
    fn groundedness_supporting_events_exist_and_payload_entities_are_persons() {
        for question in QUESTIONS {
            let (store, _, answer) = run(question);
            for id in &answer.supporting_events {
                assert!(store.event_by_id(id).is_some(), "{question}: {id} missing");
            }
            let entity_ids: Vec<EntityId> = match &answer.payload {
                AnswerPayload::Entity(members) => {
                    members.members().iter().map(|m| m.id.clone()).collect()
                }
                AnswerPayload::Chain { chain } => chain
                    .iter()
                    .filter_map(|n| match n {
                        ChainNode::Entity { id, .. } => Some(id.clone()),
                        ChainNode::Event { .. } => None,
                    })
                    .collect(),
                _ => Vec::new(),
            };
            for id in entity_ids {
                let entity = store.entity_by_id(&id).expect("payload entity exists");
                assert_eq!(entity.kind, EntityKind::Person, "{question}: {id}");
            }
        }
    }

    #[test]
    fn depth_never_exceeds_plan() {
        for question in QUESTIONS {
            let (_, result, _) = run(question);
            assert!(result.traversal.max_depth_reached <= 2, "{question}");
        }
    }

    #[test]
    fn pipeline_is_idempotent() {
        for question in QUESTIONS {
            let (_, _, first) = run(question);
            let (_, _, second) = run(question);
            let a = serde_json::to_string(&first).expect("serialize");
            let b = serde_json::to_string(&second).expect("serialize");
            assert_eq!(a, b, "{question}");
        }
    }

    #[test]
    fn traces_are_never_empty() {
        for question in QUESTIONS {
            let (_, result, answer) = run(question);
            assert!(!result.trace.is_empty(), "{question}");
            assert!(!answer.trace.is_empty(), "{question}");
        }
    }
}

// =============================================================================
// LOAD PATH
// =============================================================================

mod load_path {
    use super::*;
    use itihasa_core::GraphPaths;
    use std::io::Write;

    fn write_file(dir: &std::path::Path, name: &str, contents: &str) {
        let mut file = std::fs::File::create(dir.join(name)).expect("create");
        file.write_all(contents.as_bytes()).expect("write");
    }

    const ENTITIES: &str = r#"[
        {"id": "person_karna", "canonical_name": "karna", "kind": "PERSON",
         "event_count": 2, "aliases": ["karna", "radheya"]},
        {"id": "person_arjuna", "canonical_name": "arjuna", "kind": "PERSON",
         "event_count": 1, "aliases": ["arjuna"]}
    ]"#;

    const EVENTS: &str = r#"[
        {"id": "E500", "type": "KILL", "tier": "MACRO",
         "sentence": "Arjuna slew Karna.",
         "participants": ["person_arjuna", "person_karna"]}
    ]"#;

    const EDGES: &str = r#"[
        {"source": "person_arjuna", "relation": "PARTICIPATED_IN",
         "target": "E500", "evidence": "Arjuna slew Karna."},
        {"source": "person_karna", "relation": "PARTICIPATED_IN",
         "target": "E500", "evidence": "Arjuna slew Karna."}
    ]"#;

    #[test]
    fn load_and_answer_from_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(dir.path(), "entities.json", ENTITIES);
        write_file(dir.path(), "events.json", EVENTS);
        write_file(dir.path(), "edges.json", EDGES);

        let store = GraphStore::load(&GraphPaths::in_dir(dir.path())).expect("load");
        assert_eq!(store.entity_count(), 2);
        assert_eq!(store.event_count(), 1);
        assert_eq!(store.edge_count(), 2);

        let registry = store.registry_snapshot();
        let (_, result, answer) =
            answer_question("Who killed Karna?", &store, &registry).expect("pipeline");
        assert!(result.found);
        let AnswerPayload::Entity(EntityAnswer::Agents(agents)) = &answer.payload else {
            panic!("expected agents payload");
        };
        assert_eq!(agents[0].id, EntityId::new("person_arjuna"));
    }

    #[test]
    fn missing_artifact_fails_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(dir.path(), "entities.json", ENTITIES);
        // events.json and edges.json absent
        assert!(GraphStore::load(&GraphPaths::in_dir(dir.path())).is_err());
    }

    #[test]
    fn edge_to_unknown_event_fails_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(dir.path(), "entities.json", ENTITIES);
        write_file(dir.path(), "events.json", EVENTS);
        write_file(
            dir.path(),
            "edges.json",
            r#"[{"source": "person_karna", "relation": "PARTICIPATED_IN",
                 "target": "E999", "evidence": ""}]"#,
        );
        assert!(GraphStore::load(&GraphPaths::in_dir(dir.path())).is_err());
    }

    #[test]
    fn alias_collision_fails_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(
            dir.path(),
            "entities.json",
            r#"[
                {"id": "person_a", "canonical_name": "a", "kind": "PERSON",
                 "event_count": 0, "aliases": ["shared"]},
                {"id": "person_b", "canonical_name": "b", "kind": "PERSON",
                 "event_count": 0, "aliases": ["Shared"]}
            ]"#,
        );
        write_file(dir.path(), "events.json", "[]");
        write_file(dir.path(), "edges.json", "[]");
        assert!(GraphStore::load(&GraphPaths::in_dir(dir.path())).is_err());
    }
}
