//! # Query Pipeline Benchmarks
//!
//! Performance benchmarks for the itihasa-core query path. The contract
//! is < 20 ms per query on a graph of ~1.5k entities / ~12k events; these
//! benches exercise synthetic graphs at and around that scale.
//!
//! Run with: `cargo bench -p itihasa-core`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use itihasa_core::{
    execute, plan, resolve, Entity, EntityId, EntityKind, Event, EventId, EventType, GraphStore,
};
use std::hint::black_box;

/// Alphabetic-only names: the planner tokenizes on letter boundaries, so
/// a digit-suffixed name could never match a question token.
fn hero_name(mut index: usize) -> String {
    let mut suffix = String::new();
    loop {
        suffix.insert(0, (b'a' + (index % 26) as u8) as char);
        index /= 26;
        if index == 0 {
            break;
        }
    }
    format!("hero{suffix}")
}

fn hero_id(index: usize) -> EntityId {
    EntityId::new(format!("person_{}", hero_name(index)))
}

/// Build a synthetic epic: `people` persons, `events` events cycling over
/// the macro types, each pairing two persons.
fn create_epic_graph(people: usize, events: usize) -> GraphStore {
    let types = [
        EventType::Kill,
        EventType::Death,
        EventType::Battle,
        EventType::Supported,
        EventType::Vow,
        EventType::AppointedAs,
        EventType::Boon,
        EventType::Command,
    ];

    let entities: Vec<Entity> = (0..people)
        .map(|i| Entity {
            id: hero_id(i),
            canonical_name: hero_name(i),
            kind: EntityKind::Person,
            event_count: (i % 50) as u64,
            aliases: vec![],
        })
        .collect();

    let event_records: Vec<Event> = (0..events)
        .map(|j| {
            let event_type = types[j % types.len()];
            let first = j % people;
            let second = (j * 7 + 1) % people;
            let participants = if first == second {
                vec![hero_id(first)]
            } else {
                vec![hero_id(first), hero_id(second)]
            };
            Event {
                id: EventId::new(format!("E{j}")),
                event_type,
                tier: event_type.tier(),
                sentence: format!("event {j} of the war"),
                participants,
            }
        })
        .collect();

    GraphStore::from_parts(entities, event_records).expect("bench graph")
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan");

    let question = format!("Who killed {}?", hero_name(1));
    for people in [100, 1500].iter() {
        let store = create_epic_graph(*people, 1000);
        let registry = store.registry_snapshot();

        group.bench_with_input(BenchmarkId::from_parameter(people), people, |b, _| {
            b.iter(|| black_box(plan(&question, &registry)));
        });
    }

    group.finish();
}

fn bench_execute_by_intent(c: &mut Criterion) {
    let mut group = c.benchmark_group("execute");

    let store = create_epic_graph(1500, 12000);
    let registry = store.registry_snapshot();

    let subject = hero_name(1);
    let other = hero_name(8);
    let questions = [
        ("fact", format!("Who killed {subject}?")),
        ("temporal", format!("What happened after {subject} died?")),
        ("causal", format!("Why did {subject} support {other}?")),
        ("multi_hop", format!("Who benefited from {subject}'s death?")),
    ];

    for (label, question) in &questions {
        let query_plan = plan(question, &registry);
        group.bench_with_input(
            BenchmarkId::from_parameter(label),
            &query_plan,
            |b, query_plan| {
                b.iter(|| black_box(execute(query_plan, &store, question)));
            },
        );
    }

    group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    for events in [1000, 12000].iter() {
        let store = create_epic_graph(1500, *events);
        let registry = store.registry_snapshot();

        let question = format!("Who benefited from {}'s death?", hero_name(1));
        group.bench_with_input(BenchmarkId::from_parameter(events), events, |b, _| {
            b.iter(|| {
                let query_plan = plan(&question, &registry);
                let result = execute(&query_plan, &store, &question).expect("execute");
                black_box(resolve(&query_plan, &result))
            });
        });
    }

    group.finish();
}

fn bench_load_indexes(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");
    group.sample_size(20);

    for events in [1000, 12000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(events), events, |b, &events| {
            b.iter(|| black_box(create_epic_graph(1500, events)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_plan,
    bench_execute_by_intent,
    bench_full_pipeline,
    bench_load_indexes,
);

criterion_main!(benches);
