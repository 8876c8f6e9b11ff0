//! Performance benchmarks for tally-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tally_engine::{
    accept_remote, pick_winner, union_merge, Document, Mutation, Person, StateSnapshot, Task,
};

fn build_document(prefix: &str, tasks: usize, updated_at: u64) -> Document {
    let mut doc = Document::initial();
    for i in 0..tasks / 10 + 1 {
        Mutation::UpsertPerson(Person::new(format!("{prefix}p{i}"), "Worker")).apply(&mut doc);
    }
    for i in 0..tasks {
        Mutation::UpsertTask(Task::new(
            format!("{prefix}t{i}"),
            format!("{prefix}p{}", i / 10),
            "cat-support",
            "Ticket",
            "2024-01-01",
        ))
        .apply(&mut doc);
    }
    doc.updated_at = updated_at;
    doc
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");

    for size in [100usize, 1_000, 10_000] {
        let local = build_document("l", size, 2);
        let remote = build_document("r", size, 1);

        group.bench_with_input(BenchmarkId::new("union_merge", size), &size, |b, _| {
            b.iter(|| union_merge(black_box(&local), black_box(Some(&remote))))
        });

        group.bench_with_input(BenchmarkId::new("pick_winner", size), &size, |b, _| {
            b.iter(|| pick_winner(black_box(Some(local.clone())), black_box(Some(remote.clone()))))
        });

        group.bench_with_input(BenchmarkId::new("accept_remote", size), &size, |b, _| {
            b.iter(|| {
                let mut current = remote.clone();
                accept_remote(black_box(&mut current), black_box(local.clone()))
            })
        });
    }

    group.finish();
}

fn bench_mutations(c: &mut Criterion) {
    let mut group = c.benchmark_group("mutations");

    group.bench_function("remove_person_cascade", |b| {
        let doc = build_document("x", 5_000, 1);
        b.iter(|| {
            let mut doc = doc.clone();
            Mutation::RemovePerson { id: "xp7".into() }.apply(black_box(&mut doc));
            doc
        })
    });

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");
    let doc = build_document("s", 5_000, 1);
    let json = StateSnapshot::new(doc.clone()).to_json().unwrap();

    group.bench_function("serialize", |b| {
        b.iter(|| StateSnapshot::new(black_box(doc.clone())).to_json())
    });
    group.bench_function("deserialize", |b| {
        b.iter(|| StateSnapshot::from_json(black_box(&json)))
    });

    group.finish();
}

criterion_group!(benches, bench_reconcile, bench_mutations, bench_snapshot);
criterion_main!(benches);
