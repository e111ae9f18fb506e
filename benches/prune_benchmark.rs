//! Condition evaluation and pruning benchmarks
//!
//! Measures resolution, dependency-tracked evaluation and pruning over guest
//! lists of increasing size.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use form_conditions::{ConditionEngine, Conditions, FieldPath, RecordReader, resolve};
use serde_json::{Value, json};
use std::hint::black_box;

const GUEST_COUNTS: &[usize] = &[1, 10, 100, 1000];
const ALL_HIDDEN_COUNTS: &[usize] = &[1000, 8000];

fn guest_list(count: usize) -> Value {
    guest_list_with(count, |i| if i % 2 == 0 { "21+" } else { "13-20" })
}

fn guest_list_with(count: usize, age: impl Fn(usize) -> &'static str) -> Value {
    let guests: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "name": format!("Guest {i}"),
                "age": age(i),
                "wine": "Red",
                "bottles": [{"grape": "Tempranillo", "smudged": "no"}]
            })
        })
        .collect();
    json!({"caterer": "Other", "otherCaterer": "Home", "guests": guests})
}

fn engine() -> ConditionEngine {
    let conditions = Conditions::new()
        .when("otherCaterer", |gv| Ok(gv.read("caterer")? == "Other"))
        .unwrap()
        .when("guests.#.wine", |gv| Ok(gv.read("guests.#.age")? == "21+"))
        .unwrap()
        .when("guests.#.bottles.#.smudged", |gv| {
            Ok(gv.read("guests.#.age")? != "21+")
        })
        .unwrap();
    ConditionEngine::new(conditions)
}

fn bench_resolve(c: &mut Criterion) {
    let engine = engine();
    let path = FieldPath::parse("guests.42.bottles.0.smudged").unwrap();

    c.bench_function("resolve_wildcard", |b| {
        b.iter(|| black_box(resolve(black_box(&path), engine.conditions())))
    });
}

fn bench_visibility(c: &mut Criterion) {
    let engine = engine();
    let mut group = c.benchmark_group("visibility_with_dependencies");

    for &count in GUEST_COUNTS {
        let record = guest_list(count);
        let paths: Vec<String> = (0..count).map(|i| format!("guests.{i}.wine")).collect();
        let paths: Vec<&str> = paths.iter().map(String::as_str).collect();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &record, |b, record| {
            b.iter(|| {
                let mut reader = RecordReader::new(record);
                black_box(engine.visibility_with_dependencies(&paths, &mut reader))
            })
        });
    }

    group.finish();
}

fn bench_prune(c: &mut Criterion) {
    let engine = engine();
    let mut group = c.benchmark_group("prune");

    for &count in GUEST_COUNTS {
        let record = guest_list(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &record, |b, record| {
            b.iter(|| black_box(engine.prune(black_box(record))))
        });
    }

    group.finish();
}

fn bench_prune_all_hidden(c: &mut Criterion) {
    let engine = engine();
    let mut group = c.benchmark_group("prune_all_hidden");
    group.sample_size(20);

    for &count in ALL_HIDDEN_COUNTS {
        let record = guest_list_with(count, |_| "13-20");
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &record, |b, record| {
            b.iter(|| black_box(engine.prune(black_box(record))))
        });
    }

    group.finish();
}

criterion_group!(
    prune_benchmarks,
    bench_resolve,
    bench_visibility,
    bench_prune,
    bench_prune_all_hidden
);

criterion_main!(prune_benchmarks);
