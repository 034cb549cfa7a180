//! Benchmark for RSQL parsing, compilation and in-memory evaluation.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use fleetql_core::predicate::NoRelations;
use fleetql_core::ql::{FilterCache, Parser};
use fleetql_core::{EntityKind, FilterEngine, MemoryStore, PageRequest};
use serde_json::json;

/// Single comparison
const SIMPLE_QUERY: &str = "controllerId==dev-42";

/// Wildcards, enums and a list
const MIXED_QUERY: &str = "name==edge-*;updateStatus=in=(pending,error);description!=''";

/// Nested groups with relation and map access
const COMPLEX_QUERY: &str = r#"(tag==eu,tag==us);(attribute.revision=="1.2",attribute.revision=="1.3");assignedDs.name==DS1*;lastControllerRequestAt=lt=${OVERDUE_TS}"#;

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("rsql_parse");
    group.throughput(Throughput::Elements(1));

    for (name, query) in [
        ("simple", SIMPLE_QUERY),
        ("mixed", MIXED_QUERY),
        ("complex", COMPLEX_QUERY),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let _ = black_box(Parser::parse(black_box(query)));
            });
        });
    }

    group.finish();
}

fn bench_cache_hit(c: &mut Criterion) {
    let cache = FilterCache::new(1000);
    let _ = cache.parse(COMPLEX_QUERY);

    c.bench_function("rsql_cache_hit", |b| {
        b.iter(|| {
            let _ = black_box(cache.parse(COMPLEX_QUERY));
        });
    });
}

fn bench_compile(c: &mut Criterion) {
    let engine = FilterEngine::default();

    c.bench_function("rsql_compile_complex", |b| {
        b.iter(|| {
            let _ = black_box(engine.compile(EntityKind::Target, Some(COMPLEX_QUERY)));
        });
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let engine = FilterEngine::default();
    let predicate = engine
        .compile(EntityKind::Target, Some(MIXED_QUERY))
        .expect("valid query");
    let doc = json!({
        "id": 1,
        "controllerId": "dev-1",
        "name": "edge-gateway-1",
        "updateStatus": "error",
        "description": "rack 4"
    });

    c.bench_function("predicate_evaluate", |b| {
        b.iter(|| black_box(predicate.matches(black_box(&doc), &NoRelations)));
    });
}

fn bench_find(c: &mut Criterion) {
    let engine = FilterEngine::default();
    let store = MemoryStore::new();
    for i in 0..10_000 {
        let status = ["pending", "error", "in_sync"][i % 3];
        store
            .insert(
                EntityKind::Target,
                json!({
                    "controllerId": format!("dev-{i}"),
                    "name": format!("edge-{i}"),
                    "updateStatus": status,
                    "description": "bench"
                }),
            )
            .expect("insert");
    }
    let page = PageRequest::default();

    let mut group = c.benchmark_group("memory_store_find");
    group.throughput(Throughput::Elements(10_000));
    group.bench_function("mixed_10k", |b| {
        b.iter(|| {
            let _ = black_box(engine.find(&store, EntityKind::Target, Some(MIXED_QUERY), &page));
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_cache_hit,
    bench_compile,
    bench_evaluate,
    bench_find
);

criterion_main!(benches);
