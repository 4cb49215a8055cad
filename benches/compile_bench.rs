use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

use squidex_dsl::{
    AggregationDescriptor, ClauseDescriptor, CompileSession, DistinctSpec, FieldMap, Operator,
    OrderSpec, SearchDescriptor, StaticMappingProvider,
};
use std::sync::Arc;

fn build_session(field_count: usize) -> CompileSession {
    let mut pairs = Vec::with_capacity(field_count * 2);
    for i in 0..field_count {
        pairs.push((format!("field_{}", i), "text".to_string()));
        pairs.push((format!("field_{}.keyword", i), "keyword".to_string()));
    }
    pairs.push(("views".to_string(), "long".to_string()));
    let provider = StaticMappingProvider::new().with_index("bench", FieldMap::from_pairs(pairs));
    CompileSession::new("bench", Arc::new(provider))
}

fn make_clauses(count: usize, field_count: usize) -> Vec<ClauseDescriptor> {
    (0..count)
        .map(|i| {
            let column = format!("field_{}", i % field_count);
            match i % 4 {
                0 => ClauseDescriptor::eq(column, json!(format!("value {}", i))),
                1 => ClauseDescriptor::basic("views", Operator::Gte, i as i64).or(),
                2 => ClauseDescriptor::matches(column, "rust programming"),
                _ => ClauseDescriptor::basic(column, Operator::Like, "rust%").not(),
            }
        })
        .collect()
}

fn bench_clause_fold(c: &mut Criterion) {
    let session = build_session(16);
    let mut group = c.benchmark_group("clause_fold");
    for count in [10usize, 100, 1_000] {
        let clauses = make_clauses(count, 16);
        group.bench_with_input(BenchmarkId::from_parameter(count), &clauses, |b, clauses| {
            b.iter(|| {
                black_box(session.compile_query(clauses).unwrap());
            });
        });
    }
    group.finish();
}

fn bench_distinct(c: &mut Criterion) {
    let session = build_session(8);
    let mut group = c.benchmark_group("distinct");
    for depth in [1usize, 4, 8] {
        let spec = DistinctSpec::new((0..depth).map(|i| format!("field_{}", i)))
            .with_metric(AggregationDescriptor::field("total", "sum", "views"))
            .with_order(OrderSpec::desc("_count"));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &spec, |b, spec| {
            b.iter(|| {
                black_box(session.compile_distinct(spec).unwrap());
            });
        });
    }
    group.finish();
}

fn bench_full_request(c: &mut Criterion) {
    let session = build_session(16);
    let search = make_clauses(50, 16)
        .into_iter()
        .fold(SearchDescriptor::new(), SearchDescriptor::where_clause)
        .filter(ClauseDescriptor::exists("field_0"))
        .order_by(OrderSpec::desc("field_1"))
        .aggregate(
            AggregationDescriptor::terms("by_field", "field_2")
                .with_sub(AggregationDescriptor::field("avg_views", "avg", "views")),
        )
        .limit(25);

    c.bench_function("full_request", |b| {
        b.iter(|| {
            black_box(session.compile_request(&search).unwrap().to_body());
        });
    });
}

criterion_group!(benches, bench_clause_fold, bench_distinct, bench_full_request);
criterion_main!(benches);
