//! Quad Store Index Benchmarks
//!
//! Measures:
//! - Statement insertion through a write transaction
//! - Pattern matching with different bound-field combinations
//! - Encoded quad serialization

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use oxirs_quadstore::{
    CollectionName, Context, EncodedQuad, Iri, Literal, QuadPattern, QuadStore, Statement,
};

fn iri(value: String) -> Iri {
    Iri::new(value).unwrap()
}

fn statement(i: usize) -> Statement {
    Statement::new(
        iri(format!("http://example.org/person/{}", i % 1_000)),
        iri(format!("http://example.org/prop/{}", i % 10)),
        Literal::Long(i as i64),
        if i % 3 == 0 {
            Context::named(iri(format!("http://example.org/graph/{}", i % 4)))
        } else {
            Context::Default
        },
    )
}

fn populated_store(size: usize) -> (QuadStore, CollectionName) {
    let store = QuadStore::in_memory();
    let data = CollectionName::new("bench").unwrap();
    {
        let mut tx = store.write().unwrap();
        tx.create_collection(&data).unwrap();
        for i in 0..size {
            tx.add_statement(&data, &statement(i)).unwrap();
        }
        tx.commit().unwrap();
    }
    (store, data)
}

/// Benchmark bulk insertion in one transaction
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for size in [100, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| populated_store(black_box(size)));
        });
    }

    group.finish();
}

/// Benchmark pattern matching on a populated collection
fn bench_match_pattern(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_pattern");
    let (store, data) = populated_store(10_000);

    let patterns = [
        (
            "subject",
            QuadPattern::any().with_subject(iri("http://example.org/person/7".to_string())),
        ),
        (
            "predicate_object",
            QuadPattern::any()
                .with_predicate(iri("http://example.org/prop/3".to_string()))
                .with_object(Literal::Long(4_003)),
        ),
        (
            "context",
            QuadPattern::any()
                .with_context(Context::named(iri("http://example.org/graph/1".to_string()))),
        ),
        ("all", QuadPattern::any()),
    ];

    for (name, pattern) in patterns.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(name), pattern, |b, pattern| {
            b.iter(|| {
                let tx = store.read().unwrap();
                tx.count(&data, black_box(pattern)).unwrap()
            });
        });
    }

    group.finish();
}

/// Benchmark encoded quad serialization
fn bench_encoded_quad(c: &mut Criterion) {
    let quad = EncodedQuad::new(6, 1, -2, i64::MAX, 0);
    c.bench_function("encoded_quad_round_trip", |b| {
        b.iter(|| EncodedQuad::from_bytes(&black_box(quad).to_bytes()).unwrap());
    });
}

criterion_group!(benches, bench_insert, bench_match_pattern, bench_encoded_quad);

criterion_main!(benches);
