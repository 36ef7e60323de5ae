//! Benchmark: cache key construction and the stacked read path.
//!
//! Patterns:
//! 1. Statement key with a handful of bound parameters
//! 2. Read hit through the default region stack
//! 3. Read hit through a read-write region (copy on every read)

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ouroboros_cache::{CacheBuilder, CacheKey, CacheValue, RowBounds, Value};

const SQL: &str = "select id, name, email from users where tenant = ? and status = ?";

fn statement_key(n: i64) -> CacheKey {
    CacheKey::for_statement(
        "users.select_by_tenant",
        RowBounds::default(),
        SQL,
        &[Value::Int(n), Value::from("active")],
        Some("production"),
    )
}

fn bench_key_construction(c: &mut Criterion) {
    c.bench_function("statement_key", |b| {
        b.iter(|| statement_key(black_box(42)))
    });
}

fn bench_read_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("region_read_hit");

    for (name, read_write) in [("read_only", false), ("read_write", true)] {
        let region = CacheBuilder::new("users")
            .read_write(read_write)
            .build()
            .unwrap();
        for n in 0..512 {
            region
                .put(statement_key(n), Some(CacheValue::object(vec![Value::Int(n); 8])))
                .unwrap();
        }
        let key = statement_key(256);

        group.bench_function(name, |b| {
            b.iter(|| region.get(black_box(&key)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_key_construction, bench_read_path);
criterion_main!(benches);
