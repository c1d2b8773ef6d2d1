use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use docfield_core::engine::CodecTable;
use docfield_core::error::DocResult;
use serde_json::Value;
use std::hint::black_box;

fn identity(value: Value) -> DocResult<Value> {
    Ok(value)
}

const LINEAGES: &[&[&str]] = &[
    &["email", "string"],
    &["int", "number"],
    &["float", "number"],
    &["datetime"],
    &["reference"],
    &["external"],
];

fn benchmark_codec_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_resolution");

    // Every kind registered: direct hits
    let direct = CodecTable::new()
        .with("string", identity)
        .with("email", identity)
        .with("int", identity)
        .with("float", identity)
        .with("number", identity)
        .with("datetime", identity);

    // Only base kinds registered: lookups fall back along the lineage
    let fallback = CodecTable::new().with("string", identity).with("number", identity);

    for (label, table) in [("direct", &direct), ("fallback", &fallback)] {
        group.bench_with_input(BenchmarkId::new("resolve", label), table, |b, table| {
            b.iter(|| {
                for lineage in LINEAGES {
                    black_box(table.resolve(lineage));
                }
            });
        });
    }

    group.bench_function("resolve_cold", |b| {
        b.iter(|| {
            let table = CodecTable::new().with("string", identity).with("number", identity);
            for lineage in LINEAGES {
                black_box(table.resolve(lineage));
            }
        });
    });
    group.finish();
}

criterion_group!(benches, benchmark_codec_lookup);
criterion_main!(benches);
