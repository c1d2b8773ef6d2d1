use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use docfield_core::prelude::*;
use serde_json::{json, Value};
use std::hint::black_box;
use std::sync::Arc;

fn catalog_class(registry: &mut Registry) -> Arc<DocumentClass> {
    let address = registry
        .register(
            ClassDef::embedded("Address")
                .field("street", StringField::new())
                .field("city", StringField::new().required()),
        )
        .unwrap();
    registry
        .register(
            ClassDef::document("Product")
                .key_fields(["sku"])
                .field("sku", StringField::new())
                .field("name", StringField::new().required())
                .field("price", FloatField::new())
                .field("stock", IntField::new().default_value(0))
                .field("tags", ListField::new(StringField::new()))
                .field("warehouse", EmbeddedDocumentField::new(&address)),
        )
        .unwrap()
}

fn sample_payload(index: usize, tag_count: usize) -> Payload {
    let tags: Vec<Value> = (0..tag_count).map(|t| json!(format!("tag-{t}"))).collect();
    json!({
        "sku": format!("SKU-{index:06}"),
        "name": format!("Product {index}"),
        "price": 9.99 + index as f64,
        "stock": index % 50,
        "tags": tags,
        "warehouse": {"street": "Dock 4", "city": "Rotterdam"},
        "legacy_code": index,
    })
    .as_object()
    .cloned()
    .unwrap_or_default()
}

fn benchmark_document_forms(c: &mut Criterion) {
    let engine = Arc::new(RamEngine::new("ram"));
    let mut registry = Registry::new().with_engine(engine.clone());
    let class = catalog_class(&mut registry);

    let mut group = c.benchmark_group("document_forms");
    for tag_count in [0usize, 16, 256] {
        let payload = sample_payload(1, tag_count);
        group.throughput(Throughput::Elements(1));

        group.bench_with_input(BenchmarkId::new("construct", tag_count), &payload, |b, payload| {
            b.iter(|| black_box(Document::new(&class, payload.clone()).unwrap()));
        });

        let doc = Document::new(&class, payload.clone()).unwrap();
        group.bench_with_input(BenchmarkId::new("to_db", tag_count), &doc, |b, doc| {
            let opts = DbOptions { engine: Some(&*engine), ..Default::default() };
            b.iter(|| black_box(doc.to_db(&opts).unwrap()));
        });

        let stored = doc.to_db(&DbOptions::default()).unwrap();
        group.bench_with_input(BenchmarkId::new("from_db", tag_count), &stored, |b, stored| {
            b.iter(|| black_box(Document::from_db(&class, stored.clone(), Some(&*engine)).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("display", tag_count), &doc, |b, doc| {
            b.iter(|| {
                let mut doc = doc.clone();
                black_box(doc.get_display_data(&DisplayOptions::default()).unwrap())
            });
        });

        group.bench_with_input(BenchmarkId::new("validate", tag_count), &doc, |b, doc| {
            b.iter(|| {
                let mut doc = doc.clone();
                black_box(doc.validate().is_ok())
            });
        });
    }
    group.finish();
}

fn benchmark_store_round_trip(c: &mut Criterion) {
    let engine = Arc::new(RamEngine::new("ram"));
    let mut registry = Registry::new().with_engine(engine.clone());
    let class = catalog_class(&mut registry);

    let mut group = c.benchmark_group("ram_store");
    let docs: Vec<Document> =
        (0..1_000).map(|i| Document::new(&class, sample_payload(i, 4)).unwrap()).collect();
    group.throughput(Throughput::Elements(docs.len() as u64));
    group.bench_function("create_1000", |b| {
        b.iter(|| {
            for doc in &docs {
                black_box(engine.create(doc).unwrap());
            }
        });
    });

    let ids: Vec<String> = docs.iter().map(|doc| engine.create(doc).unwrap()).collect();
    group.bench_function("fetch_1000", |b| {
        b.iter(|| {
            for doc_id in &ids {
                black_box(engine.fetch(&class, doc_id, None, None).unwrap());
            }
        });
    });
    group.finish();
}

criterion_group!(benches, benchmark_document_forms, benchmark_store_round_trip);
criterion_main!(benches);
