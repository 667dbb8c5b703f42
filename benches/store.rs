//! Document store benchmarks.
//!
//! Run with: cargo bench --bench store

use cadtrack::store::{Collection, DocumentStore, Fields, SqliteStore};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};
use tokio::runtime::Runtime;
use uuid::Uuid;

fn create_runtime() -> Runtime {
  tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .unwrap()
}

fn fields(value: Value) -> Fields {
  value.as_object().cloned().unwrap_or_default()
}

fn open_store(rt: &Runtime) -> SqliteStore {
  rt.block_on(async {
    let store = SqliteStore::in_memory().await.unwrap();
    store.init_schema().await.unwrap();
    store
  })
}

fn bench_insert(c: &mut Criterion) {
  let rt = create_runtime();
  let store = open_store(&rt);

  let mut group = c.benchmark_group("insert");
  group.throughput(Throughput::Elements(1));

  group.bench_function("project", |b| {
    b.iter(|| {
      rt.block_on(async {
        black_box(
          store
            .insert(
              Collection::Projects,
              fields(json!({
                "name": "Tower",
                "customer": "Acme",
                "estimator": "A. Smith",
                "drawings": ["A-101", "A-102", "S-201"],
                "createdAt": "2026-01-01T00:00:00.000Z",
                "updatedAt": "2026-01-01T00:00:00.000Z"
              })),
            )
            .await
            .unwrap(),
        );
      });
    });
  });

  group.finish();
}

fn bench_get(c: &mut Criterion) {
  let rt = create_runtime();
  let store = open_store(&rt);
  let id = rt.block_on(async {
    store
      .insert(Collection::Customers, fields(json!({"name": "Acme"})))
      .await
      .unwrap()
      .id
  });

  let mut group = c.benchmark_group("get");
  group.throughput(Throughput::Elements(1));

  group.bench_function("existing_document", |b| {
    b.iter(|| {
      rt.block_on(async {
        black_box(store.get_by_id(Collection::Customers, id).await.unwrap());
      });
    });
  });

  group.bench_function("nonexistent_document", |b| {
    b.iter(|| {
      rt.block_on(async {
        black_box(
          store
            .get_by_id(Collection::Customers, Uuid::new_v4())
            .await
            .unwrap(),
        );
      });
    });
  });

  group.finish();
}

fn bench_list_all(c: &mut Criterion) {
  let rt = create_runtime();
  let mut group = c.benchmark_group("list_all");

  for size in [10, 100, 1000] {
    let store = open_store(&rt);
    rt.block_on(async {
      for i in 0..size {
        store
          .insert(Collection::Projects, fields(json!({"index": i})))
          .await
          .unwrap();
      }
    });

    group.throughput(Throughput::Elements(size as u64));
    group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
      b.iter(|| {
        rt.block_on(async {
          black_box(store.list_all(Collection::Projects).await.unwrap());
        });
      });
    });
  }

  group.finish();
}

fn bench_upsert_list(c: &mut Criterion) {
  let rt = create_runtime();
  let store = open_store(&rt);

  let mut group = c.benchmark_group("upsert");
  group.throughput(Throughput::Elements(1));

  group.bench_function("estimators", |b| {
    b.iter(|| {
      rt.block_on(async {
        black_box(
          store
            .upsert_by_key(
              Collection::Lists,
              "type",
              "estimators",
              fields(json!({"items": ["A. Smith", "B. Jones", "C. Lee"]})),
            )
            .await
            .unwrap(),
        );
      });
    });
  });

  group.finish();
}

criterion_group!(
  benches,
  bench_insert,
  bench_get,
  bench_list_all,
  bench_upsert_list
);
criterion_main!(benches);
