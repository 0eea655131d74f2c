use cellar_engine::Database;
use cellar_storage::StoreOptions;
use criterion::{criterion_group, criterion_main, Criterion};
use tempfile::TempDir;
use tokio::runtime::Runtime;

fn put_get_bench(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    c.bench_function("put_get", |b| {
        b.iter(|| {
            rt.block_on(async {
                let dir = TempDir::new().expect("tempdir");
                let mut options =
                    StoreOptions::new(dir.path().join("data").to_string_lossy().to_string());
                options.sync_writes = false;
                let db = Database::open(options).await.expect("open");
                db.create("bench", &["cf".to_string()], 3)
                    .await
                    .expect("create");
                let key = db.put("bench", "cf", "c", "v1", None).await.expect("put");
                db.put("bench", "cf", "c", "v2", Some(&key))
                    .await
                    .expect("put");
                let _ = db.get("bench", &key).await.expect("get");
            })
        })
    });
}

fn insert_many_bench(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let values: Vec<String> = (0..256).map(|i| format!("value-{i}")).collect();
    c.bench_function("insert_many_256", |b| {
        b.iter(|| {
            rt.block_on(async {
                let dir = TempDir::new().expect("tempdir");
                let mut options =
                    StoreOptions::new(dir.path().join("data").to_string_lossy().to_string());
                options.sync_writes = false;
                let db = Database::open(options).await.expect("open");
                db.create("bench", &["cf".to_string()], 1)
                    .await
                    .expect("create");
                db.insert_many("bench", "cf", "c", &values)
                    .await
                    .expect("insert_many");
            })
        })
    });
}

criterion_group!(engine_benches, put_get_bench, insert_many_bench);
criterion_main!(engine_benches);
