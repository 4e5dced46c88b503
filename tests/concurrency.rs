//! Concurrent callers sharing one bulk writer.

mod helpers;

use std::sync::Arc;

use helpers::{create_test_pool, doc};
use serde_json::json;

use bulk_upsert::{BulkWriter, SqliteCollection};

const TASKS: usize = 8;
const DOCS_PER_TASK: usize = 50;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_lose_nothing() {
    let pool = create_test_pool().await;
    let people = SqliteCollection::new(pool, "people");
    let writer = Arc::new(BulkWriter::new(people.clone(), 7, Some("email".to_string())));

    let mut handles = Vec::new();
    for task in 0..TASKS {
        let writer = Arc::clone(&writer);
        handles.push(tokio::spawn(async move {
            for n in 0..DOCS_PER_TASK {
                let document = if n % 5 == 0 {
                    doc(json!({"_id": format!("t{task}-{n}"), "task": task}))
                } else {
                    doc(json!({"email": format!("t{task}-{n}@x.com"), "task": task}))
                };
                writer.update_one(document).await.expect("update failed");
            }
        }));
    }
    for handle in handles {
        handle.await.expect("task panicked");
    }
    writer.flush_all().await.unwrap();

    let submitted = (TASKS * DOCS_PER_TASK) as u64;
    assert_eq!(writer.inserted_count() + writer.updated_count(), submitted);
    assert_eq!(writer.pending().await.total, 0);
    assert_eq!(people.count().await.unwrap() as u64, submitted);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_flushes_and_updates_interleave_safely() {
    let pool = create_test_pool().await;
    let people = SqliteCollection::new(pool, "people");
    let writer = Arc::new(BulkWriter::new(people.clone(), 1000, None));

    let producer = {
        let writer = Arc::clone(&writer);
        tokio::spawn(async move {
            for n in 0..200 {
                writer.update_one(doc(json!({"n": n}))).await.unwrap();
            }
        })
    };
    let flusher = {
        let writer = Arc::clone(&writer);
        tokio::spawn(async move {
            for _ in 0..20 {
                writer.flush_all().await.unwrap();
                tokio::task::yield_now().await;
            }
        })
    };
    producer.await.unwrap();
    flusher.await.unwrap();
    writer.flush_all().await.unwrap();

    assert_eq!(writer.inserted_count(), 200);
    assert_eq!(people.count().await.unwrap(), 200);
}
