//! Shared test helpers for storage module tests.
//!
//! This module provides an in-memory database and a collection wrapper that
//! records calls and injects failures.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::error_handling::CollectionError;
use crate::storage::collection::DocumentCollection;
use crate::storage::models::{Document, Filter};
use crate::storage::run_migrations;

/// Creates a test database pool with migrations applied.
/// Uses a single in-memory connection, since every SQLite memory connection
/// is its own database.
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// A call made against a [`RecordingCollection`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// Lookup on `field` with this many candidate values
    Find { field: String, values: usize },
    /// Bulk insert of this many documents
    InsertMany(usize),
    /// Upsert of a document with this identity
    Save(Option<Value>),
}

/// Wraps a collection, recording every call and failing on demand.
pub struct RecordingCollection<C> {
    inner: C,
    calls: Mutex<Vec<Call>>,
    fail_finds: AtomicBool,
    save_budget: AtomicUsize,
}

impl<C> RecordingCollection<C> {
    pub fn new(inner: C) -> Self {
        RecordingCollection {
            inner,
            calls: Mutex::new(Vec::new()),
            fail_finds: AtomicBool::new(false),
            save_budget: AtomicUsize::new(usize::MAX),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn find_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Find { .. }))
            .count()
    }

    /// Makes every lookup fail while set.
    pub fn fail_finds(&self, fail: bool) {
        self.fail_finds.store(fail, Ordering::SeqCst);
    }

    /// Lets `n` more saves succeed, then fails the rest. `usize::MAX` never fails.
    pub fn fail_saves_after(&self, n: usize) {
        self.save_budget.store(n, Ordering::SeqCst);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl<C: DocumentCollection> DocumentCollection for RecordingCollection<C> {
    async fn find(&self, filter: &Filter, fields: &[&str]) -> Result<Vec<Document>, CollectionError> {
        let Filter::In { field, values } = filter;
        self.record(Call::Find {
            field: field.clone(),
            values: values.len(),
        });
        if self.fail_finds.load(Ordering::SeqCst) {
            return Err(CollectionError::SqlError(sqlx::Error::PoolTimedOut));
        }
        self.inner.find(filter, fields).await
    }

    async fn insert_many(&self, documents: &[Document]) -> Result<(), CollectionError> {
        self.record(Call::InsertMany(documents.len()));
        self.inner.insert_many(documents).await
    }

    async fn save(&self, document: &Document) -> Result<(), CollectionError> {
        self.record(Call::Save(document.id().cloned()));
        let budget = self.save_budget.load(Ordering::SeqCst);
        if budget == 0 {
            return Err(CollectionError::SqlError(sqlx::Error::PoolTimedOut));
        }
        if budget != usize::MAX {
            self.save_budget.store(budget - 1, Ordering::SeqCst);
        }
        self.inner.save(document).await
    }
}
