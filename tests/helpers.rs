// Shared test helpers for database setup and document creation.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use bulk_upsert::{run_migrations, Document};

/// Creates a test database pool with migrations applied.
/// Uses a single in-memory connection for fast test execution.
#[allow(dead_code)] // Used by other test files
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

/// Builds a document from a JSON object literal.
#[allow(dead_code)] // Used by other test files
pub fn doc(value: Value) -> Document {
    Document::from_value(value).expect("test document must be a JSON object")
}
