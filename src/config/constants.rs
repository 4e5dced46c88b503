//! Configuration constants.
//!
//! Defaults used by the bulk writer, the import runner and the CLI.

/// Pending documents at which a bulk writer flushes on its own.
pub const DEFAULT_THRESHOLD: usize = 100;

/// Default SQLite database file.
pub const DB_PATH: &str = "./documents.db";

/// Default collection name for imports.
pub const DEFAULT_COLLECTION: &str = "documents";

/// Log import progress after every this many flushes.
pub const LOGGING_INTERVAL: usize = 5;

/// Environment fallback for `--db-path`.
pub const ENV_DB_PATH: &str = "BULK_UPSERT_DB_PATH";
/// Environment fallback for `--collection`.
pub const ENV_COLLECTION: &str = "BULK_UPSERT_COLLECTION";
/// Environment fallback for `--threshold`.
pub const ENV_THRESHOLD: &str = "BULK_UPSERT_THRESHOLD";
/// Environment fallback for `--unique-attr`.
pub const ENV_UNIQUE_ATTR: &str = "BULK_UPSERT_UNIQUE_ATTR";
