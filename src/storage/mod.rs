//! Storage: document model, collections and the bulk writer.

pub mod batch;
pub mod collection;
pub mod migrations;
pub mod models;
pub mod pool;
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used items
pub use batch::{BulkWriter, BulkWriterConfig, FlushOutcome, FlushStats, PendingCounts};
pub use collection::{DocumentCollection, SqliteCollection};
pub use migrations::run_migrations;
pub use models::{Document, Filter, ID_FIELD};
pub use pool::init_db_pool_with_path;
