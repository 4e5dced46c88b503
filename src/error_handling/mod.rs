//! Error handling.
//!
//! This module provides the error types for:
//! - Initialization (logger setup)
//! - Database bootstrap (file creation, connection, migrations)
//! - Document collection operations (store rejections vs. operational failures)
//! - Bulk writer flushes (rejection, reconciliation and write failures)

mod types;

// Re-export public API
pub use types::{BufferError, CollectionError, DatabaseError, InitializationError, WritePhase};
