//! Batched document writes.
//!
//! This module provides the [`BulkWriter`], which coalesces document upserts in
//! memory and flushes them to a [`DocumentCollection`](crate::storage::DocumentCollection)
//! once a threshold is reached or a caller forces it. Before writing, documents
//! without identity are checked against the store by their unique attribute, and
//! those that already exist are written as updates instead of duplicate inserts.

mod types;
mod writer;

pub use types::{BulkWriterConfig, FlushOutcome, FlushStats, PendingCounts};
pub use writer::BulkWriter;
