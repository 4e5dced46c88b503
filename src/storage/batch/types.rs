//! Bulk writer configuration and flush result types.

use std::time::Duration;

use crate::config::DEFAULT_THRESHOLD;

/// Configuration for a [`BulkWriter`](super::BulkWriter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkWriterConfig {
    /// Number of pending documents at which an automatic flush runs.
    ///
    /// Zero flushes on every added document.
    pub threshold: usize,
    /// Field used to find existing copies of documents without identity,
    /// unless a document names its own.
    pub unique_attr: Option<String>,
}

impl Default for BulkWriterConfig {
    fn default() -> Self {
        BulkWriterConfig {
            threshold: DEFAULT_THRESHOLD,
            unique_attr: None,
        }
    }
}

/// Summary of one flush that reached the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Documents written by the bulk insert
    pub inserted: usize,
    /// Documents written by upsert, including merged ones
    pub updated: usize,
    /// Pending inserts turned into updates because the store already had them
    pub merged: usize,
    /// Unique-attribute lookup queries issued
    pub lookups: usize,
    /// Wall time spent in the flush
    pub elapsed: Duration,
}

/// What a call to [`BulkWriter::flush`](super::BulkWriter::flush) did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Not forced and below the threshold: nothing was sent to the store.
    Skipped,
    /// The reconciliation-and-write pass ran to completion.
    Flushed(FlushStats),
}

impl FlushOutcome {
    /// Returns `true` when nothing was sent to the store.
    pub fn is_skipped(&self) -> bool {
        matches!(self, FlushOutcome::Skipped)
    }

    /// The flush summary, if the flush ran.
    pub fn stats(&self) -> Option<&FlushStats> {
        match self {
            FlushOutcome::Skipped => None,
            FlushOutcome::Flushed(stats) => Some(stats),
        }
    }
}

/// Point-in-time view of the documents waiting for the next flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingCounts {
    /// Documents added since the last successful flush
    pub total: usize,
    /// Pending documents without identity
    pub inserts: usize,
    /// Pending documents with identity
    pub updates: usize,
}
