//! Bulk writer implementation.
//!
//! This module provides the BulkWriter struct and its methods for
//! collecting documents and flushing them to a collection.

mod flush;

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

use crate::error_handling::BufferError;
use crate::storage::collection::DocumentCollection;
use crate::storage::models::Document;

use super::types::{BulkWriterConfig, FlushOutcome, PendingCounts};

/// Documents waiting for the next flush.
///
/// Invariant: `total == pending_inserts.len() + pending_updates.len()`.
#[derive(Debug, Default)]
struct BufferState {
    pending_updates: Vec<Document>,
    pending_inserts: Vec<Document>,
    total: usize,
}

impl BufferState {
    fn push(&mut self, document: Document) {
        if document.has_id() {
            self.pending_updates.push(document);
        } else {
            self.pending_inserts.push(document);
        }
        self.total += 1;
    }

    fn sync_total(&mut self) {
        self.total = self.pending_inserts.len() + self.pending_updates.len();
    }
}

/// Write-coalescing buffer in front of a document collection.
///
/// Documents with an `_id` are queued as updates, the rest as inserts. Once the
/// number of queued documents reaches the threshold, the writer flushes inline:
/// it looks up pending inserts by their unique attribute (one query per distinct
/// attribute name), turns the ones that already exist into updates, bulk inserts
/// the remainder and upserts the updates one at a time.
///
/// All state sits behind a single async mutex, so `update` and `flush` are
/// atomic with respect to each other even when called from many tasks. Share a
/// writer between tasks with an `Arc`.
pub struct BulkWriter<C> {
    collection: C,
    config: BulkWriterConfig,
    state: Mutex<BufferState>,
    inserted_count: AtomicU64,
    updated_count: AtomicU64,
    flush_count: AtomicU64,
}

impl<C: DocumentCollection> BulkWriter<C> {
    /// Creates a writer flushing every `threshold` documents, optionally using
    /// `unique_attr` to detect documents that already exist in the store.
    pub fn new(collection: C, threshold: usize, unique_attr: Option<String>) -> Self {
        Self::with_config(
            collection,
            BulkWriterConfig {
                threshold,
                unique_attr,
            },
        )
    }

    /// Creates a writer from a [`BulkWriterConfig`].
    pub fn with_config(collection: C, config: BulkWriterConfig) -> Self {
        log::debug!(
            "Bulk writer initialized (threshold: {}, unique attribute: {})",
            config.threshold,
            config.unique_attr.as_deref().unwrap_or("<none>")
        );
        BulkWriter {
            collection,
            config,
            state: Mutex::new(BufferState::default()),
            inserted_count: AtomicU64::new(0),
            updated_count: AtomicU64::new(0),
            flush_count: AtomicU64::new(0),
        }
    }

    /// Queues documents, flushing inline each time the threshold is reached.
    ///
    /// The threshold is checked after every single document, so one call can
    /// trigger several flushes. If an inline flush fails, the error is returned
    /// and the documents of this call that were not yet queued are dropped;
    /// everything already queued stays pending.
    pub async fn update(&self, documents: Vec<Document>) -> Result<(), BufferError> {
        if documents.is_empty() {
            return Ok(());
        }

        let mut state = self.state.lock().await;
        for document in documents {
            state.push(document);
            if state.total >= self.config.threshold {
                self.flush_locked(&mut state, false).await?;
            }
        }
        Ok(())
    }

    /// Queues a single document. See [`BulkWriter::update`].
    pub async fn update_one(&self, document: Document) -> Result<(), BufferError> {
        self.update(vec![document]).await
    }

    /// Flushes pending documents.
    ///
    /// Without `force`, nothing happens unless the threshold has been reached.
    pub async fn flush(&self, force: bool) -> Result<FlushOutcome, BufferError> {
        let mut state = self.state.lock().await;
        self.flush_locked(&mut state, force).await
    }

    /// Forced flush, typically used to drain the writer at the end of a run.
    pub async fn flush_all(&self) -> Result<FlushOutcome, BufferError> {
        self.flush(true).await
    }

    /// Snapshot of the pending documents.
    pub async fn pending(&self) -> PendingCounts {
        let state = self.state.lock().await;
        PendingCounts {
            total: state.total,
            inserts: state.pending_inserts.len(),
            updates: state.pending_updates.len(),
        }
    }

    /// Documents written by bulk insert over the writer's lifetime.
    pub fn inserted_count(&self) -> u64 {
        self.inserted_count.load(Ordering::SeqCst)
    }

    /// Documents written by upsert over the writer's lifetime.
    pub fn updated_count(&self) -> u64 {
        self.updated_count.load(Ordering::SeqCst)
    }

    /// Flushes that ran to completion over the writer's lifetime.
    pub fn flush_count(&self) -> u64 {
        self.flush_count.load(Ordering::SeqCst)
    }

    /// Settings this writer was created with.
    pub fn config(&self) -> &BulkWriterConfig {
        &self.config
    }

    /// The underlying collection.
    pub fn collection(&self) -> &C {
        &self.collection
    }
}
