//! Error type definitions.
//!
//! This module defines all error types used throughout the crate.

use log::SetLoggerError;
use thiserror::Error;

use crate::storage::models::Document;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Error types for database bootstrap operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Schema migration error.
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}

/// Errors returned by a [`DocumentCollection`](crate::storage::DocumentCollection).
///
/// `Rejected` means the store refused the document itself; re-sending the same
/// document will fail the same way. The other variants are operational failures.
#[derive(Error, Debug)]
pub enum CollectionError {
    /// The store refused a document. `position` is the index of the offending
    /// document within the batch that was sent (0 for single-document calls).
    #[error("Document rejected by store at position {position}: {reason}")]
    Rejected {
        /// Index of the offending document in the submitted batch
        position: usize,
        /// Why the store refused it
        reason: String,
    },

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// A stored body could not be encoded or decoded.
    #[error("Document encoding error: {0}")]
    EncodingError(#[from] serde_json::Error),
}

impl CollectionError {
    /// Returns `true` when the store refused the document itself.
    pub fn is_rejection(&self) -> bool {
        matches!(self, CollectionError::Rejected { .. })
    }
}

/// The write phase of a flush in which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WritePhase {
    /// The bulk insert of documents without identity
    Insert,
    /// The per-document upsert of documents with identity
    Update,
}

impl WritePhase {
    /// Lowercase phase name used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            WritePhase::Insert => "insert",
            WritePhase::Update => "update",
        }
    }
}

impl std::fmt::Display for WritePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by [`BulkWriter`](crate::storage::BulkWriter) flushes.
///
/// Every variant leaves the writer in a recoverable state: documents that did
/// not reach the store are still pending and a later flush retries them.
#[derive(Error, Debug)]
pub enum BufferError {
    /// The store refused a document during the given phase.
    #[error("Document rejected by store during {phase}: {reason} (document: {document})")]
    DocumentRejected {
        /// Phase that attempted the write
        phase: WritePhase,
        /// The offending document
        document: Box<Document>,
        /// Reason reported by the store
        reason: String,
    },

    /// The unique-attribute lookup failed; no pending document was moved.
    #[error("Reconciliation failed for unique attribute '{attribute}': {source}")]
    ReconciliationFailed {
        /// Unique attribute whose lookup failed
        attribute: String,
        /// Underlying collection error
        #[source]
        source: CollectionError,
    },

    /// A write failed for an operational reason.
    #[error("Write failed during {phase}: {source}")]
    WriteFailed {
        /// Phase that attempted the write
        phase: WritePhase,
        /// Underlying collection error
        #[source]
        source: CollectionError,
    },
}

impl BufferError {
    /// Builds the error for a failed write, attaching the offending document
    /// when the store rejected one of `batch`.
    pub(crate) fn from_write(phase: WritePhase, batch: &[Document], error: CollectionError) -> Self {
        match error {
            CollectionError::Rejected { position, reason } => match batch.get(position) {
                Some(document) => BufferError::DocumentRejected {
                    phase,
                    document: Box::new(document.clone()),
                    reason,
                },
                None => BufferError::WriteFailed {
                    phase,
                    source: CollectionError::Rejected { position, reason },
                },
            },
            source => BufferError::WriteFailed { phase, source },
        }
    }

    /// The phase this error happened in, if it happened while writing.
    pub fn phase(&self) -> Option<WritePhase> {
        match self {
            BufferError::DocumentRejected { phase, .. } | BufferError::WriteFailed { phase, .. } => {
                Some(*phase)
            }
            BufferError::ReconciliationFailed { .. } => None,
        }
    }
}
