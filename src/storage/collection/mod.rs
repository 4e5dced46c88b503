//! Document collection abstraction.
//!
//! The bulk writer talks to the store only through [`DocumentCollection`], so any
//! backend offering lookup-by-value, bulk insert and upsert-by-identity can sit
//! behind it. [`SqliteCollection`] is the bundled implementation.

mod sqlite;

use async_trait::async_trait;

use crate::error_handling::CollectionError;
use crate::storage::models::{Document, Filter};

pub use sqlite::SqliteCollection;

/// Capability surface the bulk writer needs from a document store.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Returns the documents matching `filter`, projected to `fields`.
    ///
    /// The identity field is always part of the projection.
    async fn find(&self, filter: &Filter, fields: &[&str])
        -> Result<Vec<Document>, CollectionError>;

    /// Inserts all documents in a single call.
    ///
    /// Documents without an identity get one assigned by the store.
    async fn insert_many(&self, documents: &[Document]) -> Result<(), CollectionError>;

    /// Upserts one document keyed by its identity, or inserts it with a fresh
    /// identity when it has none.
    async fn save(&self, document: &Document) -> Result<(), CollectionError>;
}

#[async_trait]
impl<C: DocumentCollection + ?Sized> DocumentCollection for std::sync::Arc<C> {
    async fn find(
        &self,
        filter: &Filter,
        fields: &[&str],
    ) -> Result<Vec<Document>, CollectionError> {
        (**self).find(filter, fields).await
    }

    async fn insert_many(&self, documents: &[Document]) -> Result<(), CollectionError> {
        (**self).insert_many(documents).await
    }

    async fn save(&self, document: &Document) -> Result<(), CollectionError> {
        (**self).save(document).await
    }
}
