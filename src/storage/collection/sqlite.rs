//! SQLite-backed document collection.
//!
//! Documents live as JSON text in the `documents` table, keyed by
//! `(collection, id)` where `id` is the canonical JSON encoding of the
//! document's `_id`. Lookups by field value use `json_extract`, and
//! [`SqliteCollection::create_index`] adds matching expression indexes.

use async_trait::async_trait;
use log::{debug, trace};
use serde_json::{Map, Value};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error_handling::CollectionError;
use crate::storage::models::{Document, Filter, ID_FIELD};

use super::DocumentCollection;

/// A named collection of JSON documents stored in SQLite.
#[derive(Debug, Clone)]
pub struct SqliteCollection {
    pool: SqlitePool,
    name: String,
}

impl SqliteCollection {
    /// Creates a handle on collection `name`. The schema must already be migrated.
    pub fn new(pool: SqlitePool, name: impl Into<String>) -> Self {
        SqliteCollection {
            pool,
            name: name.into(),
        }
    }

    /// Collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates an expression index on `field` so value lookups avoid a table scan.
    pub async fn create_index(&self, field: &str) -> Result<(), CollectionError> {
        let path = json_path_literal(field)?;
        let index_name = format!("idx_documents_{}", sanitize_identifier(field));
        let sql = format!(
            "CREATE INDEX IF NOT EXISTS \"{index_name}\" ON documents (collection, json_extract(body, {path}))"
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        debug!("Ensured index {} on field '{}'", index_name, field);
        Ok(())
    }

    /// Number of documents in the collection.
    pub async fn count(&self) -> Result<i64, CollectionError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(self.name.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Fetches a single document by identity.
    pub async fn find_by_id(&self, id: &Value) -> Result<Option<Document>, CollectionError> {
        let key = serde_json::to_string(id)?;
        let row = sqlx::query("SELECT body FROM documents WHERE collection = ? AND id = ?")
            .bind(self.name.as_str())
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(decode_body(row.try_get("body")?)?)),
            None => Ok(None),
        }
    }

    /// Every document in the collection, oldest first.
    pub async fn find_all(&self) -> Result<Vec<Document>, CollectionError> {
        let rows = sqlx::query("SELECT body FROM documents WHERE collection = ? ORDER BY rowid")
            .bind(self.name.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| decode_body(row.try_get("body")?))
            .collect()
    }

    /// Validates the document and returns its identity key and encoded body,
    /// assigning a fresh identity when it has none.
    fn encode(document: &Document, position: usize) -> Result<(String, String), CollectionError> {
        validate_document(document)
            .map_err(|reason| CollectionError::Rejected { position, reason })?;

        let mut fields = document.fields().clone();
        if !fields.contains_key(ID_FIELD) {
            fields.insert(
                ID_FIELD.to_string(),
                Value::String(Uuid::new_v4().simple().to_string()),
            );
        }
        let key = serde_json::to_string(&fields[ID_FIELD])?;
        let body = serde_json::to_string(&fields)?;
        Ok((key, body))
    }
}

#[async_trait]
impl DocumentCollection for SqliteCollection {
    async fn find(
        &self,
        filter: &Filter,
        fields: &[&str],
    ) -> Result<Vec<Document>, CollectionError> {
        let Filter::In { field, values } = filter;
        if values.is_empty() {
            return Ok(Vec::new());
        }

        // All candidates travel as one JSON array parameter; json_each yields
        // them with the same SQL types json_extract produces on the stored side
        let path = json_path_literal(field)?;
        let sql = format!(
            "SELECT body FROM documents WHERE collection = ? AND json_extract(body, {path}) IN (SELECT value FROM json_each(?)) ORDER BY rowid"
        );
        let candidates = serde_json::to_string(values)?;

        let rows = sqlx::query(&sql)
            .bind(self.name.as_str())
            .bind(candidates)
            .fetch_all(&self.pool)
            .await?;
        trace!(
            "find on '{}' by '{}' ({} values) matched {} documents",
            self.name,
            field,
            values.len(),
            rows.len()
        );

        rows.iter()
            .map(|row| -> Result<Document, CollectionError> {
                let document = decode_body(row.try_get("body")?)?;
                Ok(project(document, fields))
            })
            .collect()
    }

    async fn insert_many(&self, documents: &[Document]) -> Result<(), CollectionError> {
        if documents.is_empty() {
            return Ok(());
        }

        // Encode everything up front so a rejected document never opens a transaction
        let encoded = documents
            .iter()
            .enumerate()
            .map(|(position, document)| Self::encode(document, position))
            .collect::<Result<Vec<_>, _>>()?;

        let now = chrono::Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;
        for (position, (key, body)) in encoded.into_iter().enumerate() {
            let result = sqlx::query(
                "INSERT INTO documents (collection, id, body, created_at_ms, updated_at_ms)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(self.name.as_str())
            .bind(key.as_str())
            .bind(body)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await;

            if let Err(e) = result {
                return Err(match e {
                    sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                        CollectionError::Rejected {
                            position,
                            reason: format!("duplicate identity {key}"),
                        }
                    }
                    other => CollectionError::SqlError(other),
                });
            }
        }
        tx.commit().await?;

        debug!("Inserted {} documents into '{}'", documents.len(), self.name);
        Ok(())
    }

    async fn save(&self, document: &Document) -> Result<(), CollectionError> {
        let (key, body) = Self::encode(document, 0)?;
        let now = chrono::Utc::now().timestamp_millis();
        sqlx::query(
            "INSERT INTO documents (collection, id, body, created_at_ms, updated_at_ms)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(collection, id) DO UPDATE SET
                body = excluded.body,
                updated_at_ms = excluded.updated_at_ms",
        )
        .bind(self.name.as_str())
        .bind(key)
        .bind(body)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn decode_body(body: String) -> Result<Document, CollectionError> {
    let fields: Map<String, Value> = serde_json::from_str(&body)?;
    Ok(Document::from_map(fields))
}

/// Keeps the identity plus the requested fields. An empty projection keeps everything.
fn project(document: Document, fields: &[&str]) -> Document {
    if fields.is_empty() {
        return document;
    }
    let mut body = document.into_map();
    let mut projected = Map::new();
    if let Some(id) = body.remove(ID_FIELD) {
        projected.insert(ID_FIELD.to_string(), id);
    }
    for field in fields {
        if let Some(value) = body.remove(*field) {
            projected.insert((*field).to_string(), value);
        }
    }
    Document::from_map(projected)
}

/// Builds the SQL string literal for the JSON path of a top-level field.
fn json_path_literal(field: &str) -> Result<String, CollectionError> {
    if field.is_empty() || field.contains('"') {
        return Err(CollectionError::Rejected {
            position: 0,
            reason: format!("field name {field:?} cannot be used in a lookup"),
        });
    }
    Ok(format!("'$.\"{}\"'", field.replace('\'', "''")))
}

/// Maps a field name to an identifier suffix. ASCII alphanumerics are kept and
/// every other byte becomes `_` plus two hex digits, so distinct fields never
/// share an index name (`a.b` -> `a_2eb`, `a_b` -> `a_5fb`).
fn sanitize_identifier(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for byte in field.bytes() {
        if byte.is_ascii_alphanumeric() {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("_{byte:02x}"));
        }
    }
    out
}

/// Applies the refusals of a document store: no `$`-prefixed or NUL-bearing
/// field names at any depth, and a scalar identity.
fn validate_document(document: &Document) -> Result<(), String> {
    if let Some(id) = document.id() {
        if id.is_array() || id.is_object() {
            return Err(format!("identity must be a scalar value, got {id}"));
        }
    }
    validate_fields(document.fields())
}

fn validate_fields(fields: &Map<String, Value>) -> Result<(), String> {
    for (name, value) in fields {
        if name.starts_with('$') {
            return Err(format!("field name '{name}' starts with '$'"));
        }
        if name.contains('\0') {
            return Err(format!("field name {name:?} contains a NUL character"));
        }
        match value {
            Value::Object(nested) => validate_fields(nested)?,
            Value::Array(items) => {
                for item in items {
                    if let Value::Object(nested) = item {
                        validate_fields(nested)?;
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}
