//! bulk_upsert library: batched, de-duplicating document writes
//!
//! This library provides a write-coalescing buffer ([`BulkWriter`]) that sits in
//! front of a document collection. It accumulates upserts in memory, decides for
//! each document without identity whether it is really new (by looking up an
//! application-chosen unique attribute in the store), and writes everything in as
//! few round trips as possible once a threshold is reached or a flush is forced.
//!
//! A SQLite-backed collection ([`SqliteCollection`]) and a JSON-lines import
//! runner ([`run_import`]) are included.
//!
//! # Example
//!
//! ```no_run
//! use bulk_upsert::{init_db_pool_with_path, run_migrations, BulkWriter, Document, SqliteCollection};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = init_db_pool_with_path(std::path::Path::new("people.db")).await?;
//! run_migrations(&pool).await?;
//!
//! let people = SqliteCollection::new(pool, "people");
//! let writer = BulkWriter::new(people, 100, Some("email".to_string()));
//!
//! let doc = Document::from_value(json!({"email": "a@x.com", "name": "A"})).unwrap();
//! writer.update_one(doc).await?;
//! writer.flush_all().await?;
//! println!("{} inserted, {} updated", writer.inserted_count(), writer.updated_count());
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

pub mod config;
mod error_handling;
pub mod initialization;
mod storage;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel};
pub use error_handling::{BufferError, CollectionError, DatabaseError, InitializationError, WritePhase};
pub use run::{run_import, ImportReport};
pub use storage::{
    init_db_pool_with_path, run_migrations, BulkWriter, BulkWriterConfig, Document,
    DocumentCollection, Filter, FlushOutcome, FlushStats, PendingCounts, SqliteCollection,
    ID_FIELD,
};

// Internal run module (contains the JSON-lines import loop)
mod run {
    use anyhow::{Context, Result};
    use log::{info, warn};
    use std::path::PathBuf;
    use std::time::Instant;
    use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Split};

    use crate::config::{Config, LOGGING_INTERVAL};
    use crate::storage::{
        init_db_pool_with_path, run_migrations, BulkWriter, Document, DocumentCollection,
        SqliteCollection,
    };

    /// Results of an import run.
    #[derive(Debug, Clone)]
    pub struct ImportReport {
        /// Non-blank, non-comment lines read
        pub total_lines: usize,
        /// Documents handed to the bulk writer
        pub submitted: usize,
        /// Lines that were not a JSON object
        pub skipped: usize,
        /// Documents written by bulk insert
        pub inserted: u64,
        /// Documents written by upsert
        pub updated: u64,
        /// Flushes performed, including the final one
        pub flushes: u64,
        /// Path to the SQLite database
        pub db_path: PathBuf,
        /// Collection written to
        pub collection: String,
        /// Elapsed time in seconds
        pub elapsed_seconds: f64,
    }

    /// Line counters of one import.
    #[derive(Debug, Default)]
    struct LineStats {
        total_lines: usize,
        submitted: usize,
        skipped: usize,
    }

    /// Imports JSON-lines documents into a SQLite collection.
    ///
    /// Reads `config.file` (or stdin for `-`) line by line. Blank lines and lines
    /// starting with `#` are ignored; lines that are not JSON objects are logged
    /// and skipped. Every document goes through a [`BulkWriter`] configured from
    /// `config`, and the writer is drained with a forced flush at the end.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The input file cannot be opened or read
    /// - Database initialization, migration or index creation fails
    /// - A flush fails (the error names the rejected document or failed phase)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bulk_upsert::{run_import, Config};
    /// use std::path::PathBuf;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = Config {
    ///     file: PathBuf::from("people.jsonl"),
    ///     unique_attr: Some("email".to_string()),
    ///     ..Default::default()
    /// };
    /// let report = run_import(config).await?;
    /// println!("{} inserted, {} updated", report.inserted, report.updated);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run_import(config: Config) -> Result<ImportReport> {
        let started = Instant::now();

        let pool = init_db_pool_with_path(&config.db_path)
            .await
            .context("Failed to initialize database pool")?;
        run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        let collection = SqliteCollection::new(pool.clone(), config.collection.clone());
        for field in &config.indexes {
            collection
                .create_index(field)
                .await
                .with_context(|| format!("Failed to create index on '{field}'"))?;
        }

        let writer = BulkWriter::with_config(collection, config.writer_config());
        info!(
            "Importing into collection '{}' (threshold: {}, unique attribute: {})",
            config.collection,
            config.threshold,
            config.unique_attr.as_deref().unwrap_or("<none>")
        );

        let stats = if config.file.as_os_str() == "-" {
            info!("Reading documents from stdin");
            import_lines(BufReader::new(tokio::io::stdin()).split(b'\n'), &writer).await?
        } else {
            let file = tokio::fs::File::open(&config.file)
                .await
                .with_context(|| format!("Failed to open input file {}", config.file.display()))?;
            import_lines(BufReader::new(file).split(b'\n'), &writer).await?
        };

        writer
            .flush_all()
            .await
            .context("Failed to flush remaining documents")?;
        pool.close().await;

        let report = ImportReport {
            total_lines: stats.total_lines,
            submitted: stats.submitted,
            skipped: stats.skipped,
            inserted: writer.inserted_count(),
            updated: writer.updated_count(),
            flushes: writer.flush_count(),
            db_path: config.db_path,
            collection: config.collection,
            elapsed_seconds: started.elapsed().as_secs_f64(),
        };
        info!(
            "Import complete: {} inserted, {} updated, {} skipped in {:.2}s",
            report.inserted, report.updated, report.skipped, report.elapsed_seconds
        );
        Ok(report)
    }

    /// Feeds raw input lines to the writer. Lines are read as bytes so a line
    /// that is not UTF-8 is skipped like any other unparsable line.
    async fn import_lines<R, C>(mut lines: Split<R>, writer: &BulkWriter<C>) -> Result<LineStats>
    where
        R: AsyncBufRead + Unpin,
        C: DocumentCollection,
    {
        let mut stats = LineStats::default();
        let mut next_progress_at = LOGGING_INTERVAL as u64;

        while let Some(raw) = lines
            .next_segment()
            .await
            .context("Failed to read input line")?
        {
            let line = match String::from_utf8(raw) {
                Ok(line) => line,
                Err(e) => {
                    stats.total_lines += 1;
                    stats.skipped += 1;
                    warn!("Skipping line {}: not valid UTF-8 ({})", stats.total_lines, e.utf8_error());
                    continue;
                }
            };
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            stats.total_lines += 1;

            let document = match serde_json::from_str::<serde_json::Value>(trimmed).map(Document::from_value) {
                Ok(Ok(document)) => document,
                Ok(Err(value)) => {
                    warn!(
                        "Skipping line {}: expected a JSON object, got {}",
                        stats.total_lines, value
                    );
                    stats.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!("Skipping line {}: invalid JSON ({})", stats.total_lines, e);
                    stats.skipped += 1;
                    continue;
                }
            };

            writer
                .update_one(document)
                .await
                .with_context(|| format!("Failed to write documents at line {}", stats.total_lines))?;
            stats.submitted += 1;

            let flushes = writer.flush_count();
            if flushes >= next_progress_at {
                info!(
                    "Progress: {} documents submitted, {} inserted, {} updated",
                    stats.submitted,
                    writer.inserted_count(),
                    writer.updated_count()
                );
                next_progress_at = flushes + LOGGING_INTERVAL as u64;
            }
        }

        Ok(stats)
    }
}
