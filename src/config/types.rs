//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    DB_PATH, DEFAULT_COLLECTION, DEFAULT_THRESHOLD, ENV_COLLECTION, ENV_DB_PATH, ENV_THRESHOLD,
    ENV_UNIQUE_ATTR,
};
use crate::storage::BulkWriterConfig;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Import configuration.
///
/// Usable programmatically (with `..Default::default()`) or parsed from the
/// command line. Options not given on the command line fall back to their
/// `BULK_UPSERT_*` environment variables, then to the defaults.
///
/// # Examples
///
/// ```bash
/// # Import JSON lines into the default collection
/// bulk_upsert people.jsonl
///
/// # Merge on email, flushing every 500 documents
/// bulk_upsert people.jsonl --unique-attr email --threshold 500
///
/// # Read from stdin into a custom database and collection
/// cat photos.jsonl | bulk_upsert - --db-path ./photos.db --collection photos --index path
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bulk_upsert",
    about = "Upserts JSON-lines documents into a SQLite document collection in batches."
)]
pub struct Config {
    /// File of JSON documents, one per line (`-` reads stdin)
    #[arg(value_parser)]
    pub file: PathBuf,

    /// Database path (SQLite file)
    #[arg(long, value_parser, env = ENV_DB_PATH, default_value = DB_PATH)]
    pub db_path: PathBuf,

    /// Collection to write into
    #[arg(long, env = ENV_COLLECTION, default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// Pending documents that trigger a flush (0 flushes every document)
    #[arg(long, env = ENV_THRESHOLD, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: usize,

    /// Field identifying existing documents for records without `_id`
    #[arg(long, env = ENV_UNIQUE_ATTR)]
    pub unique_attr: Option<String>,

    /// Field to index for lookups (repeatable)
    #[arg(long = "index", value_name = "FIELD")]
    pub indexes: Vec<String>,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl Config {
    /// The bulk writer settings of this configuration.
    pub fn writer_config(&self) -> BulkWriterConfig {
        BulkWriterConfig {
            threshold: self.threshold,
            unique_attr: self.unique_attr.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file: PathBuf::from("-"),
            db_path: PathBuf::from(DB_PATH),
            collection: DEFAULT_COLLECTION.to_string(),
            threshold: DEFAULT_THRESHOLD,
            unique_attr: None,
            indexes: Vec::new(),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}
