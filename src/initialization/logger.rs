//! Logger initialization.
//!
//! This module provides functions to initialize the logger with custom formatting.

use std::io::Write;

use crate::config::LogFormat;
use crate::error_handling::InitializationError;
use colored::*;
use log::LevelFilter;

/// Initializes the logger with the specified level and format.
///
/// Configures `env_logger` with custom formatting. Supports both plain text
/// (timestamped, with colors) and JSON formats for structured logging.
///
/// The logger reads from the `RUST_LOG` environment variable by default, but
/// the provided `level` parameter will override it. This allows developers to
/// use `RUST_LOG=debug` for quick debugging while still supporting explicit
/// CLI control via `--log-level`.
///
/// # Arguments
///
/// * `level` - Minimum log level to display (overrides `RUST_LOG` if set)
/// * `format` - Log format (Plain or Json)
///
/// # Returns
///
/// `Ok(())` if initialization succeeds, or an error if logger setup fails.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if logger initialization fails.
///
/// # Examples
///
/// ```bash
/// # Use RUST_LOG for quick debugging (no CLI args needed)
/// RUST_LOG=debug bulk_upsert people.jsonl
///
/// # Override with CLI args (takes precedence)
/// RUST_LOG=debug bulk_upsert people.jsonl --log-level info
///
/// # Per-module filtering via RUST_LOG
/// RUST_LOG=bulk_upsert::storage=trace bulk_upsert people.jsonl
/// ```
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    colored::control::set_override(true);

    // Read from RUST_LOG environment variable first, then override with CLI arg
    let mut builder = env_logger::Builder::from_default_env();

    // Override with CLI-provided level (takes precedence over RUST_LOG)
    builder.filter_level(level);
    builder.filter_module("sqlx", LevelFilter::Warn);
    builder.filter_module("bulk_upsert", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| writeln!(buf, "{}", json_line(record)));
        }
        LogFormat::Plain => {
            builder.format(|buf, record| writeln!(buf, "{}", plain_line(record)));
        }
    }

    // Use try_init() instead of init() to avoid panicking if logger is already initialized
    // This is important for tests where logger may be initialized multiple times
    builder.try_init().map_err(InitializationError::from)?;

    Ok(())
}

/// One log record as a JSON object: millisecond timestamp, level, target and
/// the message as a JSON string.
fn json_line(record: &log::Record) -> String {
    format!(
        "{{\"ts\":{},\"level\":\"{}\",\"target\":\"{}\",\"msg\":{}}}",
        chrono::Utc::now().timestamp_millis(),
        record.level(),
        record.target(),
        serde_json::to_string(&record.args().to_string()).unwrap_or_else(|_| "\"\"".into())
    )
}

/// One log record as `time target [LEVEL] message`, colored per level.
fn plain_line(record: &log::Record) -> String {
    let level = record.level();
    let colored_level = match level {
        log::Level::Error => level.to_string().red(),
        log::Level::Warn => level.to_string().yellow(),
        log::Level::Info => level.to_string().green(),
        log::Level::Debug => level.to_string().blue(),
        log::Level::Trace => level.to_string().purple(),
    };
    format!(
        "{} {} [{}] {}",
        chrono::Local::now().format("%H:%M:%S%.3f").to_string().dimmed(),
        record.target().cyan(),
        colored_level,
        record.args()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_plain_format() {
        // env_logger can only be initialized once per process, so a second
        // initialization reports an error instead of panicking
        let _ = env_logger::try_init();
        let result = init_logger_with(LevelFilter::Info, LogFormat::Plain);
        assert!(result.is_err());
    }

    #[test]
    fn test_init_logger_json_format() {
        let _ = env_logger::try_init();
        let result = init_logger_with(LevelFilter::Debug, LogFormat::Json);
        assert!(matches!(result, Err(InitializationError::LoggerError(_))));
    }

    #[test]
    fn test_json_line_is_one_parseable_object() {
        let line = json_line(
            &log::Record::builder()
                .args(format_args!("flushed \"people\"\nin 3ms"))
                .level(log::Level::Warn)
                .target("bulk_upsert::storage")
                .build(),
        );

        assert!(!line.contains('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&line).expect("log line must be JSON");
        assert_eq!(parsed["level"], "WARN");
        assert_eq!(parsed["target"], "bulk_upsert::storage");
        assert_eq!(parsed["msg"], "flushed \"people\"\nin 3ms");
        assert!(parsed["ts"].as_i64().is_some());
    }

    #[test]
    fn test_plain_line_has_target_level_and_message() {
        let line = plain_line(
            &log::Record::builder()
                .args(format_args!("Flush completed: 2 inserted"))
                .level(log::Level::Info)
                .target("bulk_upsert::storage")
                .build(),
        );

        assert!(line.contains("bulk_upsert::storage"));
        assert!(line.contains("INFO"));
        assert!(line.ends_with("Flush completed: 2 inserted"));
        assert!(line.find("bulk_upsert::storage") < line.find("INFO"));
    }
}
