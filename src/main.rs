//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `bulk_upsert` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use bulk_upsert::initialization::init_logger_with;
use bulk_upsert::{run_import, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load BULK_UPSERT_* settings from a .env file if there is one; CLI flags
    // still take precedence and built-in defaults apply when neither is set
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    match run_import(config).await {
        Ok(report) => {
            println!(
                "Imported {} document{} into '{}' ({} inserted, {} updated, {} skipped) in {:.1}s",
                report.submitted,
                if report.submitted == 1 { "" } else { "s" },
                report.collection,
                report.inserted,
                report.updated,
                report.skipped,
                report.elapsed_seconds
            );
            println!("Results saved in {}", report.db_path.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("bulk_upsert error: {:#}", e);
            process::exit(1);
        }
    }
}
