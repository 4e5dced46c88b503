//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (defaults, logging cadence)
//! - Log level and format options
//! - The import configuration, usable both as a library struct and as CLI options

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Config, LogFormat, LogLevel};
