//! Application initialization.
//!
//! This module provides logger setup. Database pools are created explicitly
//! through [`crate::storage::init_db_pool_with_path`] and passed to the
//! collections that use them.

mod logger;

// Re-export public API
pub use logger::init_logger_with;
