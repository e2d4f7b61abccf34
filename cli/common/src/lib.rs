//! Shared utilities for the cloudsweep CLI.
//!
//! Logging setup, the log-level argument and the plain-text table and number
//! formatting used for console output.

pub mod args;
pub mod format;
pub mod logging;

pub use args::LogLevel;
pub use format::{format_number, render_numbered, render_table};
pub use logging::init_logging;
