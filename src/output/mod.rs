//! Output formatting module
//!
//! Provides various output formats for run results.

mod formatter;

pub use formatter::{write_run_document, OutputFormat, ResultFormatter, RunDocument};
