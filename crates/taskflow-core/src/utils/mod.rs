//! Utility functions for display formatting.

pub mod format;

pub use format::{extract_error_message, format_date, format_datetime, truncate_string};
