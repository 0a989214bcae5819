//! Utility functions for date and string formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{format_countdown, format_date, format_short, format_time_range, truncate};
