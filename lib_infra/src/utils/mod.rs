//! # Utilities Module
//!
//! General helpers shared by the loggers and connectors.

/// Formatting of the current local time in the library's fixed layouts.
pub mod time;
