//! Reporting utilities: formatted terminal output for comparison results.
//!
//! We keep formatting code in one place so:
//! - the fitting/comparison code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

pub mod format;

pub use format::*;
