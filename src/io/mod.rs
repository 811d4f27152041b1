//! Input/output helpers.
//!
//! - comparison-table exports (CSV) (`export`)

pub mod export;

pub use export::*;
