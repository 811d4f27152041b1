//! Domain types used throughout the comparison pipeline.
//!
//! This module defines:
//!
//! - observed-data containers (`ObservationSet`, `Observation`, `TimeSelector`)
//! - run configuration (`RunSettings`, `SearchBounds`)
//! - comparison outputs (`ComparisonTable`, `ComparisonRow`, `FitScore`)

pub mod types;

pub use types::*;
