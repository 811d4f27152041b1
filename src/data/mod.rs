//! Built-in closed-form model family and synthetic observation generation.
//!
//! These are the batteries-included candidates for demos and tests: a nested
//! exponential-decay family whose trajectories need no ODE integration, plus
//! a noisy-data generator for exercising the full comparison loop.

pub mod sample;

pub use sample::*;
