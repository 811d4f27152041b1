//! Per-model swarm fitting and information criteria.
//!
//! Responsibilities:
//!
//! - bind one model + cost configuration into an `argmin` objective
//! - drive the particle-swarm solver with early stopping and cancellation
//! - pure AIC/BIC calculators

pub mod criteria;
pub mod objective;
pub mod swarm;

pub use criteria::*;
pub use objective::*;
pub use swarm::*;
