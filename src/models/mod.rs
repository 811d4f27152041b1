//! External-collaborator boundaries: candidate models and the trajectory
//! simulator.
//!
//! Models and simulators are supplied by the caller; this crate only consumes
//! them through the small traits defined here.

pub mod model;

pub use model::*;
