//! `swarm-compare` library crate.
//!
//! Model selection across candidate dynamical-systems models: each model's
//! free parameters are fitted to a shared observation set with a
//! particle-swarm optimizer, the minimum cost becomes a maximized-likelihood
//! surrogate, and models are scored with information criteria (AIC, and BIC
//! on request).
//!
//! The two expensive collaborators are external:
//!
//! - the trajectory simulator (`models::Simulator`) — this crate never
//!   integrates ODEs itself
//! - the swarm search algorithm (`argmin`'s `ParticleSwarm`) — this crate
//!   drives it, it does not reimplement it

pub mod compare;
pub mod cost;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod models;
pub mod report;
