//! Model and simulator traits plus the trajectory container.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SimulationError;

/// One free parameter of a candidate model.
///
/// The `[lower, upper]` range is used to derive default swarm search bounds
/// when the caller does not supply explicit
/// [`SearchBounds`](crate::domain::SearchBounds) for the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
        }
    }
}

/// A candidate dynamical-systems model.
///
/// Models are immutable from this crate's perspective: a stable unique name
/// (the row key in comparison output) and an enumerable set of free
/// parameters. How the model's equations are expressed is entirely between
/// the model and the [`Simulator`] that integrates it.
pub trait Model: Send + Sync {
    /// Unique name, used as the row key in comparison output.
    fn name(&self) -> &str;

    /// The model's free parameters, in the order the optimizer sees them.
    fn free_parameters(&self) -> Vec<ParamSpec>;
}

/// Named observable trajectories over a timespan, one value per timepoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectories {
    series: BTreeMap<String, Vec<f64>>,
}

impl Trajectories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, observable: impl Into<String>, values: Vec<f64>) {
        self.series.insert(observable.into(), values);
    }

    /// The simulated series for one observable, if the simulation produced it.
    pub fn observable(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.series.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// The simulation engine boundary.
///
/// A concrete simulator is constructed by the caller with whatever options it
/// needs (solver tolerances, step control, ...); those options are fields of
/// the simulator value, not part of this interface. Invoked with a candidate
/// parameter vector, it returns trajectories indexable by observable name.
///
/// Returning `Err` signals divergence for that candidate; during a swarm run
/// the candidate is assigned a dominating cost and the search continues.
pub trait Simulator: Send + Sync {
    fn simulate(
        &self,
        model: &dyn Model,
        timespan: &[f64],
        theta: &[f64],
    ) -> Result<Trajectories, SimulationError>;
}
