//! Exponential-decay model family with a closed-form simulator.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Observation, ObservationSet};
use crate::error::SimulationError;
use crate::models::{Model, ParamSpec, Simulator, Trajectories};

/// Observable produced by every member of the decay family.
pub const DECAY_OBSERVABLE: &str = "x";

/// Nested variants of `x(t) = b + a·exp(-k·t)`, from most to least
/// parsimonious. Each adds one free parameter over the previous, which makes
/// the family a natural testbed for information-criterion selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecayShape {
    /// `x(t) = exp(-k·t)`; free parameter `k`.
    Rate,
    /// `x(t) = a·exp(-k·t)`; free parameters `a`, `k`.
    ScaledRate,
    /// `x(t) = b + a·exp(-k·t)`; free parameters `a`, `b`, `k`.
    ScaledRateOffset,
}

impl DecayShape {
    fn parameters(self) -> Vec<ParamSpec> {
        let k = ParamSpec::new("k", 1e-3, 5.0);
        let a = ParamSpec::new("a", 0.1, 10.0);
        let b = ParamSpec::new("b", 0.0, 5.0);
        match self {
            DecayShape::Rate => vec![k],
            DecayShape::ScaledRate => vec![a, k],
            DecayShape::ScaledRateOffset => vec![a, b, k],
        }
    }
}

/// One named member of the decay family.
#[derive(Debug, Clone)]
pub struct DecayModel {
    name: String,
    shape: DecayShape,
}

impl DecayModel {
    pub fn new(name: impl Into<String>, shape: DecayShape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }

    pub fn shape(&self) -> DecayShape {
        self.shape
    }
}

impl Model for DecayModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn free_parameters(&self) -> Vec<ParamSpec> {
        self.shape.parameters()
    }
}

/// Evaluates the decay family analytically, no integrator involved.
///
/// The parameter vector is interpreted positionally by length: `[k]`,
/// `[a, k]`, or `[a, b, k]`, matching the order each [`DecayShape`] declares.
pub struct ClosedFormSimulator;

impl Simulator for ClosedFormSimulator {
    fn simulate(
        &self,
        _model: &dyn Model,
        timespan: &[f64],
        theta: &[f64],
    ) -> Result<Trajectories, SimulationError> {
        let (a, b, k) = match theta {
            [k] => (1.0, 0.0, *k),
            [a, k] => (*a, 0.0, *k),
            [a, b, k] => (*a, *b, *k),
            _ => {
                return Err(SimulationError(format!(
                    "expected 1 to 3 parameters, got {}",
                    theta.len()
                )));
            }
        };

        let values: Vec<f64> = timespan.iter().map(|&t| b + a * (-k * t).exp()).collect();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(SimulationError("non-finite trajectory value".into()));
        }

        let mut trajectories = Trajectories::new();
        trajectories.insert(DECAY_OBSERVABLE, values);
        Ok(trajectories)
    }
}

/// Simulate `model` at `theta_true` and add i.i.d. Gaussian noise of standard
/// deviation `sigma` to the trajectory. The returned observation carries
/// `sigma` alongside the values, so it is usable with every built-in cost.
///
/// Seeded, so identical inputs reproduce identical datasets.
pub fn noisy_observations(
    model: &dyn Model,
    simulator: &dyn Simulator,
    theta_true: &[f64],
    timespan: &[f64],
    sigma: f64,
    seed: u64,
) -> Result<ObservationSet, SimulationError> {
    let trajectories = simulator.simulate(model, timespan, theta_true)?;
    let normal = Normal::new(0.0, sigma)
        .map_err(|e| SimulationError(format!("noise distribution error: {e}")))?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut set = ObservationSet::new();
    for (observable, values) in trajectories.iter() {
        let noisy: Vec<f64> = values.iter().map(|&v| v + normal.sample(&mut rng)).collect();
        let n = noisy.len();
        set.insert(observable, Observation::new(noisy).with_sigma(vec![sigma; n]));
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_nest_by_parameter_count() {
        let counts: Vec<usize> = [
            DecayShape::Rate,
            DecayShape::ScaledRate,
            DecayShape::ScaledRateOffset,
        ]
        .iter()
        .map(|s| s.parameters().len())
        .collect();
        assert_eq!(counts, vec![1, 2, 3]);
    }

    #[test]
    fn closed_form_matches_hand_computation() {
        let model = DecayModel::new("offset", DecayShape::ScaledRateOffset);
        let t = ClosedFormSimulator
            .simulate(&model, &[0.0, 1.0], &[2.0, 0.5, 1.0])
            .unwrap();
        let x = t.observable(DECAY_OBSERVABLE).unwrap();
        assert!((x[0] - 2.5).abs() < 1e-12);
        assert!((x[1] - (0.5 + 2.0 * (-1.0_f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn wrong_parameter_count_is_a_simulation_failure() {
        let model = DecayModel::new("rate", DecayShape::Rate);
        let err = ClosedFormSimulator
            .simulate(&model, &[0.0, 1.0], &[1.0, 2.0, 3.0, 4.0])
            .unwrap_err();
        assert!(err.to_string().contains("got 4"));
    }

    #[test]
    fn noisy_observations_are_reproducible_and_carry_sigma() {
        let model = DecayModel::new("rate", DecayShape::Rate);
        let timespan: Vec<f64> = (0..10).map(|i| i as f64 * 0.2).collect();
        let first =
            noisy_observations(&model, &ClosedFormSimulator, &[1.0], &timespan, 0.05, 42).unwrap();
        let second =
            noisy_observations(&model, &ClosedFormSimulator, &[1.0], &timespan, 0.05, 42).unwrap();

        let obs = first.get(DECAY_OBSERVABLE).unwrap();
        assert_eq!(obs.values.len(), 10);
        assert_eq!(obs.sigma.as_deref(), Some(&[0.05; 10][..]));
        assert_eq!(obs.values, second.get(DECAY_OBSERVABLE).unwrap().values);
    }

    #[test]
    fn different_seeds_differ() {
        let model = DecayModel::new("rate", DecayShape::Rate);
        let timespan: Vec<f64> = (0..10).map(|i| i as f64 * 0.2).collect();
        let a = noisy_observations(&model, &ClosedFormSimulator, &[1.0], &timespan, 0.05, 1)
            .unwrap();
        let b = noisy_observations(&model, &ClosedFormSimulator, &[1.0], &timespan, 0.05, 2)
            .unwrap();
        assert_ne!(
            a.get(DECAY_OBSERVABLE).unwrap().values,
            b.get(DECAY_OBSERVABLE).unwrap().values
        );
    }
}
