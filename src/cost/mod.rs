//! Cost estimators scoring simulated trajectories against observed data.
//!
//! The estimator is a closed enum fixed at configuration time; unknown kinds
//! are unrepresentable. Built-in estimators need an observation set, the
//! custom variant only consumes the scalar its function returns.

use std::fmt;
use std::sync::Arc;

use crate::domain::{Observation, ObservationSet, TimeSelector};
use crate::error::CompareError;
use crate::models::{Model, Trajectories};

/// ln(2π), for the normal log-density.
const LN_2PI: f64 = 1.837_877_066_409_345_3;

/// Caller-supplied cost function over a model and its simulated trajectories.
pub type CustomCostFn = dyn Fn(&dyn Model, &Trajectories) -> f64 + Send + Sync;

/// Cost estimator selection.
#[derive(Clone)]
pub enum Cost {
    /// Sum over observables and time-selected points of squared differences
    /// between simulated and observed values. No variance normalization.
    SumSquaredError,
    /// Same sum, divided by the total point count.
    MeanSquaredError,
    /// Negative log-density of the observed values under a normal
    /// distribution centered at the simulated values, with the supplied
    /// per-point standard deviation. Uncertainties are required.
    NormalLogDensity,
    /// Fully custom cost over `(model, simulated trajectories)`.
    Custom(Arc<CustomCostFn>),
}

impl Cost {
    /// Wrap a closure as a custom cost estimator.
    pub fn custom(f: impl Fn(&dyn Model, &Trajectories) -> f64 + Send + Sync + 'static) -> Self {
        Cost::Custom(Arc::new(f))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Cost::SumSquaredError => "sse",
            Cost::MeanSquaredError => "mse",
            Cost::NormalLogDensity => "norm_logpdf",
            Cost::Custom(_) => "custom",
        }
    }

    /// Configuration-time validation against the observation set.
    ///
    /// Built-in estimators require a non-empty observation set; the normal
    /// log-density additionally requires uncertainties for every observable.
    pub(crate) fn validate(&self, observations: Option<&ObservationSet>) -> Result<(), CompareError> {
        if let Cost::Custom(_) = self {
            return Ok(());
        }
        let obs = observations.filter(|o| !o.is_empty()).ok_or(
            CompareError::MissingObservations {
                estimator: self.label(),
            },
        )?;
        if let Cost::NormalLogDensity = self {
            for (name, entry) in obs.iter() {
                if entry.sigma.is_none() {
                    return Err(CompareError::MissingUncertainty {
                        observable: name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Evaluate the configured estimator for one model's simulated trajectories.
///
/// Errors here are configuration errors (missing observable, shape mismatch),
/// not divergence; divergence is decided upstream from the simulator result.
pub(crate) fn evaluate(
    cost: &Cost,
    model: &dyn Model,
    trajectories: &Trajectories,
    observations: Option<&ObservationSet>,
) -> Result<f64, CompareError> {
    match cost {
        Cost::Custom(f) => Ok(f(model, trajectories)),
        Cost::SumSquaredError => {
            let (sse, _) = squared_error(cost, model, trajectories, observations)?;
            Ok(sse)
        }
        Cost::MeanSquaredError => {
            let (sse, n) = squared_error(cost, model, trajectories, observations)?;
            Ok(sse / n as f64)
        }
        Cost::NormalLogDensity => neg_normal_log_density(cost, model, trajectories, observations),
    }
}

/// The simulated values aligned with one observable's observed values.
fn aligned_series(
    model: &dyn Model,
    trajectories: &Trajectories,
    name: &str,
    obs: &Observation,
) -> Result<Vec<f64>, CompareError> {
    let sim = trajectories
        .observable(name)
        .ok_or_else(|| CompareError::UnknownObservable {
            model: model.name().to_string(),
            observable: name.to_string(),
        })?;

    let selected: Vec<f64> = match &obs.selector {
        None => sim.to_vec(),
        Some(TimeSelector::Indices(idxs)) => {
            let mut out = Vec::with_capacity(idxs.len());
            for &i in idxs {
                let v = sim.get(i).copied().ok_or(CompareError::SelectorOutOfRange {
                    observable: name.to_string(),
                    index: i,
                    len: sim.len(),
                })?;
                out.push(v);
            }
            out
        }
        Some(TimeSelector::Mask(mask)) => {
            if mask.len() != sim.len() {
                return Err(CompareError::MaskLengthMismatch {
                    observable: name.to_string(),
                    mask_len: mask.len(),
                    series_len: sim.len(),
                });
            }
            sim.iter().zip(mask).filter(|&(_, &m)| m).map(|(v, _)| *v).collect()
        }
    };

    if selected.len() != obs.values.len() {
        return Err(CompareError::LengthMismatch {
            observable: name.to_string(),
            observed: obs.values.len(),
            selected: selected.len(),
        });
    }
    Ok(selected)
}

fn squared_error(
    cost: &Cost,
    model: &dyn Model,
    trajectories: &Trajectories,
    observations: Option<&ObservationSet>,
) -> Result<(f64, usize), CompareError> {
    let obs_set = observations.ok_or(CompareError::MissingObservations {
        estimator: cost.label(),
    })?;
    let mut sse = 0.0;
    let mut n = 0;
    for (name, obs) in obs_set.iter() {
        let sim = aligned_series(model, trajectories, name, obs)?;
        for (s, y) in sim.iter().zip(&obs.values) {
            let r = s - y;
            sse += r * r;
        }
        n += obs.values.len();
    }
    Ok((sse, n))
}

fn neg_normal_log_density(
    cost: &Cost,
    model: &dyn Model,
    trajectories: &Trajectories,
    observations: Option<&ObservationSet>,
) -> Result<f64, CompareError> {
    let obs_set = observations.ok_or(CompareError::MissingObservations {
        estimator: cost.label(),
    })?;
    let mut nll = 0.0;
    for (name, obs) in obs_set.iter() {
        let sigma = obs.sigma.as_ref().ok_or_else(|| CompareError::MissingUncertainty {
            observable: name.to_string(),
        })?;
        let sim = aligned_series(model, trajectories, name, obs)?;
        for ((mu, y), s) in sim.iter().zip(&obs.values).zip(sigma) {
            let z = (y - mu) / s;
            nll += 0.5 * (LN_2PI + z * z) + s.ln();
        }
    }
    Ok(nll)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Observation;
    use crate::models::ParamSpec;

    struct Toy;

    impl Model for Toy {
        fn name(&self) -> &str {
            "toy"
        }

        fn free_parameters(&self) -> Vec<ParamSpec> {
            vec![ParamSpec::new("k", 0.0, 1.0)]
        }
    }

    fn traj(values: &[f64]) -> Trajectories {
        let mut t = Trajectories::new();
        t.insert("x", values.to_vec());
        t
    }

    fn obs_set(obs: Observation) -> ObservationSet {
        let mut set = ObservationSet::new();
        set.insert("x", obs);
        set
    }

    #[test]
    fn sse_over_all_points() {
        let set = obs_set(Observation::new(vec![1.0, 2.0, 3.0]));
        let t = traj(&[1.5, 2.0, 2.0]);
        let c = evaluate(&Cost::SumSquaredError, &Toy, &t, Some(&set)).unwrap();
        assert!((c - (0.25 + 0.0 + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn mse_divides_by_total_count() {
        let set = obs_set(Observation::new(vec![1.0, 2.0]));
        let t = traj(&[2.0, 4.0]);
        let c = evaluate(&Cost::MeanSquaredError, &Toy, &t, Some(&set)).unwrap();
        assert!((c - (1.0 + 4.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn indices_selector_picks_sparse_points() {
        let set = obs_set(
            Observation::new(vec![1.0, 3.0]).with_selector(TimeSelector::Indices(vec![0, 2])),
        );
        let t = traj(&[1.0, 100.0, 4.0]);
        let c = evaluate(&Cost::SumSquaredError, &Toy, &t, Some(&set)).unwrap();
        assert!((c - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mask_selector_picks_sparse_points() {
        let set = obs_set(
            Observation::new(vec![2.0]).with_selector(TimeSelector::Mask(vec![false, true, false])),
        );
        let t = traj(&[9.0, 2.5, 9.0]);
        let c = evaluate(&Cost::SumSquaredError, &Toy, &t, Some(&set)).unwrap();
        assert!((c - 0.25).abs() < 1e-12);
    }

    #[test]
    fn norm_logpdf_matches_closed_form() {
        // Single point, mu = y, sigma = 1: -log N = 0.5*ln(2π).
        let set = obs_set(Observation::new(vec![2.0]).with_sigma(vec![1.0]));
        let t = traj(&[2.0]);
        let c = evaluate(&Cost::NormalLogDensity, &Toy, &t, Some(&set)).unwrap();
        assert!((c - 0.5 * LN_2PI).abs() < 1e-12);
    }

    #[test]
    fn norm_logpdf_requires_sigma() {
        let set = obs_set(Observation::new(vec![2.0]));
        let t = traj(&[2.0]);
        let err = evaluate(&Cost::NormalLogDensity, &Toy, &t, Some(&set)).unwrap_err();
        assert!(matches!(err, CompareError::MissingUncertainty { .. }));
        // Caught earlier, at configuration time, too.
        let err = Cost::NormalLogDensity.validate(Some(&set)).unwrap_err();
        assert!(matches!(err, CompareError::MissingUncertainty { .. }));
    }

    #[test]
    fn missing_observable_is_a_configuration_error() {
        let mut set = ObservationSet::new();
        set.insert("y", Observation::new(vec![1.0]));
        let t = traj(&[1.0]);
        let err = evaluate(&Cost::SumSquaredError, &Toy, &t, Some(&set)).unwrap_err();
        assert!(matches!(err, CompareError::UnknownObservable { .. }));
    }

    #[test]
    fn builtin_estimators_require_observations() {
        let t = traj(&[1.0]);
        let err = evaluate(&Cost::SumSquaredError, &Toy, &t, None).unwrap_err();
        assert!(matches!(err, CompareError::MissingObservations { .. }));
        assert!(Cost::SumSquaredError.validate(None).is_err());
        assert!(Cost::custom(|_, _| 0.0).validate(None).is_ok());
    }

    #[test]
    fn custom_cost_consumes_only_the_scalar() {
        let cost = Cost::custom(|_, t| t.observable("x").map(|s| s[0]).unwrap_or(f64::NAN));
        let t = traj(&[7.5]);
        let c = evaluate(&cost, &Toy, &t, None).unwrap();
        assert_eq!(c, 7.5);
    }
}
