//! The swarm objective: simulate one candidate parameter vector and score it.

use std::sync::Arc;

use argmin::core::{CostFunction, Error as ArgminError};

use crate::cost::{self, Cost};
use crate::domain::ObservationSet;
use crate::error::CompareError;
use crate::models::{Model, Simulator};

/// Cost assigned to candidates whose simulation diverged or whose cost came
/// out non-finite. Large enough to dominate any realistic fit, so the swarm
/// steers away from the region instead of the whole run aborting.
pub const DIVERGENT_COST: f64 = 1e30;

/// Binds one model, its simulator, the shared timespan/observations, and the
/// cost configuration into an optimization objective.
#[derive(Clone)]
pub struct SwarmObjective {
    pub(crate) model: Arc<dyn Model>,
    pub(crate) simulator: Arc<dyn Simulator>,
    pub(crate) timespan: Arc<[f64]>,
    pub(crate) observations: Option<Arc<ObservationSet>>,
    pub(crate) cost: Cost,
}

impl SwarmObjective {
    pub fn new(
        model: Arc<dyn Model>,
        simulator: Arc<dyn Simulator>,
        timespan: Arc<[f64]>,
        observations: Option<Arc<ObservationSet>>,
        cost: Cost,
    ) -> Self {
        Self {
            model,
            simulator,
            timespan,
            observations,
            cost,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Evaluate the configured cost for one candidate parameter vector.
    ///
    /// `Ok(None)` means the candidate diverged (simulator failure or
    /// non-finite cost); `Err` means the problem itself is misconfigured and
    /// this model's run cannot proceed.
    pub(crate) fn evaluate(&self, theta: &[f64]) -> Result<Option<f64>, CompareError> {
        let trajectories = match self.simulator.simulate(self.model.as_ref(), &self.timespan, theta)
        {
            Ok(t) => t,
            Err(_) => return Ok(None),
        };
        let c = cost::evaluate(
            &self.cost,
            self.model.as_ref(),
            &trajectories,
            self.observations.as_deref(),
        )?;
        Ok(c.is_finite().then_some(c))
    }
}

impl CostFunction for SwarmObjective {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, ArgminError> {
        match self.evaluate(theta)? {
            Some(c) => Ok(c),
            None => Ok(DIVERGENT_COST),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Observation;
    use crate::error::SimulationError;
    use crate::models::{ParamSpec, Trajectories};

    struct Line;

    impl Model for Line {
        fn name(&self) -> &str {
            "line"
        }

        fn free_parameters(&self) -> Vec<ParamSpec> {
            vec![ParamSpec::new("slope", -10.0, 10.0)]
        }
    }

    /// `x(t) = slope · t`, failing when the slope is negative.
    struct LineSimulator;

    impl Simulator for LineSimulator {
        fn simulate(
            &self,
            _model: &dyn Model,
            timespan: &[f64],
            theta: &[f64],
        ) -> Result<Trajectories, SimulationError> {
            let slope = theta[0];
            if slope < 0.0 {
                return Err(SimulationError("negative slope".into()));
            }
            let mut t = Trajectories::new();
            t.insert("x", timespan.iter().map(|&ti| slope * ti).collect());
            Ok(t)
        }
    }

    fn objective(observable: &str) -> SwarmObjective {
        let mut set = ObservationSet::new();
        set.insert(observable, Observation::new(vec![0.0, 2.0, 4.0]));
        SwarmObjective::new(
            Arc::new(Line),
            Arc::new(LineSimulator),
            vec![0.0, 1.0, 2.0].into(),
            Some(Arc::new(set)),
            Cost::SumSquaredError,
        )
    }

    #[test]
    fn exact_candidate_has_zero_cost() {
        let obj = objective("x");
        assert_eq!(obj.cost(&vec![2.0]).unwrap(), 0.0);
    }

    #[test]
    fn simulator_failure_becomes_dominating_cost() {
        let obj = objective("x");
        assert_eq!(obj.cost(&vec![-1.0]).unwrap(), DIVERGENT_COST);
    }

    #[test]
    fn configuration_error_propagates_instead_of_masking() {
        let obj = objective("not_an_output");
        let err = obj.cost(&vec![2.0]).unwrap_err();
        let inner = CompareError::from_argmin(err);
        assert!(matches!(inner, CompareError::UnknownObservable { .. }));
    }
}
