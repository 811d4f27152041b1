//! Per-model swarm search driver.
//!
//! The particle-swarm update rules come from `argmin`'s `ParticleSwarm`
//! solver; this module drives it one generation at a time so that early
//! stopping and cancellation can be checked between generations rather than
//! only at call entry.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use argmin::core::{PopulationState, Problem, Solver, State};
use argmin::solver::particleswarm::{Particle, ParticleSwarm};

use crate::domain::{RunSettings, SearchBounds};
use crate::error::CompareError;
use crate::fit::objective::{DIVERGENT_COST, SwarmObjective};

type SwarmState = PopulationState<Particle<Vec<f64>, f64>, f64>;

/// Optional tuning forwarded to the swarm solver. `None` fields keep the
/// solver's defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SwarmTuning {
    pub inertia: Option<f64>,
    pub cognitive: Option<f64>,
    pub social: Option<f64>,
}

/// Best candidate found by one swarm run.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    /// Best-fit parameter vector, in the model's parameter order.
    pub theta_best: Vec<f64>,
    /// Cost of the best candidate (lower is better).
    pub min_cost: f64,
    /// Generations actually executed; early stopping may cut this short.
    pub iterations: u64,
}

/// One candidate model bound to a runnable optimization problem.
///
/// Construction binds the model, observations, timespan, simulator, and cost
/// configuration; [`SwarmSearch::run`] performs the actual search. Runs are
/// independent across models and hold no shared mutable state, so searches
/// may execute in parallel.
pub struct SwarmSearch {
    objective: SwarmObjective,
    bounds: SearchBounds,
    tuning: SwarmTuning,
    cancel: Option<Arc<AtomicBool>>,
}

impl SwarmSearch {
    pub fn new(objective: SwarmObjective, bounds: SearchBounds, tuning: SwarmTuning) -> Self {
        Self {
            objective,
            bounds,
            tuning,
            cancel: None,
        }
    }

    /// Install a cancellation flag, checked between optimizer generations.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn model_name(&self) -> &str {
        self.objective.model_name()
    }

    pub fn bounds(&self) -> &SearchBounds {
        &self.bounds
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Run the swarm search.
    ///
    /// Executes up to `settings.iterations` generations of
    /// `settings.particles` candidates, stopping early once the best-cost
    /// improvement between generations drops below `settings.stop_threshold`.
    /// Guarantees a valid best candidate on `Ok`: if every evaluated
    /// candidate diverged the run fails with
    /// [`CompareError::NoValidCandidate`] instead of handing back a
    /// placeholder.
    pub fn run(&self, settings: &RunSettings) -> Result<FitOutcome, CompareError> {
        let model = self.model_name().to_string();

        let mut solver: ParticleSwarm<Vec<f64>, f64, _> = ParticleSwarm::new(
            (self.bounds.lower.clone(), self.bounds.upper.clone()),
            settings.particles,
        );
        if let Some(w) = self.tuning.inertia {
            solver = solver
                .with_inertia_factor(w)
                .map_err(CompareError::from_argmin)?;
        }
        if let Some(c) = self.tuning.cognitive {
            solver = solver
                .with_cognitive_factor(c)
                .map_err(CompareError::from_argmin)?;
        }
        if let Some(s) = self.tuning.social {
            solver = solver
                .with_social_factor(s)
                .map_err(CompareError::from_argmin)?;
        }

        let mut problem = Problem::new(self.objective.clone());
        let init: SwarmState = <SwarmState as State>::new();
        let (mut state, _) = solver
            .init(&mut problem, init)
            .map_err(CompareError::from_argmin)?;
        state.update();

        let mut prev_best = state.get_best_cost();
        let mut executed = 0;
        for _ in 0..settings.iterations {
            if self.is_cancelled() {
                return Err(CompareError::Cancelled { model });
            }
            let (next, _) = solver
                .next_iter(&mut problem, state)
                .map_err(CompareError::from_argmin)?;
            state = next;
            state.update();
            state.increment_iter();
            executed += 1;

            let best = state.get_best_cost();
            if prev_best - best < settings.stop_threshold {
                prev_best = best;
                break;
            }
            prev_best = best;
        }

        let min_cost = state.get_best_cost();
        match state.get_best_param() {
            Some(particle) if min_cost < DIVERGENT_COST => Ok(FitOutcome {
                theta_best: particle.position.clone(),
                min_cost,
                iterations: executed,
            }),
            _ => Err(CompareError::NoValidCandidate { model }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::Cost;
    use crate::data::{ClosedFormSimulator, DecayModel, DecayShape};
    use crate::domain::{Observation, ObservationSet};
    use crate::error::SimulationError;
    use crate::models::{Model, ParamSpec, Simulator, Trajectories};

    fn decay_search(cost: Cost, observations: Option<ObservationSet>) -> SwarmSearch {
        let model = Arc::new(DecayModel::new("decay", DecayShape::Rate));
        let objective = SwarmObjective::new(
            model,
            Arc::new(ClosedFormSimulator),
            (0..20).map(|i| i as f64 * 0.1).collect::<Vec<_>>().into(),
            observations.map(Arc::new),
            cost,
        );
        SwarmSearch::new(
            objective,
            SearchBounds::new(vec![1e-3], vec![5.0]),
            SwarmTuning::default(),
        )
    }

    fn exact_observations(k_true: f64) -> ObservationSet {
        let timespan: Vec<f64> = (0..20).map(|i| i as f64 * 0.1).collect();
        let mut set = ObservationSet::new();
        set.insert(
            "x",
            Observation::new(timespan.iter().map(|&t| (-k_true * t).exp()).collect()),
        );
        set
    }

    #[test]
    fn recovers_decay_rate_from_exact_data() {
        let search = decay_search(Cost::SumSquaredError, Some(exact_observations(1.0)));
        let settings = RunSettings {
            particles: 40,
            iterations: 80,
            stop_threshold: 1e-12,
            verbose: false,
        };
        let outcome = search.run(&settings).unwrap();
        assert_eq!(outcome.theta_best.len(), 1);
        assert!(outcome.min_cost < 0.1, "min_cost = {}", outcome.min_cost);
        assert!(
            (outcome.theta_best[0] - 1.0).abs() < 0.3,
            "k = {}",
            outcome.theta_best[0]
        );
    }

    #[test]
    fn constant_custom_cost_reports_zero() {
        let search = decay_search(Cost::custom(|_, _| 0.0), None);
        let outcome = search.run(&RunSettings::default()).unwrap();
        assert_eq!(outcome.min_cost, 0.0);
        // Zero improvement between generations triggers the early stop.
        assert!(outcome.iterations <= 2);
    }

    struct AlwaysDiverges;

    impl Simulator for AlwaysDiverges {
        fn simulate(
            &self,
            _model: &dyn Model,
            _timespan: &[f64],
            _theta: &[f64],
        ) -> Result<Trajectories, SimulationError> {
            Err(SimulationError("stiff".into()))
        }
    }

    #[test]
    fn universal_divergence_fails_explicitly() {
        let model = Arc::new(DecayModel::new("decay", DecayShape::Rate));
        let objective = SwarmObjective::new(
            model,
            Arc::new(AlwaysDiverges),
            vec![0.0, 1.0].into(),
            None,
            Cost::custom(|_, _| 0.0),
        );
        let search = SwarmSearch::new(
            objective,
            SearchBounds::new(vec![0.0], vec![1.0]),
            SwarmTuning::default(),
        );
        let err = search.run(&RunSettings::default()).unwrap_err();
        assert!(matches!(err, CompareError::NoValidCandidate { .. }));
    }

    #[test]
    fn cancellation_is_checked_between_generations() {
        let search = decay_search(Cost::SumSquaredError, Some(exact_observations(1.0)));
        let flag = Arc::new(AtomicBool::new(true));
        let search = search.with_cancel_flag(flag);
        let err = search.run(&RunSettings::default()).unwrap_err();
        assert!(matches!(err, CompareError::Cancelled { .. }));
    }

    #[test]
    fn bad_tuning_is_rejected() {
        let search = SwarmSearch::new(
            decay_search(Cost::custom(|_, _| 0.0), None).objective.clone(),
            SearchBounds::new(vec![0.0], vec![1.0]),
            SwarmTuning {
                inertia: Some(-1.0),
                ..SwarmTuning::default()
            },
        );
        assert!(search.run(&RunSettings::default()).is_err());
    }

    #[test]
    fn free_parameter_order_matches_bounds() {
        let model = DecayModel::new("d", DecayShape::ScaledRate);
        let params: Vec<ParamSpec> = model.free_parameters();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "a");
        assert_eq!(params[1].name, "k");
    }
}
