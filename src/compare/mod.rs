//! The comparator: independent swarm fits across candidate models,
//! aggregated into one comparison table.
//!
//! Each model gets its own eagerly-built [`SwarmSearch`]; runs never interact
//! and may execute sequentially ([`Comparator::compare`]) or across worker
//! threads ([`Comparator::compare_parallel`]) with identical table contents
//! modulo optimizer stochasticity. Row order always equals model-list order.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use rayon::prelude::*;

use crate::cost::Cost;
use crate::domain::{
    ComparisonRow, ComparisonTable, FitScore, ObservationSet, RowOutcome, RunSettings,
    SearchBounds,
};
use crate::error::CompareError;
use crate::fit::{SwarmObjective, SwarmSearch, SwarmTuning, akaike_ic};
use crate::models::{Model, Simulator};
use crate::report::format_progress;

/// Everything `prepare` needs to bind each candidate model to a runnable
/// optimization problem.
///
/// The observation set and timespan are shared read-only across all models;
/// simulator options (tolerances, step control, ...) live inside the concrete
/// simulator value.
#[derive(Clone)]
pub struct PrepareConfig {
    /// Timespan for model simulations.
    pub timespan: Vec<f64>,
    /// Shared observed data. `None` is only valid with [`Cost::Custom`].
    pub observations: Option<ObservationSet>,
    /// The simulation engine.
    pub simulator: Arc<dyn Simulator>,
    /// Cost estimator selection.
    pub cost: Cost,
    /// Optimizer tuning forwarded to every model's solver.
    pub tuning: SwarmTuning,
    /// Per-model search-bound overrides, index-aligned with the model list.
    /// A `None` entry (or `None` overall) derives bounds from the model's
    /// declared parameter ranges.
    pub swarm_bounds: Option<Vec<Option<SearchBounds>>>,
}

impl PrepareConfig {
    pub fn new(
        timespan: Vec<f64>,
        observations: ObservationSet,
        simulator: Arc<dyn Simulator>,
        cost: Cost,
    ) -> Self {
        Self {
            timespan,
            observations: Some(observations),
            simulator,
            cost,
            tuning: SwarmTuning::default(),
            swarm_bounds: None,
        }
    }
}

/// Owns the candidate-model list and orchestrates the comparison.
pub struct Comparator {
    models: Vec<Arc<dyn Model>>,
    searches: Option<Vec<SwarmSearch>>,
    observations: Option<Arc<ObservationSet>>,
    cancel: Arc<AtomicBool>,
    table: Option<ComparisonTable>,
}

impl Comparator {
    pub fn new(models: Vec<Arc<dyn Model>>) -> Self {
        Self {
            models,
            searches: None,
            observations: None,
            cancel: Arc::new(AtomicBool::new(false)),
            table: None,
        }
    }

    /// Number of candidate models being compared.
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Build one swarm search per candidate model.
    ///
    /// Must be called before [`Comparator::compare`]. Calling it again
    /// overwrites the previously prepared state (and drops any previous
    /// table). Every model is bound to the same observation set, which is
    /// what makes [`Comparator::total_observation_count`] well-defined.
    pub fn prepare(&mut self, config: PrepareConfig) -> Result<(), CompareError> {
        let PrepareConfig {
            timespan,
            observations,
            simulator,
            cost,
            tuning,
            swarm_bounds,
        } = config;

        cost.validate(observations.as_ref())?;
        if let Some(obs) = &observations {
            obs.validate(timespan.len())?;
        }
        if let Some(bounds_list) = &swarm_bounds {
            if bounds_list.len() != self.models.len() {
                return Err(CompareError::SwarmParamsMismatch {
                    got: bounds_list.len(),
                    expected: self.models.len(),
                });
            }
        }

        let observations = observations.map(Arc::new);
        let timespan: Arc<[f64]> = timespan.into();

        let mut searches = Vec::with_capacity(self.models.len());
        for (i, model) in self.models.iter().enumerate() {
            let bounds = match swarm_bounds.as_ref().and_then(|b| b[i].clone()) {
                Some(explicit) => {
                    explicit.validate(model.name(), model.free_parameters().len())?;
                    explicit
                }
                None => default_bounds(model.as_ref())?,
            };
            let objective = SwarmObjective::new(
                Arc::clone(model),
                Arc::clone(&simulator),
                Arc::clone(&timespan),
                observations.clone(),
                cost.clone(),
            );
            searches.push(
                SwarmSearch::new(objective, bounds, tuning)
                    .with_cancel_flag(Arc::clone(&self.cancel)),
            );
        }

        self.searches = Some(searches);
        self.observations = observations;
        self.table = None;
        Ok(())
    }

    /// Run every model's swarm search in list order and assemble the table.
    ///
    /// A model whose run fails keeps its row with the failure reason; other
    /// models still complete. Returns [`CompareError::NotPrepared`] (leaving
    /// prior state untouched) when [`Comparator::prepare`] was never called.
    pub fn compare(&mut self, settings: &RunSettings) -> Result<&ComparisonTable, CompareError> {
        let searches = self.searches.as_ref().ok_or(CompareError::NotPrepared)?;

        let mut rows = Vec::with_capacity(searches.len());
        for search in searches {
            if settings.verbose {
                println!("running swarm on model {}", search.model_name());
            }
            let row = run_one(search, settings);
            if settings.verbose {
                println!("{}", format_progress(&row));
            }
            rows.push(row);
        }

        let table = self.table.insert(ComparisonTable { rows });
        Ok(table)
    }

    /// Like [`Comparator::compare`], but runs the models across worker
    /// threads. Row order still equals model-list order; progress lines are
    /// printed after the join to keep them ordered.
    pub fn compare_parallel(
        &mut self,
        settings: &RunSettings,
    ) -> Result<&ComparisonTable, CompareError> {
        let searches = self.searches.as_ref().ok_or(CompareError::NotPrepared)?;

        let rows: Vec<ComparisonRow> = searches
            .par_iter()
            .map(|search| run_one(search, settings))
            .collect();
        if settings.verbose {
            for row in &rows {
                println!("{}", format_progress(row));
            }
        }

        let table = self.table.insert(ComparisonTable { rows });
        Ok(table)
    }

    /// The table assembled by the most recent comparison, if any.
    pub fn table(&self) -> Option<&ComparisonTable> {
        self.table.as_ref()
    }

    /// Flag checked between optimizer generations; setting it aborts the
    /// remaining runs without losing already-completed models' rows.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Total observed datapoints across all observables of the shared
    /// observation set — the `n_data` for [`crate::fit::bayesian_ic`].
    /// `None` before `prepare`, or when comparing with a custom cost and no
    /// observations.
    pub fn total_observation_count(&self) -> Option<usize> {
        self.observations.as_ref().map(|o| o.total_points())
    }
}

fn run_one(search: &SwarmSearch, settings: &RunSettings) -> ComparisonRow {
    let model = search.model_name().to_string();
    match search.run(settings) {
        Ok(outcome) => {
            let k = outcome.theta_best.len();
            let ml = -outcome.min_cost;
            ComparisonRow {
                model,
                outcome: RowOutcome::Fitted(FitScore {
                    min_cost: outcome.min_cost,
                    aic: akaike_ic(k, ml),
                    n_theta: k,
                    theta_best: outcome.theta_best,
                }),
            }
        }
        Err(err) => ComparisonRow {
            model,
            outcome: RowOutcome::Failed(err.to_string()),
        },
    }
}

/// Default swarm bounds from the model's declared parameter ranges.
fn default_bounds(model: &dyn Model) -> Result<SearchBounds, CompareError> {
    let params = model.free_parameters();
    if params.is_empty() {
        return Err(CompareError::InvalidBounds {
            model: model.name().to_string(),
            reason: "model declares no free parameters".to_string(),
        });
    }
    let mut lower = Vec::with_capacity(params.len());
    let mut upper = Vec::with_capacity(params.len());
    for p in &params {
        if !(p.lower.is_finite() && p.upper.is_finite() && p.lower < p.upper) {
            return Err(CompareError::InvalidBounds {
                model: model.name().to_string(),
                reason: format!("parameter '{}' has range [{}, {}]", p.name, p.lower, p.upper),
            });
        }
        lower.push(p.lower);
        upper.push(p.upper);
    }
    Ok(SearchBounds::new(lower, upper))
}
