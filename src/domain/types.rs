//! Shared domain types.
//!
//! These types are intentionally lightweight and serializable so they can be
//! used in-memory during fitting, exported to CSV/JSON, and reloaded later
//! for inspection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CompareError;

/// Selects which simulated timepoints correspond to the (possibly sparser)
/// observed values.
///
/// Absent selector means the observed values align one-to-one with the full
/// timespan; equal lengths are required and validated at prepare time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TimeSelector {
    /// Indices into the simulated timespan, in observation order.
    Indices(Vec<usize>),
    /// Boolean mask over the simulated timespan (`true` = observed).
    Mask(Vec<bool>),
}

impl TimeSelector {
    /// Number of timepoints this selector keeps.
    pub fn selected_count(&self) -> usize {
        match self {
            TimeSelector::Indices(idxs) => idxs.len(),
            TimeSelector::Mask(mask) => mask.iter().filter(|&&m| m).count(),
        }
    }
}

/// One observable's measured data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Observed values, ordered by time.
    pub values: Vec<f64>,
    /// Per-point standard deviations. Required by the normal log-density
    /// cost estimator; optional otherwise.
    pub sigma: Option<Vec<f64>>,
    /// Optional mapping from simulated timepoints to observed values.
    pub selector: Option<TimeSelector>,
}

impl Observation {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            sigma: None,
            selector: None,
        }
    }

    pub fn with_sigma(mut self, sigma: Vec<f64>) -> Self {
        self.sigma = Some(sigma);
        self
    }

    pub fn with_selector(mut self, selector: TimeSelector) -> Self {
        self.selector = Some(selector);
        self
    }
}

/// Observed data shared read-only across all candidate models, keyed by
/// observable name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationSet {
    entries: BTreeMap<String, Observation>,
}

impl ObservationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, observable: impl Into<String>, observation: Observation) {
        self.entries.insert(observable.into(), observation);
    }

    pub fn get(&self, observable: &str) -> Option<&Observation> {
        self.entries.get(observable)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Observation)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of observed datapoints across all observables.
    ///
    /// This is the `n_data` fed into the Bayesian information criterion.
    pub fn total_points(&self) -> usize {
        self.entries.values().map(|o| o.values.len()).sum()
    }

    /// Validate shape against the simulation timespan length.
    ///
    /// Checks everything that can be checked before the first simulation:
    /// sigma lengths, selector ranges, and the observed-vs-selected point
    /// counts. Observable names are checked against the model's actual
    /// outputs at run time, when the first trajectory exists.
    pub fn validate(&self, timespan_len: usize) -> Result<(), CompareError> {
        for (name, obs) in self.iter() {
            if let Some(sigma) = &obs.sigma {
                if sigma.len() != obs.values.len() {
                    return Err(CompareError::SigmaLengthMismatch {
                        observable: name.to_string(),
                        sigma_len: sigma.len(),
                        value_len: obs.values.len(),
                    });
                }
            }
            let selected = match &obs.selector {
                Some(TimeSelector::Indices(idxs)) => {
                    if let Some(&bad) = idxs.iter().find(|&&i| i >= timespan_len) {
                        return Err(CompareError::SelectorOutOfRange {
                            observable: name.to_string(),
                            index: bad,
                            len: timespan_len,
                        });
                    }
                    idxs.len()
                }
                Some(TimeSelector::Mask(mask)) => {
                    if mask.len() != timespan_len {
                        return Err(CompareError::MaskLengthMismatch {
                            observable: name.to_string(),
                            mask_len: mask.len(),
                            series_len: timespan_len,
                        });
                    }
                    mask.iter().filter(|&&m| m).count()
                }
                None => timespan_len,
            };
            if selected != obs.values.len() {
                return Err(CompareError::LengthMismatch {
                    observable: name.to_string(),
                    observed: obs.values.len(),
                    selected,
                });
            }
        }
        Ok(())
    }
}

/// Explicit swarm search-space bounds for one model, index-aligned with the
/// model's free parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchBounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl SearchBounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self { lower, upper }
    }

    pub(crate) fn validate(&self, model: &str, expected: usize) -> Result<(), CompareError> {
        if self.lower.len() != expected || self.upper.len() != expected {
            return Err(CompareError::BoundsMismatch {
                model: model.to_string(),
                got: self.lower.len().max(self.upper.len()),
                expected,
            });
        }
        for (i, (lo, hi)) in self.lower.iter().zip(&self.upper).enumerate() {
            if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                return Err(CompareError::InvalidBounds {
                    model: model.to_string(),
                    reason: format!("parameter {i} has bounds [{lo}, {hi}]"),
                });
            }
        }
        Ok(())
    }
}

/// Settings for one comparison run, shared by every model's swarm search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    /// Swarm size per model.
    pub particles: usize,
    /// Maximum optimizer generations per model.
    pub iterations: u64,
    /// Early-stop once the best-cost improvement between generations falls
    /// below this.
    pub stop_threshold: f64,
    /// Print per-model progress lines to stdout. Informational only; never
    /// affects returned data.
    pub verbose: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            particles: 20,
            iterations: 50,
            stop_threshold: 1e-5,
            verbose: false,
        }
    }
}

/// Per-model fit summary after a successful swarm run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitScore {
    /// Minimum cost found by the swarm (lower is better).
    pub min_cost: f64,
    /// Akaike information criterion, `2k - 2·ML`.
    pub aic: f64,
    /// Number of free parameters (`k`).
    pub n_theta: usize,
    /// Best-fit parameter vector, length `n_theta`.
    pub theta_best: Vec<f64>,
}

impl FitScore {
    /// Maximized-likelihood surrogate: the negative of the minimum cost.
    pub fn max_likelihood(&self) -> f64 {
        -self.min_cost
    }
}

/// Outcome for one candidate model.
///
/// A failed model keeps its row (with the reason) so row count and order stay
/// aligned with the candidate list; it is never fabricated as a zero-cost fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RowOutcome {
    Fitted(FitScore),
    Failed(String),
}

impl RowOutcome {
    pub fn score(&self) -> Option<&FitScore> {
        match self {
            RowOutcome::Fitted(score) => Some(score),
            RowOutcome::Failed(_) => None,
        }
    }
}

/// One row of the comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub model: String,
    pub outcome: RowOutcome,
}

/// The assembled comparison across all candidate models.
///
/// Rows are in candidate-model order, not sorted by score; ranking is the
/// caller's responsibility (or use [`ComparisonTable::sorted_by_aic`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, model: &str) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.model == model)
    }

    /// Rows ordered by ascending AIC; failed rows sort last.
    pub fn sorted_by_aic(&self) -> Vec<&ComparisonRow> {
        let mut rows: Vec<&ComparisonRow> = self.rows.iter().collect();
        rows.sort_by(|a, b| {
            let ka = a.outcome.score().map(|s| s.aic).unwrap_or(f64::INFINITY);
            let kb = b.outcome.score().map(|s| s.aic).unwrap_or(f64::INFINITY);
            ka.partial_cmp(&kb).unwrap_or(std::cmp::Ordering::Equal)
        });
        rows
    }
}
