//! Error types for the comparison pipeline.

use thiserror::Error;

/// Boundary error returned by [`Simulator`](crate::models::Simulator)
/// implementations.
///
/// Simulators are external collaborators; all we need from a failed
/// integration is a displayable reason. During a swarm run a simulation
/// failure is treated as a divergent candidate, not as a fatal error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("simulation failed: {0}")]
pub struct SimulationError(pub String);

/// Errors surfaced by the comparator and the per-model swarm searches.
#[derive(Debug, Error)]
pub enum CompareError {
    /// Usage-order error: `compare` was called before `prepare`. Non-fatal;
    /// the comparator's prior state is left untouched.
    #[error("comparison requested before prepare; call Comparator::prepare first")]
    NotPrepared,

    #[error("cost estimator '{estimator}' requires a non-empty observation set")]
    MissingObservations { estimator: &'static str },

    #[error("normal log-density cost requires uncertainties for observable '{observable}'")]
    MissingUncertainty { observable: String },

    #[error("observable '{observable}': {sigma_len} uncertainties for {value_len} observed values")]
    SigmaLengthMismatch {
        observable: String,
        sigma_len: usize,
        value_len: usize,
    },

    /// The observation set references an observable the model's simulation
    /// does not produce. Surfaced at run time for the offending model.
    #[error("model '{model}' produced no trajectory for observable '{observable}'")]
    UnknownObservable { model: String, observable: String },

    #[error("observable '{observable}': {observed} observed values but {selected} selected timepoints")]
    LengthMismatch {
        observable: String,
        observed: usize,
        selected: usize,
    },

    #[error("observable '{observable}': time selector refers to timepoint {index} but the series has {len}")]
    SelectorOutOfRange {
        observable: String,
        index: usize,
        len: usize,
    },

    #[error("observable '{observable}': mask has {mask_len} entries for {series_len} timepoints")]
    MaskLengthMismatch {
        observable: String,
        mask_len: usize,
        series_len: usize,
    },

    #[error("model '{model}': {got} bound pairs supplied for {expected} free parameters")]
    BoundsMismatch {
        model: String,
        got: usize,
        expected: usize,
    },

    #[error("model '{model}': invalid search bounds ({reason})")]
    InvalidBounds { model: String, reason: String },

    #[error("swarm-params list has {got} entries for {expected} models")]
    SwarmParamsMismatch { got: usize, expected: usize },

    #[error("optimizer error: {0}")]
    Optimizer(argmin::core::Error),

    /// Every parameter set the swarm ever evaluated diverged, so there is no
    /// valid best candidate to report.
    #[error("model '{model}': no valid candidate found; every evaluated parameter set diverged")]
    NoValidCandidate { model: String },

    #[error("model '{model}': run cancelled")]
    Cancelled { model: String },

    #[error("export failed: {0}")]
    Io(#[from] std::io::Error),
}

impl CompareError {
    /// Recover a `CompareError` that crossed the optimizer boundary.
    ///
    /// Configuration errors raised inside the objective travel through
    /// `argmin` as opaque errors; unwrapping them here keeps the per-model
    /// failure reason precise.
    pub(crate) fn from_argmin(err: argmin::core::Error) -> Self {
        match err.downcast::<CompareError>() {
            Ok(inner) => inner,
            Err(other) => CompareError::Optimizer(other),
        }
    }
}
