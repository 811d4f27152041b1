//! Information-criterion calculators.
//!
//! Pure and stateless. Lower scores are preferred under either criterion;
//! these functions compute, they do not rank.

/// Akaike information criterion: `2k - 2·ML`.
///
/// `k` is the model's free-parameter count and `max_likelihood` the
/// maximized-likelihood surrogate (the negative of the minimum cost).
pub fn akaike_ic(k: usize, max_likelihood: f64) -> f64 {
    2.0 * k as f64 - 2.0 * max_likelihood
}

/// Bayesian information criterion: `ln(n_data)·k - 2·ML`.
///
/// # Panics
/// Panics if `n_data == 0`: the logarithm is undefined there and the caller
/// must supply a positive data count. No internal clamping is applied.
pub fn bayesian_ic(k: usize, max_likelihood: f64, n_data: usize) -> f64 {
    assert!(n_data > 0, "bayesian_ic requires n_data > 0");
    (n_data as f64).ln() * k as f64 - 2.0 * max_likelihood
}
