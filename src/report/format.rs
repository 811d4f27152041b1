//! Plain-text rendering of comparison results.

use crate::domain::{ComparisonRow, ComparisonTable, RowOutcome};
use crate::fit::bayesian_ic;

/// One-line progress report for a finished model, printed in verbose runs.
pub fn format_progress(row: &ComparisonRow) -> String {
    match &row.outcome {
        RowOutcome::Fitted(score) => format!(
            "model: {} cost: {} AIC: {} n_theta: {}",
            row.model, score.min_cost, score.aic, score.n_theta
        ),
        RowOutcome::Failed(reason) => format!("model: {} failed: {reason}", row.model),
    }
}

/// Format the full comparison table, one row per candidate model in
/// model-list order. Failed models keep their row with the failure reason in
/// place of the fit columns.
pub fn format_comparison_table(table: &ComparisonTable) -> String {
    let mut out = String::new();

    out.push_str(
        format!(
            "{:<16} {:>14} {:>12} {:>8} {:<32}",
            "model", "cost", "AIC", "n_theta", "theta_best"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!("{:-<16} {:-<14} {:-<12} {:-<8} {:-<32}", "", "", "", "", "").trim_end(),
    );
    out.push('\n');

    for row in &table.rows {
        match &row.outcome {
            RowOutcome::Fitted(score) => {
                out.push_str(
                    format!(
                        "{:<16} {:>14.6} {:>12.4} {:>8} {:<32}",
                        truncate(&row.model, 16),
                        score.min_cost,
                        score.aic,
                        score.n_theta,
                        fmt_vec(&score.theta_best),
                    )
                    .trim_end(),
                );
            }
            RowOutcome::Failed(reason) => {
                out.push_str(
                    format!("{:<16} FAILED: {reason}", truncate(&row.model, 16)).trim_end(),
                );
            }
        }
        out.push('\n');
    }

    out
}

/// Like [`format_comparison_table`], but with a trailing BIC column computed
/// from the shared observed-data count.
///
/// # Panics
/// Panics if `n_data == 0` (see [`bayesian_ic`]).
pub fn format_comparison_table_with_bic(table: &ComparisonTable, n_data: usize) -> String {
    let mut out = String::new();

    out.push_str(
        format!(
            "{:<16} {:>14} {:>12} {:>12} {:>8} {:<32}",
            "model", "cost", "AIC", "BIC", "n_theta", "theta_best"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<16} {:-<14} {:-<12} {:-<12} {:-<8} {:-<32}",
            "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for row in &table.rows {
        match &row.outcome {
            RowOutcome::Fitted(score) => {
                let bic = bayesian_ic(score.n_theta, score.max_likelihood(), n_data);
                out.push_str(
                    format!(
                        "{:<16} {:>14.6} {:>12.4} {:>12.4} {:>8} {:<32}",
                        truncate(&row.model, 16),
                        score.min_cost,
                        score.aic,
                        bic,
                        score.n_theta,
                        fmt_vec(&score.theta_best),
                    )
                    .trim_end(),
                );
            }
            RowOutcome::Failed(reason) => {
                out.push_str(
                    format!("{:<16} FAILED: {reason}", truncate(&row.model, 16)).trim_end(),
                );
            }
        }
        out.push('\n');
    }

    out
}

pub(crate) fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
