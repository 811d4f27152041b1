//! Export the comparison table to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{ComparisonTable, RowOutcome};
use crate::error::CompareError;
use crate::report::format::fmt_vec;

/// Write the comparison table to a CSV file, one row per candidate model in
/// model-list order.
///
/// Failed models keep their row: the numeric columns stay empty and the
/// failure reason lands in the `error` column.
pub fn write_table_csv(path: &Path, table: &ComparisonTable) -> Result<(), CompareError> {
    let mut file = File::create(path)?;

    writeln!(file, "model,cost,AIC,n_theta,theta_best,error")?;

    for row in &table.rows {
        match &row.outcome {
            RowOutcome::Fitted(score) => writeln!(
                file,
                "{},{:.10},{:.10},{},{},",
                csv_field(&row.model),
                score.min_cost,
                score.aic,
                score.n_theta,
                csv_field(&fmt_vec(&score.theta_best)),
            )?,
            RowOutcome::Failed(reason) => writeln!(
                file,
                "{},,,,,{}",
                csv_field(&row.model),
                csv_field(reason),
            )?,
        }
    }

    Ok(())
}

/// Quote a field when it contains a delimiter, quote, or newline.
fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
