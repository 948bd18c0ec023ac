//! Code for reading the arrival-rate table from a CSV file.
use super::{check_positive_finite, input_err_msg, is_sorted_and_unique, read_csv};
use crate::arrivals::{ArrivalRateRow, ArrivalRateTable};
use anyhow::{Context, Result, ensure};
use float_cmp::approx_eq;
use itertools::Itertools;
use std::path::Path;

const ARRIVALS_FILE_NAME: &str = "arrivals.csv";

/// Read the arrival-rate table from the model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// A validated [`ArrivalRateTable`] or an error
pub fn read_arrival_rates(model_dir: &Path) -> Result<ArrivalRateTable> {
    let file_path = model_dir.join(ARRIVALS_FILE_NAME);
    let rows = read_csv(&file_path)?;
    validate_arrival_rates(&rows).with_context(|| input_err_msg(&file_path))?;

    Ok(ArrivalRateTable::new(rows))
}

/// Check that the breakpoints are contiguous and the mean inter-arrival times are sensible
fn validate_arrival_rates(rows: &[ArrivalRateRow]) -> Result<()> {
    ensure!(!rows.is_empty(), "Arrival-rate table is empty");
    ensure!(
        approx_eq!(f64, rows[0].t, 0.0),
        "Arrival-rate table must start at t = 0"
    );
    ensure!(
        is_sorted_and_unique(rows.iter().map(|row| row.t)),
        "Values of t must be strictly increasing"
    );

    if let [first, second, ..] = rows {
        let interval = second.t - first.t;
        ensure!(
            rows.iter()
                .tuple_windows()
                .all(|(a, b)| approx_eq!(f64, b.t - a.t, interval, epsilon = 1e-9)),
            "Values of t must be evenly spaced"
        );
    }

    for row in rows {
        check_row(row).with_context(|| format!("Invalid row at t = {}", row.t))?;
    }

    Ok(())
}

/// Check that a row's mean inter-arrival time gives a usable arrival rate
fn check_row(row: &ArrivalRateRow) -> Result<()> {
    check_positive_finite(row.mean_iat, "mean_iat")?;

    // Subnormal values pass the check above but their reciprocal overflows
    ensure!(
        row.arrival_rate().is_finite(),
        "mean_iat is too small to give a finite arrival rate"
    );

    Ok(())
}
