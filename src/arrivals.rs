//! The hourly arrival-rate table which drives the non-stationary arrival process.
use serde::Deserialize;

/// One row of the arrival-rate table
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ArrivalRateRow {
    /// Hour marker at which this rate starts to apply
    pub t: f64,
    /// Mean time between arrivals (hours)
    pub mean_iat: f64,
}

impl ArrivalRateRow {
    /// The arrival rate (patients per hour) for this row
    pub fn arrival_rate(&self) -> f64 {
        1.0 / self.mean_iat
    }
}

/// A piecewise-constant, cyclic table of arrival rates.
///
/// Rows start at `t = 0` and are evenly spaced. Once the last row has been passed the table
/// wraps back round to the first, so an hourly table with 24 rows describes a daily pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrivalRateTable {
    rows: Vec<ArrivalRateRow>,
    interval: f64,
}

impl ArrivalRateTable {
    /// Create a new table from rows which have already been validated.
    ///
    /// A table with a single row has a constant rate. Its interval is taken to be one hour.
    pub(crate) fn new(rows: Vec<ArrivalRateRow>) -> Self {
        let interval = match rows.as_slice() {
            [first, second, ..] => second.t - first.t,
            _ => 1.0,
        };

        Self { rows, interval }
    }

    /// The number of rows in the table
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows (never true for a loaded table)
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over the rows of the table
    pub fn iter(&self) -> impl Iterator<Item = &ArrivalRateRow> {
        self.rows.iter()
    }

    /// Spacing between consecutive rows (hours)
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// The highest arrival rate in the table, used as the bounding rate when thinning
    pub fn max_rate(&self) -> f64 {
        self.rows
            .iter()
            .map(ArrivalRateRow::arrival_rate)
            .fold(0.0, f64::max)
    }

    /// Get the arrival rate which applies at the given simulation time
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn rate_at(&self, time: f64) -> f64 {
        let period = (time.max(0.0) / self.interval).floor() as usize;
        self.rows[period % self.rows.len()].arrival_rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn table() -> ArrivalRateTable {
        ArrivalRateTable::new(vec![
            ArrivalRateRow {
                t: 0.0,
                mean_iat: 4.0,
            },
            ArrivalRateRow {
                t: 1.0,
                mean_iat: 2.0,
            },
            ArrivalRateRow {
                t: 2.0,
                mean_iat: 0.5,
            },
        ])
    }

    #[test]
    fn test_max_rate() {
        assert_approx_eq!(f64, table().max_rate(), 2.0);
    }

    #[rstest]
    #[case(0.0, 0.25)]
    #[case(0.99, 0.25)]
    #[case(1.0, 0.5)]
    #[case(2.5, 2.0)]
    #[case(3.0, 0.25)]
    #[case(25.5, 0.5)]
    fn test_rate_at(#[case] time: f64, #[case] expected: f64) {
        assert_approx_eq!(f64, table().rate_at(time), expected);
    }

    #[test]
    fn test_single_row_is_constant() {
        let table = ArrivalRateTable::new(vec![ArrivalRateRow {
            t: 0.0,
            mean_iat: 2.0,
        }]);
        assert_approx_eq!(f64, table.interval(), 1.0);
        assert_approx_eq!(f64, table.rate_at(0.0), 0.5);
        assert_approx_eq!(f64, table.rate_at(100.0), 0.5);
    }
}
