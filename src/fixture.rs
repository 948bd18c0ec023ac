//! Fixtures for tests

use crate::arrivals::{ArrivalRateRow, ArrivalRateTable};
use crate::config::Config;
use crate::config::parameters::ModelParameters;
use crate::sampling::{ArrivalSampler, LosSampler, Stream, stream_rng};
use crate::simulation::Samplers;
use itertools::Itertools;
use rstest::fixture;
use std::fs;
use std::path::Path;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Mean inter-arrival times for each hour of the day
const HOURLY_MEAN_IAT: [f64; 24] = [
    3.0, 3.0, 3.3, 3.5, 3.5, 3.0, 2.4, 1.8, 1.3, 1.0, 0.9, 0.8, 0.8, 0.8, 0.9, 1.0, 1.1, 1.2, 1.4,
    1.6, 1.9, 2.2, 2.5, 2.8,
];

/// Write an hourly arrival-rate table to the given directory
pub fn write_arrivals_file(dir_path: &Path) {
    let rows = HOURLY_MEAN_IAT
        .iter()
        .enumerate()
        .map(|(t, mean_iat)| format!("{t},{mean_iat}"))
        .join("\n");
    fs::write(dir_path.join("arrivals.csv"), format!("t,mean_iat\n{rows}\n")).unwrap();
}

/// Write a complete model directory with the given contents for `model.toml`
pub fn write_model_dir(dir_path: &Path, model_toml: &str) {
    fs::write(dir_path.join("model.toml"), model_toml).unwrap();
    write_arrivals_file(dir_path);
}

#[fixture]
pub fn arrival_rates() -> ArrivalRateTable {
    ArrivalRateTable::new(
        HOURLY_MEAN_IAT
            .iter()
            .enumerate()
            .map(|(t, &mean_iat)| ArrivalRateRow {
                t: t as f64,
                mean_iat,
            })
            .collect(),
    )
}

#[fixture]
pub fn config(arrival_rates: ArrivalRateTable) -> Config {
    Config {
        parameters: ModelParameters::default(),
        arrivals: arrival_rates,
    }
}

/// An arrival sampler which always returns the same gap
pub struct FixedArrivals(pub f64);

impl ArrivalSampler for FixedArrivals {
    fn sample(&mut self, _simulation_time: f64) -> f64 {
        self.0
    }
}

/// A length-of-stay sampler which always returns the same value
pub struct FixedLos(pub f64);

impl LosSampler for FixedLos {
    fn sample(&mut self) -> f64 {
        self.0
    }
}

/// Samplers with fixed arrival gaps and lengths of stay.
///
/// Pathway routing is still random, but it does not affect the length of stay.
pub fn samplers(gap: f64, los: f64) -> Samplers {
    Samplers {
        arrivals: Box::new(FixedArrivals(gap)),
        short_los: Box::new(FixedLos(los)),
        long_los: Box::new(FixedLos(los)),
        routing: stream_rng(42, 0, Stream::Routing),
    }
}
