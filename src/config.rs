//! The configuration for a trial: simulation parameters plus the arrival-rate table.
use crate::arrivals::ArrivalRateTable;
use anyhow::Result;
use clap::Args;

pub mod parameters;
use parameters::ModelParameters;

/// Everything needed to run a trial.
///
/// A `Config` is read-only once a trial starts. Runs only ever borrow it.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Scalar simulation parameters
    pub parameters: ModelParameters,
    /// Hourly arrival rates
    pub arrivals: ArrivalRateTable,
}

/// Values which override those given in `model.toml`.
///
/// These mirror the controls offered to users of the ward dashboard.
#[derive(Args, Debug, Default, Clone, PartialEq)]
pub struct ParameterOverrides {
    /// Total number of beds on the ward
    #[arg(long)]
    pub beds: Option<u32>,
    /// How long the simulation should run for (days, excluding warm-up)
    #[arg(long)]
    pub days: Option<u32>,
    /// How many runs of the simulation should be done
    #[arg(long)]
    pub runs: Option<u32>,
    /// Average length of stay for short-stay patients (hours)
    #[arg(long)]
    pub short_los_mean: Option<f64>,
    /// Average length of stay for long-stay patients (hours)
    #[arg(long)]
    pub long_los_mean: Option<f64>,
    /// Percentage of long-stay patients
    #[arg(long)]
    pub long_stay_percent: Option<f64>,
}

impl ParameterOverrides {
    /// Whether any parameter is overridden
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Config {
    /// Apply user overrides and check that the resulting parameters are still valid
    pub fn apply_overrides(&mut self, overrides: &ParameterOverrides) -> Result<()> {
        let params = &mut self.parameters;
        if let Some(beds) = overrides.beds {
            params.n_beds = beds;
        }
        if let Some(days) = overrides.days {
            params.sim_duration = days.saturating_mul(24);
        }
        if let Some(runs) = overrides.runs {
            params.number_of_runs = runs;
        }
        if let Some(mean) = overrides.short_los_mean {
            params.bed_short_los_mean = mean;
        }
        if let Some(mean) = overrides.long_los_mean {
            params.bed_long_los_mean = mean;
        }
        if let Some(percent) = overrides.long_stay_percent {
            params.long_stay_prob = percent / 100.0;
        }

        params.validate()
    }
}
