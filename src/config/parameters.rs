//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::input::{check_positive_finite, deserialise_proportion, input_err_msg, read_toml};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_n_beds, u32, 5);
define_param_default!(default_bed_short_los_mean, f64, 18.0);
define_param_default!(default_bed_long_los_mean, f64, 30.0);
define_param_default!(default_bed_los_var, f64, 5.0);
define_param_default!(default_long_stay_prob, f64, 0.1);
define_param_default!(default_sim_duration, u32, 600);
define_param_default!(default_warm_up_period, u32, 100);
define_param_default!(default_number_of_runs, u32, 10);
define_param_default!(default_random_number_set, u64, 42);

/// Simulation parameters. All times are in hours.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModelParameters {
    /// The number of beds on the ward
    #[serde(default = "default_n_beds")]
    pub n_beds: u32,
    /// Mean length of stay for short-stay patients
    #[serde(default = "default_bed_short_los_mean")]
    pub bed_short_los_mean: f64,
    /// Mean length of stay for long-stay patients
    #[serde(default = "default_bed_long_los_mean")]
    pub bed_long_los_mean: f64,
    /// Spread of the length of stay distributions, used as their standard deviation
    #[serde(default = "default_bed_los_var")]
    pub bed_los_var: f64,
    /// Probability that a patient is a long-stayer
    #[serde(default = "default_long_stay_prob")]
    #[serde(deserialize_with = "deserialise_proportion")]
    pub long_stay_prob: f64,
    /// Length of the simulated period after warm-up
    #[serde(default = "default_sim_duration")]
    pub sim_duration: u32,
    /// Length of the warm-up period
    #[serde(default = "default_warm_up_period")]
    pub warm_up_period: u32,
    /// The number of runs in a trial
    #[serde(default = "default_number_of_runs")]
    pub number_of_runs: u32,
    /// Base value from which the random number streams for each run are derived
    #[serde(default = "default_random_number_set")]
    pub random_number_set: u64,
}

impl Default for ModelParameters {
    fn default() -> Self {
        toml::from_str("").expect("Default parameters should be valid")
    }
}

/// Check that the `n_beds` parameter is valid
fn check_n_beds(value: u32) -> Result<()> {
    ensure!(value > 0, "n_beds must be at least one");

    Ok(())
}

/// Check that the `long_stay_prob` parameter is valid
fn check_long_stay_prob(value: f64) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&value),
        "long_stay_prob must be between 0 and 1"
    );

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// The total simulated time for one run, including warm-up (hours)
    pub fn run_length(&self) -> f64 {
        f64::from(self.sim_duration) + f64::from(self.warm_up_period)
    }

    /// Validate parameters after reading in file or applying overrides
    pub fn validate(&self) -> Result<()> {
        check_n_beds(self.n_beds)?;
        check_positive_finite(self.bed_short_los_mean, "bed_short_los_mean")?;
        check_positive_finite(self.bed_long_los_mean, "bed_long_los_mean")?;
        check_positive_finite(self.bed_los_var, "bed_los_var")?;

        // Already checked on deserialisation, but overrides can change it
        check_long_stay_prob(self.long_stay_prob)?;

        ensure!(self.sim_duration > 0, "sim_duration cannot be zero");
        ensure!(self.number_of_runs > 0, "number_of_runs cannot be zero");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_model_file(dir: &Path, contents: &str) {
        let mut file = File::create(dir.join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
        writeln!(file, "{contents}").unwrap();
    }

    #[test]
    fn test_defaults() {
        let params = ModelParameters::default();
        assert_eq!(params.n_beds, 5);
        assert_eq!(params.number_of_runs, 10);
        assert_eq!(params.random_number_set, 42);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_model_params_from_path() {
        let dir = tempdir().unwrap();
        write_model_file(dir.path(), "n_beds = 15\nsim_duration = 168");

        let params = ModelParameters::from_path(dir.path()).unwrap();
        assert_eq!(params.n_beds, 15);
        assert_eq!(params.sim_duration, 168);
        assert!((params.run_length() - 268.0).abs() < f64::EPSILON);
    }

    #[rstest]
    #[case("n_beds = 0")]
    #[case("sim_duration = 0")]
    #[case("number_of_runs = 0")]
    #[case("bed_los_var = -1.0")]
    #[case("long_stay_prob = 1.5")]
    #[case("unknown_key = 1")]
    fn test_model_params_from_path_invalid(#[case] contents: &str) {
        let dir = tempdir().unwrap();
        write_model_file(dir.path(), contents);

        assert!(ModelParameters::from_path(dir.path()).is_err());
    }

    #[test]
    fn test_model_params_missing_file() {
        let dir = tempdir().unwrap();
        assert!(ModelParameters::from_path(dir.path()).is_err());
    }

    #[rstest]
    #[case(1, true)]
    #[case(30, true)]
    #[case(0, false)]
    fn test_check_n_beds(#[case] value: u32, #[case] expected_valid: bool) {
        assert_eq!(check_n_beds(value).is_ok(), expected_valid);
    }

    #[test]
    fn test_validate_error_messages() {
        let params = ModelParameters {
            bed_short_los_mean: 0.0,
            ..ModelParameters::default()
        };
        assert_error!(
            params.validate(),
            "bed_short_los_mean must be a finite number greater than zero"
        );

        let params = ModelParameters {
            long_stay_prob: -0.5,
            ..ModelParameters::default()
        };
        assert_error!(params.validate(), "long_stay_prob must be between 0 and 1");
    }
}
