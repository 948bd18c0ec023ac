//! Common routines for handling input data.
use crate::config::Config;
use crate::config::parameters::ModelParameters;
use anyhow::{Context, Result, ensure};
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::fs;
use std::path::Path;

pub mod arrivals;
use arrivals::read_arrival_rates;

/// Read a series of type `T`s from a CSV file.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
///
/// # Returns
///
/// The rows of the file, or an error if the file is missing, malformed or empty
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?;

    let vec: Vec<T> = reader
        .deserialize()
        .collect::<Result<_, _>>()
        .with_context(|| input_err_msg(file_path))?;
    ensure!(!vec.is_empty(), "CSV file {} cannot be empty", file_path.display());

    Ok(vec)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Read an f64, checking that it is between 0 and 1
pub fn deserialise_proportion<'de, D>(deserialiser: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) {
        Err(serde::de::Error::custom("Value must be between 0 and 1"))?;
    }

    Ok(value)
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Check whether a sequence of values is strictly increasing
pub fn is_sorted_and_unique<T, I>(iter: I) -> bool
where
    T: PartialOrd + Clone,
    I: IntoIterator<Item = T>,
{
    iter.into_iter().is_sorted_by(|a, b| a < b)
}

/// Check that a value is finite and greater than zero
pub fn check_positive_finite(value: f64, name: &str) -> Result<()> {
    ensure!(
        value.is_finite() && value > 0.0,
        "{name} must be a finite number greater than zero"
    );

    Ok(())
}

/// Load a model configuration from the specified directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The validated [`Config`] or an error
pub fn load_config<P: AsRef<Path>>(model_dir: P) -> Result<Config> {
    let parameters = ModelParameters::from_path(model_dir.as_ref())?;
    let arrivals = read_arrival_rates(model_dir.as_ref())?;

    Ok(Config {
        parameters,
        arrivals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::write_model_dir;
    use rstest::rstest;
    use serde::Deserialize;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Record {
        id: String,
        value: u32,
    }

    #[test]
    fn test_read_csv() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.csv");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id,value\nhello,1\nworld, 2").unwrap();
        }

        let records: Vec<Record> = read_csv(&file_path).unwrap();
        assert_eq!(
            records,
            &[
                Record {
                    id: "hello".into(),
                    value: 1
                },
                Record {
                    id: "world".into(),
                    value: 2
                }
            ]
        );

        // Header only
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id,value").unwrap();
        }
        assert!(read_csv::<Record>(&file_path).is_err());

        // Missing file
        assert!(read_csv::<Record>(&dir.path().join("missing.csv")).is_err());
    }

    #[test]
    fn test_read_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.toml");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id = \"hello\"\nvalue = 1").unwrap();
        }

        assert_eq!(
            read_toml::<Record>(&file_path).unwrap(),
            Record {
                id: "hello".into(),
                value: 1
            }
        );

        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "bad toml syntax").unwrap();
        }
        assert!(read_toml::<Record>(&file_path).is_err());
    }

    #[derive(Debug, Deserialize)]
    struct Proportion {
        #[serde(deserialize_with = "deserialise_proportion")]
        value: f64,
    }

    #[rstest]
    #[case("value = 0.0", Some(0.0))]
    #[case("value = 0.5", Some(0.5))]
    #[case("value = 1.0", Some(1.0))]
    #[case("value = -0.1", None)]
    #[case("value = 1.1", None)]
    fn test_deserialise_proportion(#[case] input: &str, #[case] expected: Option<f64>) {
        let result = toml::from_str::<Proportion>(input).ok().map(|p| p.value);
        assert_eq!(result, expected);
    }

    #[rstest]
    #[case(&[], true)]
    #[case(&[1.0], true)]
    #[case(&[1.0, 2.0], true)]
    #[case(&[1.0, 1.0], false)]
    #[case(&[2.0, 1.0], false)]
    fn test_is_sorted_and_unique(#[case] values: &[f64], #[case] expected: bool) {
        assert_eq!(is_sorted_and_unique(values), expected);
    }

    #[rstest]
    #[case(1.0, true)]
    #[case(1e-10, true)]
    #[case(0.0, false)]
    #[case(-1.0, false)]
    #[case(f64::INFINITY, false)]
    #[case(f64::NAN, false)]
    fn test_check_positive_finite(#[case] value: f64, #[case] expected_valid: bool) {
        assert_eq!(check_positive_finite(value, "x").is_ok(), expected_valid);
    }

    #[test]
    fn test_load_config() {
        let dir = tempdir().unwrap();
        write_model_dir(dir.path(), "n_beds = 3");

        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.parameters.n_beds, 3);
        assert_eq!(config.arrivals.len(), 24);
    }
}
