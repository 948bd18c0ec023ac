//! Code for loading program settings.
use crate::get_wardsim_config_dir;
use crate::input::read_toml;
use crate::log::{DEFAULT_LOG_LEVEL, LOG_LEVEL_ENV_VAR, parse_log_level};
use anyhow::{Context, Result};
use documented::DocumentedFields;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.toml";

const DEFAULT_SETTINGS_FILE_HEADER: &str = "# This file contains the program settings for wardsim
# Uncomment a line to change the setting from its default value
";

/// Default log level for program
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Get the path to where the settings file will be read from
pub fn get_settings_file_path() -> PathBuf {
    let mut path = get_wardsim_config_dir();
    path.push(SETTINGS_FILE_NAME);

    path
}

/// Program settings from config file
#[derive(Debug, DocumentedFields, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// The default program log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Whether to overwrite output files by default
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            overwrite: false,
        }
    }
}

impl Settings {
    /// Read the contents of a settings file from the model directory.
    ///
    /// If the file is not present, default values for settings will be used
    ///
    /// # Returns
    ///
    /// The program settings as a `Settings` struct or an error if the file is invalid
    pub fn load() -> Result<Settings> {
        Self::load_from_path(&get_settings_file_path())
    }

    /// Read settings from the specified path, using defaults if the file does not exist
    pub fn load_from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        let settings: Settings = read_toml(file_path)?;
        parse_log_level(&settings.log_level)
            .with_context(|| format!("Invalid log_level in {}", file_path.display()))?;

        Ok(settings)
    }

    /// Write the default settings file to `file_path`, unless a file is already there.
    ///
    /// Returns whether a new file was written.
    pub fn write_default_file(file_path: &Path) -> Result<bool> {
        if file_path.is_file() {
            return Ok(false);
        }

        if let Some(dir_path) = file_path.parent() {
            fs::create_dir_all(dir_path)
                .with_context(|| format!("Failed to create directory: {}", dir_path.display()))?;
        }
        fs::write(file_path, Self::default_file_contents())
            .with_context(|| format!("Failed to write {}", file_path.display()))?;

        Ok(true)
    }

    /// Describe the settings a run will use, as loaded from `file_path`.
    ///
    /// `env_log_level` is the value of `WARDSIM_LOG_LEVEL`, which takes precedence over the file.
    pub fn describe(&self, file_path: &Path, env_log_level: Option<&str>) -> String {
        let source = if file_path.is_file() {
            "loaded"
        } else {
            "not found, using defaults"
        };
        let mut out = format!("Settings file: {} ({source})\n", file_path.display());

        let log_level = match env_log_level {
            Some(level) => format!(
                "\"{level}\" (from {LOG_LEVEL_ENV_VAR}; file has \"{}\")",
                self.log_level
            ),
            None => format!("\"{}\"", self.log_level),
        };
        writeln!(&mut out, "log_level = {log_level}").unwrap();
        writeln!(&mut out, "overwrite = {}", self.overwrite).unwrap();

        out
    }

    /// The contents of the default settings file
    pub fn default_file_contents() -> String {
        // Settings object with default values set by serde
        let settings: Settings =
            toml::from_str("").expect("Cannot create settings from empty TOML file");

        // Convert to TOML
        let settings_raw = toml::to_string(&settings).expect("Could not convert settings to TOML");

        // Iterate through the generated TOML, commenting out lines and adding docs
        let mut out = DEFAULT_SETTINGS_FILE_HEADER.to_string();
        for line in settings_raw.split('\n') {
            if let Some(last) = line.find('=') {
                // Add documentation from doc comments
                let field = line[..last].trim();

                // Use doc comment to document parameter. All fields should have doc comments.
                let docs = Settings::get_field_docs(field).expect("Missing doc comment for field");
                for line in docs.split('\n') {
                    write!(&mut out, "\n# # {}\n", line.trim()).unwrap();
                }

                writeln!(&mut out, "# {}", line.trim()).unwrap();
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_settings_load_from_path_no_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME); // NB: doesn't exist
        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings::default()
        );
    }

    #[test]
    fn test_settings_load_from_path() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);

        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "log_level = \"warn\"").unwrap();
        }

        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings {
                log_level: "warn".to_string(),
                overwrite: false
            }
        );
    }

    #[test]
    fn test_settings_load_from_path_unknown_field() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&file_path, "beds = 3\n").unwrap();
        assert!(Settings::load_from_path(&file_path).is_err());
    }

    #[test]
    fn test_default_file_contents() {
        let contents = Settings::default_file_contents();
        assert!(contents.contains("# log_level = \"info\""));
        assert!(contents.contains("# overwrite = false"));

        // Everything is commented out, so this is equivalent to an empty file
        let settings: Settings = toml::from_str(&contents).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_settings_load_from_path_bad_log_level() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&file_path, "log_level = \"loud\"\n").unwrap();

        let err = Settings::load_from_path(&file_path).unwrap_err();
        assert_eq!(err.root_cause().to_string(), "Unknown log level: loud");
    }

    #[test]
    fn test_write_default_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("wardsim").join(SETTINGS_FILE_NAME);
        assert!(Settings::write_default_file(&file_path).unwrap());
        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings::default()
        );

        // An existing file is left alone
        fs::write(&file_path, "overwrite = true\n").unwrap();
        assert!(!Settings::write_default_file(&file_path).unwrap());
        assert!(Settings::load_from_path(&file_path).unwrap().overwrite);
    }

    #[test]
    fn test_describe() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);
        let settings = Settings::default();

        let description = settings.describe(&file_path, None);
        assert!(description.contains("(not found, using defaults)"));
        assert!(description.contains("log_level = \"info\"\n"));
        assert!(description.contains("overwrite = false\n"));

        fs::write(&file_path, "").unwrap();
        let description = settings.describe(&file_path, Some("trace"));
        assert!(description.contains("(loaded)"));
        assert!(description.contains(
            "log_level = \"trace\" (from WARDSIM_LOG_LEVEL; file has \"info\")"
        ));
    }
}
