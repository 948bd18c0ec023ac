//! The `settings` subcommands.
use crate::log::LOG_LEVEL_ENV_VAR;
use crate::settings::{Settings, get_settings_file_path};
use anyhow::{Context, Result};
use clap::Subcommand;
use std::env;
use std::path::Path;

/// Subcommands for managing `settings.toml`
#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Open the settings file in a text editor, creating it first if needed
    Edit,
    /// Print the path the settings file is read from
    Path,
    /// Print the settings the next run will use
    Show,
    /// Print the contents of a default `settings.toml`
    DumpDefault,
}

impl SettingsSubcommands {
    /// Execute the supplied settings subcommand
    pub fn execute(self) -> Result<()> {
        let file_path = get_settings_file_path();
        match self {
            Self::Edit => handle_edit_command(&file_path)?,
            Self::Path => println!("{}", file_path.display()),
            Self::Show => print!("{}", show_settings(&file_path)?),
            Self::DumpDefault => print!("{}", Settings::default_file_contents()),
        }

        Ok(())
    }
}

/// Open the settings file for editing, then check the edited file still loads
fn handle_edit_command(file_path: &Path) -> Result<()> {
    if Settings::write_default_file(file_path)? {
        println!("Created default settings file");
    }

    println!("Opening settings file for editing: {}", file_path.display());
    edit::edit_file(file_path)?;

    Settings::load_from_path(file_path).context("The edited settings file is invalid.")?;

    Ok(())
}

/// Describe the effective settings, including any log level set in the environment
fn show_settings(file_path: &Path) -> Result<String> {
    let settings = Settings::load_from_path(file_path).context("Failed to load settings.")?;
    let env_log_level = env::var(LOG_LEVEL_ENV_VAR).ok();

    Ok(settings.describe(file_path, env_log_level.as_deref()))
}
