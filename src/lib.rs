//! A discrete-event simulation of patient flow through an acute hospital ward.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod arrivals;
pub mod bed;
pub mod cli;
pub mod config;
pub mod event_log;
pub mod input;
pub mod log;
pub mod output;
pub mod patient;
pub mod results;
pub mod sampling;
pub mod settings;
pub mod simulation;
pub mod trial;

#[cfg(test)]
mod fixture;

/// Get the path to the directory in which the program's configuration files are stored
pub fn get_wardsim_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        // No standard config dir on this platform: fall back to the working directory
        return PathBuf::new();
    };

    config_dir.push("wardsim");
    config_dir
}
