//! Program logging, built on `fern`.
//!
//! Messages go to the terminal and, for commands with an output folder, to log files in that
//! folder. Warnings and errors are kept apart from everything else in both places.
//!
//! The simulation logs every patient event under [`PATIENT_EVENT_TARGET`] at `trace` level. There
//! are thousands of these per trial, so they are kept off the terminal and out of the info log.
//! With the `trace` level they are written to their own file instead.
use anyhow::{Result, bail};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Metadata, Record};
use std::env;
use std::fmt::Arguments;
use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::{Mutex, OnceLock, PoisonError};

/// Set once the program logger has been installed
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// Held while a logger is being installed
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// The log level used if neither the environment nor `settings.toml` gives one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// The environment variable which overrides the log level in `settings.toml`
pub const LOG_LEVEL_ENV_VAR: &str = "WARDSIM_LOG_LEVEL";

/// The log target for per-patient simulation events
pub const PATIENT_EVENT_TARGET: &str = "wardsim::patient_events";

const LOG_INFO_FILE_NAME: &str = "wardsim_info.log";
const LOG_ERROR_FILE_NAME: &str = "wardsim_error.log";
const LOG_EVENTS_FILE_NAME: &str = "wardsim_events.log";

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Install the program logger.
///
/// The level comes from `WARDSIM_LOG_LEVEL` if set, then from `settings.toml`, then
/// [`DEFAULT_LOG_LEVEL`]. Accepted levels are `off`, `error`, `warn`, `info`, `debug` and `trace`
/// (case insensitive).
///
/// If the logger has already been initialised, this function does nothing.
///
/// # Arguments
///
/// * `log_level_from_settings`: The log level specified in `settings.toml`
/// * `output_path`: The run's output folder. If given, log files are created there.
pub fn init(log_level_from_settings: Option<&str>, output_path: Option<&Path>) -> Result<()> {
    // Integration tests may start several runs at once
    let _guard = INIT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    if is_logger_initialised() {
        return Ok(());
    }

    let level = resolve_log_level(log_level_from_settings)?;
    let mut dispatch = Dispatch::new().chain(terminal_dispatch(level));
    if let Some(output_path) = output_path {
        dispatch = dispatch.chain(file_dispatch(level, output_path)?);
    }
    dispatch.apply()?;

    LOGGER_INIT
        .set(())
        .expect("Logger is only installed while holding INIT_LOCK");

    Ok(())
}

/// Choose the log level, giving the environment variable precedence over settings
fn resolve_log_level(log_level_from_settings: Option<&str>) -> Result<LevelFilter> {
    match env::var(LOG_LEVEL_ENV_VAR) {
        Ok(level) => parse_log_level(&level),
        Err(_) => parse_log_level(log_level_from_settings.unwrap_or(DEFAULT_LOG_LEVEL)),
    }
}

/// Convert a log level string (case insensitive) to a [`LevelFilter`]
pub fn parse_log_level(log_level: &str) -> Result<LevelFilter> {
    let level = match log_level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    };

    Ok(level)
}

fn is_patient_event(metadata: &Metadata) -> bool {
    metadata.target() == PATIENT_EVENT_TARGET
}

fn is_below_warning(metadata: &Metadata) -> bool {
    metadata.level() > LevelFilter::Warn
}

/// Terminal output: warnings and errors on stderr, the rest on stdout. No patient events.
fn terminal_dispatch(level: LevelFilter) -> Dispatch {
    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);
    let stdout_colours = io::stdout().is_terminal().then_some(colours);
    let stderr_colours = io::stderr().is_terminal().then_some(colours);

    Dispatch::new()
        .filter(|metadata| !is_patient_event(metadata))
        .chain(
            Dispatch::new()
                .filter(is_below_warning)
                .format(move |out, message, record| {
                    write_log(out, message, record, stdout_colours.as_ref());
                })
                .level(level)
                .chain(io::stdout()),
        )
        .chain(
            Dispatch::new()
                .format(move |out, message, record| {
                    write_log(out, message, record, stderr_colours.as_ref());
                })
                .level(level.min(LevelFilter::Warn))
                .chain(io::stderr()),
        )
}

/// Log files in the output folder.
///
/// The info and error files are always created. The patient event file is only created at
/// `trace` level.
fn file_dispatch(level: LevelFilter, output_path: &Path) -> Result<Dispatch> {
    let create = |file_name| -> io::Result<File> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(output_path.join(file_name))
    };

    let mut dispatch = Dispatch::new()
        .format(write_log_plain)
        .chain(
            Dispatch::new()
                .filter(|metadata| is_below_warning(metadata) && !is_patient_event(metadata))
                .level(level.max(LevelFilter::Info))
                .chain(create(LOG_INFO_FILE_NAME)?),
        )
        .chain(
            Dispatch::new()
                .level(LevelFilter::Warn)
                .chain(create(LOG_ERROR_FILE_NAME)?),
        );

    if level == LevelFilter::Trace {
        dispatch = dispatch.chain(
            Dispatch::new()
                .filter(is_patient_event)
                .chain(create(LOG_EVENTS_FILE_NAME)?),
        );
    }

    Ok(dispatch)
}

/// Write a record as `[time level target] message`, colouring the level if requested
fn write_log(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    colours: Option<&ColoredLevelConfig>,
) {
    let timestamp = Local::now().format("%H:%M:%S");
    let target = record.target();
    match colours {
        Some(colours) => out.finish(format_args!(
            "[{timestamp} {} {target}] {message}",
            colours.color(record.level())
        )),
        None => out.finish(format_args!(
            "[{timestamp} {} {target}] {message}",
            record.level()
        )),
    }
}

fn write_log_plain(out: FormatCallback, message: &Arguments, record: &Record) {
    write_log(out, message, record, None);
}
