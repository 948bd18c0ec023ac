//! The module responsible for writing output data to disk.
use crate::event_log::EventLogRow;
use crate::patient::PatientID;
use crate::results::{ResultsRow, RunSummary};
use crate::trial::Trial;
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "wardsim_results";

/// The output file name for the event log
const EVENT_LOG_FILE_NAME: &str = "event_log.csv";

/// The output file name for per-patient results
const PATIENT_RESULTS_FILE_NAME: &str = "patient_results.csv";

/// The output file name for per-run summaries
const TRIAL_SUMMARY_FILE_NAME: &str = "trial_summary.csv";

/// Get the default output directory for the model in the specified directory
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Get the model name from the dir path. This ends up being convoluted because we need to check
    // for all possible errors. Ugh.
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory for the model, optionally overwriting existing data
///
/// # Arguments
///
/// * `output_dir` - The output directory to create/overwrite
/// * `allow_overwrite` - Whether to delete and recreate the folder if it is non-empty
///
/// # Returns
///
/// True if the output dir contained existing data that was deleted, false if not, or an error.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    // If the folder already exists, then delete it
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Folder exists and is empty: nothing to do
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. \
            Please delete the folder or pass the --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Identifies a row in the patient results CSV file.
///
/// This is written along with a [`ResultsRow`] containing the results themselves.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct PatientKey {
    #[serde(rename = "Run Number")]
    run: u32,
    #[serde(rename = "Patient ID")]
    patient: PatientID,
}

/// An object for writing trial results to file
pub struct DataWriter {
    event_log_writer: csv::Writer<File>,
    patient_results_writer: csv::Writer<File>,
    summary_writer: csv::Writer<File>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    pub fn create(output_path: &Path) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        Ok(Self {
            event_log_writer: new_writer(EVENT_LOG_FILE_NAME)?,
            patient_results_writer: new_writer(PATIENT_RESULTS_FILE_NAME)?,
            summary_writer: new_writer(TRIAL_SUMMARY_FILE_NAME)?,
        })
    }

    /// Write the event log to a CSV file
    pub fn write_event_log<I, R>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: Into<EventLogRow>,
    {
        for entry in entries {
            self.event_log_writer.serialize(entry.into())?;
        }

        Ok(())
    }

    /// Write per-patient results for one run to a CSV file
    pub fn write_patient_results<'a, I>(&mut self, run: u32, rows: I) -> Result<()>
    where
        I: Iterator<Item = (&'a PatientID, &'a ResultsRow)>,
    {
        for (&patient, row) in rows {
            self.patient_results_writer
                .serialize((PatientKey { run, patient }, row))?;
        }

        Ok(())
    }

    /// Write run summaries to a CSV file
    pub fn write_summaries<'a, I>(&mut self, summaries: I) -> Result<()>
    where
        I: Iterator<Item = &'a RunSummary>,
    {
        for summary in summaries {
            self.summary_writer.serialize(summary)?;
        }

        Ok(())
    }

    /// Write everything from a completed trial
    pub fn write_trial(&mut self, trial: &Trial) -> Result<()> {
        self.write_event_log(&trial.event_log)?;
        for (run, results) in &trial.patient_results {
            self.write_patient_results(*run, results.iter())?;
        }
        self.write_summaries(trial.summaries.iter())?;

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.event_log_writer.flush()?;
        self.patient_results_writer.flush()?;
        self.summary_writer.flush()?;

        Ok(())
    }
}
