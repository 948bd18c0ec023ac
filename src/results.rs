//! Per-patient results and per-run summary statistics.
use crate::patient::PatientID;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One patient's results for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultsRow {
    /// How long the patient waited for a bed
    #[serde(rename = "Queue Time Bed")]
    pub queue_time_bed: Option<f64>,
    /// How long the patient spent in bed, including any overnight extension
    #[serde(rename = "Length of Stay")]
    pub length_of_stay: Option<f64>,
}

/// Results for every patient who has been allocated a bed, in order of allocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsTable(IndexMap<PatientID, ResultsRow>);

impl ResultsTable {
    /// Record the time a patient spent waiting for a bed
    pub fn set_queue_time(&mut self, patient: PatientID, queue_time: f64) {
        self.0.entry(patient).or_default().queue_time_bed = Some(queue_time);
    }

    /// Record a patient's length of stay
    pub fn set_length_of_stay(&mut self, patient: PatientID, los: f64) {
        self.0.entry(patient).or_default().length_of_stay = Some(los);
    }

    /// Get the row for a patient
    pub fn get(&self, patient: PatientID) -> Option<&ResultsRow> {
        self.0.get(&patient)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no rows
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over rows
    pub fn iter(&self) -> impl Iterator<Item = (&PatientID, &ResultsRow)> {
        self.0.iter()
    }

    /// Mean time spent waiting for a bed over all rows with a queue time
    pub fn mean_queue_time(&self) -> Option<f64> {
        mean(self.0.values().filter_map(|row| row.queue_time_bed))
    }

    /// Mean length of stay over all rows with a length of stay
    pub fn mean_length_of_stay(&self) -> Option<f64> {
        mean(self.0.values().filter_map(|row| row.length_of_stay))
    }
}

/// Arithmetic mean, or `None` for an empty sequence
fn mean<I: Iterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0u32), |(sum, count), x| (sum + x, count + 1));
    (count > 0).then(|| sum / f64::from(count))
}

/// Summary statistics for one run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// The run number
    #[serde(rename = "Run Number")]
    pub run: u32,
    /// Number of patients who arrived during the run
    #[serde(rename = "Arrivals")]
    pub arrivals: u32,
    /// Mean time spent waiting for a bed
    #[serde(rename = "Mean Queue Time Bed")]
    pub mean_queue_time_bed: Option<f64>,
    /// Mean length of stay
    #[serde(rename = "Mean Length of Stay")]
    pub mean_length_of_stay: Option<f64>,
}
