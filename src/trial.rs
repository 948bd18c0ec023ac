//! A trial: a batch of independent runs of the ward model.
use crate::config::Config;
use crate::event_log::EventLogEntry;
use crate::results::{ResultsTable, RunSummary};
use crate::sampling::{Stream, stream_seed};
use crate::simulation::Model;
use anyhow::{Context, Result};
use log::{debug, info};

/// The combined results of every run in a trial
#[derive(Debug, Default)]
pub struct Trial {
    /// One summary row per run, in run order
    pub summaries: Vec<RunSummary>,
    /// Event logs of all runs, ordered by run then by time of logging
    pub event_log: Vec<EventLogEntry>,
    /// Per-patient results for each run
    pub patient_results: Vec<(u32, ResultsTable)>,
}

impl Trial {
    /// Run `number_of_runs` independent simulations.
    ///
    /// Run `n` draws all of its random numbers from streams derived from `n` and the configured
    /// random number set, so any run can be reproduced on its own. The trial fails if any run does.
    pub fn run(config: &Config) -> Result<Self> {
        let params = &config.parameters;
        info!(
            "Running trial of {} runs with {} beds",
            params.number_of_runs, params.n_beds
        );

        let mut trial = Trial::default();
        for run in 0..params.number_of_runs {
            debug!(
                "Starting run {run} (arrival stream seed {})",
                stream_seed(params.random_number_set, run, Stream::Arrivals)
            );
            let output = Model::new(config, run)
                .and_then(Model::run)
                .with_context(|| format!("Run {run} failed"))?;

            let summary = output.summary;
            info!(
                "Run {run}: {} arrivals, mean queue time for bed {}",
                summary.arrivals,
                summary
                    .mean_queue_time_bed
                    .map_or_else(|| "n/a".to_string(), |q| format!("{q:.2} hours"))
            );

            trial.summaries.push(summary);
            trial.event_log.extend(output.event_log);
            trial.patient_results.push((run, output.results));
        }

        Ok(trial)
    }

    /// Get the event log entries for one run
    pub fn run_event_log(&self, run: u32) -> impl Iterator<Item = &EventLogEntry> {
        self.event_log.iter().filter(move |entry| entry.run == run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::config;
    use itertools::Itertools;
    use rstest::rstest;

    #[rstest]
    fn test_trial_run(mut config: Config) {
        config.parameters.number_of_runs = 3;
        config.parameters.sim_duration = 48;
        config.parameters.warm_up_period = 0;
        let trial = Trial::run(&config).unwrap();

        assert_eq!(
            trial.summaries.iter().map(|s| s.run).collect_vec(),
            [0, 1, 2]
        );
        assert_eq!(
            trial.event_log.iter().map(|e| e.run).dedup().collect_vec(),
            [0, 1, 2]
        );
        assert_eq!(trial.patient_results.len(), 3);
        for summary in &trial.summaries {
            let log_patients = trial
                .run_event_log(summary.run)
                .filter(|e| e.event.name() == "arrival")
                .count();
            assert_eq!(log_patients, summary.arrivals as usize);
        }
    }

    #[rstest]
    fn test_trial_fails_with_bad_config(mut config: Config) {
        config.parameters.bed_los_var = f64::NAN;
        let err = Trial::run(&config).unwrap_err();
        assert_eq!(err.to_string(), "Run 0 failed");
    }
}
