//! A single run of the ward model.
//!
//! Patients are generated by a non-stationary arrival process. Each one then follows the same
//! pathway: wait for a bed, occupy it for a sampled length of stay (pushed back to the next
//! morning if discharge would fall overnight) and leave. Every step is written to the event log.
use crate::bed::{Bed, BedPool};
use crate::config::Config;
use crate::config::parameters::ModelParameters;
use crate::event_log::{EventLogEntry, PatientEvent};
use crate::log::PATIENT_EVENT_TARGET;
use crate::patient::{Pathway, PathwayState, Patient, PatientID};
use crate::results::{ResultsTable, RunSummary};
use crate::sampling::{
    ArrivalSampler, Lognormal, LosSampler, NsppThinning, Stream, check_duration, stream_rng,
};
use anyhow::Result;
use log::{debug, trace};
use rand::Rng;
use rand::rngs::StdRng;
use std::mem;

pub mod scheduler;
use scheduler::{Scheduler, Timestamp};

const HOURS_PER_DAY: f64 = 24.0;

/// Discharges due at or after this point in the reference day (as `time mod 24`) are blocked
const OVERNIGHT_CUTOFF: f64 = 12.0;

/// Range of the extra delay (hours) added after the start of the next reference day
const OVERNIGHT_DELAY: std::ops::Range<f64> = 2.0..5.0;

/// Something the scheduler will do at a future time
#[derive(Debug)]
enum Activity {
    /// Next step of the arrival generator
    GenerateArrival,
    /// A new patient starts their pathway
    StartPathway(PatientID),
    /// A waiting patient has been handed a bed
    OccupyBed(PatientID, Bed),
    /// A patient's stay in bed is over
    EndStay(PatientID),
}

/// The random number streams and samplers used in one run
pub struct Samplers {
    /// Time between arrivals
    pub arrivals: Box<dyn ArrivalSampler>,
    /// Length of stay for short-stay patients
    pub short_los: Box<dyn LosSampler>,
    /// Length of stay for long-stay patients
    pub long_los: Box<dyn LosSampler>,
    /// Pathway classification and overnight delays
    pub routing: StdRng,
}

impl Samplers {
    /// Create the default samplers for a run, each on its own seeded stream
    pub fn for_run(config: &Config, run_number: u32) -> Result<Self> {
        let params = &config.parameters;
        let rng = |stream| stream_rng(params.random_number_set, run_number, stream);

        Ok(Self {
            arrivals: Box::new(NsppThinning::new(
                config.arrivals.clone(),
                rng(Stream::Arrivals),
                rng(Stream::Thinning),
            )?),
            short_los: Box::new(Lognormal::new(
                params.bed_short_los_mean,
                params.bed_los_var,
                rng(Stream::ShortLos),
            )?),
            long_los: Box::new(Lognormal::new(
                params.bed_long_los_mean,
                params.bed_los_var,
                rng(Stream::LongLos),
            )?),
            routing: rng(Stream::Routing),
        })
    }
}

/// Everything produced by a completed run
#[derive(Debug)]
pub struct RunOutput {
    /// Summary statistics
    pub summary: RunSummary,
    /// Per-patient results
    pub results: ResultsTable,
    /// The event log, tagged with the run number
    pub event_log: Vec<EventLogEntry>,
    /// Every patient generated during the run
    pub patients: Vec<Patient>,
}

/// If a stay ending at `end` would end overnight, how long until the start of the next reference
/// day
fn overnight_extension(end: Timestamp) -> Option<f64> {
    let hour = end.rem_euclid(HOURS_PER_DAY);
    (hour >= OVERNIGHT_CUTOFF).then(|| HOURS_PER_DAY - hour)
}

/// One simulation run
pub struct Model<'a> {
    params: &'a ModelParameters,
    run_number: u32,
    scheduler: Scheduler<Activity>,
    beds: BedPool,
    patients: Vec<Patient>,
    event_log: Vec<EventLogEntry>,
    results: ResultsTable,
    samplers: Samplers,
}

impl<'a> Model<'a> {
    /// Set up a run using the default samplers
    pub fn new(config: &'a Config, run_number: u32) -> Result<Self> {
        let samplers = Samplers::for_run(config, run_number)?;
        Ok(Self::with_samplers(&config.parameters, run_number, samplers))
    }

    /// Set up a run using the provided samplers
    pub fn with_samplers(params: &'a ModelParameters, run_number: u32, samplers: Samplers) -> Self {
        Self {
            params,
            run_number,
            scheduler: Scheduler::default(),
            beds: BedPool::new(params.n_beds),
            patients: Vec::new(),
            event_log: Vec::new(),
            results: ResultsTable::default(),
            samplers,
        }
    }

    /// Run the model for the warm-up period plus the simulation duration.
    ///
    /// Anything still pending when the clock reaches the end is dropped.
    pub fn run(mut self) -> Result<RunOutput> {
        self.scheduler.schedule_now(Activity::GenerateArrival);
        self.advance_until(self.params.run_length())?;
        debug!(
            "Run {} stopped with {} patients waiting for a bed and {} beds occupied",
            self.run_number,
            self.beds.queue_length(),
            self.beds.occupied()
        );

        Ok(self.into_output())
    }

    /// Process everything scheduled before `until`
    fn advance_until(&mut self, until: Timestamp) -> Result<()> {
        while let Some(activity) = self.scheduler.pop_before(until) {
            match activity {
                Activity::GenerateArrival => self.generate_arrival()?,
                Activity::StartPathway(id) => self.start_pathway(id)?,
                Activity::OccupyBed(id, bed) => self.occupy_bed(id, bed),
                Activity::EndStay(id) => self.end_stay(id),
            }
        }

        Ok(())
    }

    /// One step of the arrival generator: admit a patient then wait for the next arrival
    fn generate_arrival(&mut self) -> Result<()> {
        self.create_patient();

        let now = self.scheduler.now();
        let gap = check_duration("arrival", self.samplers.arrivals.sample(now), now)?;
        self.scheduler.schedule_in(gap, Activity::GenerateArrival);

        Ok(())
    }

    /// Create a new patient and start their pathway
    #[allow(clippy::cast_possible_truncation)]
    fn create_patient(&mut self) -> PatientID {
        let id = PatientID(self.patients.len() as u32 + 1);
        self.patients.push(Patient::new(id, self.scheduler.now()));
        self.scheduler.schedule_now(Activity::StartPathway(id));

        id
    }

    /// Classify the patient, sample their length of stay and ask for a bed
    fn start_pathway(&mut self, id: PatientID) -> Result<()> {
        let now = self.scheduler.now();
        let draw: f64 = self.samplers.routing.random();
        let pathway = Pathway::classify(draw, self.params.long_stay_prob);
        let sampled = match pathway {
            Pathway::ShortStay => self.samplers.short_los.sample(),
            Pathway::LongStay => self.samplers.long_los.sample(),
        };
        let los = check_duration("length of stay", sampled, now)?;

        let patient = self.patient_mut(id);
        patient.pathway = Some(pathway);
        patient.state = PathwayState::AwaitingBed { since: now, los };

        self.log(id, PatientEvent::Arrival, now);
        self.log(id, PatientEvent::BedWaitBegins, now);

        if let Some(bed) = self.beds.acquire(id) {
            self.occupy_bed(id, bed);
        }

        Ok(())
    }

    /// Put a patient into a bed and schedule the end of their stay
    fn occupy_bed(&mut self, id: PatientID, bed: Bed) {
        let now = self.scheduler.now();
        let bed_id = bed.id();
        let PathwayState::AwaitingBed { since, los } = mem::take(&mut self.patient_mut(id).state)
        else {
            unreachable!("Patient {id} was given a bed without waiting for one");
        };

        let wait = now - since;
        self.patient_mut(id).wait_bed = Some(wait);
        self.results.set_queue_time(id, wait);
        self.log(id, PatientEvent::BedOccupyBegins(bed_id), now);

        // Block overnight discharge: push the end of the stay into the next morning
        let mut los = los;
        let end = now + los;
        if let Some(extension) = overnight_extension(end) {
            los += extension + self.samplers.routing.random_range(OVERNIGHT_DELAY);
            self.log(id, PatientEvent::OvernightStay(bed_id), end);
        }

        self.results.set_length_of_stay(id, los);
        let patient = self.patient_mut(id);
        patient.bed_los = Some(los);
        patient.state = PathwayState::OccupyingBed { bed };
        self.scheduler.schedule_in(los, Activity::EndStay(id));
    }

    /// Discharge a patient, passing their bed on to the next patient waiting
    fn end_stay(&mut self, id: PatientID) {
        let now = self.scheduler.now();
        let PathwayState::OccupyingBed { bed } = mem::take(&mut self.patient_mut(id).state) else {
            unreachable!("Patient {id} left a bed they were not occupying");
        };

        self.log(id, PatientEvent::BedOccupyComplete(bed.id()), now);
        if let Some((next, bed)) = self.beds.release(bed) {
            self.scheduler.schedule_now(Activity::OccupyBed(next, bed));
        }

        let patient = self.patient_mut(id);
        patient.total_time = Some(now - patient.arrival);
        patient.state = PathwayState::Departed;
        self.log(id, PatientEvent::Depart, now);
    }

    fn patient_mut(&mut self, id: PatientID) -> &mut Patient {
        &mut self.patients[id.0 as usize - 1]
    }

    /// Append an entry to the event log
    fn log(&mut self, id: PatientID, event: PatientEvent, time: Timestamp) {
        let pathway = self
            .patient_mut(id)
            .pathway
            .expect("Pathway is set when the patient starts");
        trace!(
            target: PATIENT_EVENT_TARGET,
            "Run {}: t={time:.3} patient {id} {}",
            self.run_number,
            event.name()
        );
        self.event_log.push(EventLogEntry {
            run: self.run_number,
            patient: id,
            pathway,
            event,
            time,
        });
    }

    #[allow(clippy::cast_possible_truncation)]
    fn into_output(self) -> RunOutput {
        let summary = RunSummary {
            run: self.run_number,
            arrivals: self.patients.len() as u32,
            mean_queue_time_bed: self.results.mean_queue_time(),
            mean_length_of_stay: self.results.mean_length_of_stay(),
        };

        RunOutput {
            summary,
            results: self.results,
            event_log: self.event_log,
            patients: self.patients,
        }
    }
}
