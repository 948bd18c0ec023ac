//! The event log: a record of every state change of every patient.
//!
//! The log is the interface to downstream consumers (e.g. animation of patient flow), so the
//! strings used for event names and types must not change.
use crate::bed::BedID;
use crate::patient::{Pathway, PatientID};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

/// Broad category of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
    /// Patient entering or leaving the ward
    ArrivalDeparture,
    /// Patient joining the queue for a bed
    Queue,
    /// Patient starting to use a bed
    ResourceUse,
    /// Patient finishing with a bed
    ResourceUseEnd,
    /// Discharge pushed back to the following morning
    OvernightLog,
}

/// Something which happened to a patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum PatientEvent {
    /// Patient arrived
    Arrival,
    /// Patient started waiting for a bed
    BedWaitBegins,
    /// Patient got into a bed
    BedOccupyBegins(BedID),
    /// Patient would have been discharged overnight. Logged at the unextended discharge time.
    OvernightStay(BedID),
    /// Patient left their bed
    BedOccupyComplete(BedID),
    /// Patient left the ward
    Depart,
}

impl PatientEvent {
    /// The event's name, as written to the log
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// The category of this event
    pub fn event_type(self) -> EventType {
        match self {
            Self::Arrival | Self::Depart => EventType::ArrivalDeparture,
            Self::BedWaitBegins => EventType::Queue,
            Self::BedOccupyBegins(_) => EventType::ResourceUse,
            Self::OvernightStay(_) => EventType::OvernightLog,
            Self::BedOccupyComplete(_) => EventType::ResourceUseEnd,
        }
    }

    /// The bed involved, if any
    pub fn resource_id(self) -> Option<BedID> {
        match self {
            Self::BedOccupyBegins(bed)
            | Self::OvernightStay(bed)
            | Self::BedOccupyComplete(bed) => Some(bed),
            Self::Arrival | Self::BedWaitBegins | Self::Depart => None,
        }
    }
}

/// An entry in the event log
#[derive(Debug, Clone, PartialEq)]
pub struct EventLogEntry {
    /// The run in which the event happened
    pub run: u32,
    /// The patient concerned
    pub patient: PatientID,
    /// The patient's pathway
    pub pathway: Pathway,
    /// What happened
    pub event: PatientEvent,
    /// Simulation time (hours)
    pub time: f64,
}

/// An event log entry in the flat form written to file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogRow {
    /// Patient ID
    pub patient: PatientID,
    /// Pathway label
    pub pathway: Pathway,
    /// Event type label
    pub event_type: String,
    /// Event name
    pub event: String,
    /// Simulation time (hours)
    pub time: f64,
    /// Bed ID, for bed-related events
    pub resource_id: Option<BedID>,
    /// Run number
    pub run: u32,
}

impl From<&EventLogEntry> for EventLogRow {
    fn from(entry: &EventLogEntry) -> Self {
        Self {
            patient: entry.patient,
            pathway: entry.pathway,
            event_type: entry.event.event_type().to_string(),
            event: entry.event.name().to_string(),
            time: entry.time,
            resource_id: entry.event.resource_id(),
            run: entry.run,
        }
    }
}

/// Number of beds in use at `time`, reconstructed from a single run's event log
pub fn occupancy_at(log: &[EventLogEntry], time: f64) -> usize {
    let count = |pred: fn(&PatientEvent) -> bool| {
        log.iter()
            .filter(|entry| entry.time <= time && pred(&entry.event))
            .count()
    };
    let started = count(|event| matches!(event, PatientEvent::BedOccupyBegins(_)));
    let finished = count(|event| matches!(event, PatientEvent::BedOccupyComplete(_)));

    started - finished
}

/// The largest number of beds in use at once during a single run
pub fn peak_occupancy(log: &[EventLogEntry]) -> usize {
    // Bed events are appended in time order, so walking the log replays the ward
    let mut occupied = 0usize;
    let mut peak = 0;
    for entry in log {
        match entry.event {
            PatientEvent::BedOccupyBegins(_) => {
                occupied += 1;
                peak = peak.max(occupied);
            }
            PatientEvent::BedOccupyComplete(_) => occupied -= 1,
            _ => {}
        }
    }

    peak
}
