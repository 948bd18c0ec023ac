//! Patients and the pathway they follow through the ward.
use crate::bed::Bed;
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

/// A patient's identifier, unique within a run and assigned in order of arrival from 1
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize,
)]
pub struct PatientID(pub u32);

/// Which length-of-stay distribution governs a patient
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum Pathway {
    /// Drawn from the short-stay distribution
    #[string = "short-stay"]
    ShortStay,
    /// Drawn from the long-stay distribution
    #[string = "long-stay"]
    LongStay,
}

impl Pathway {
    /// Classify a patient from a uniform(0, 1) draw.
    ///
    /// Draws greater than `long_stay_prob` give short-stay patients.
    pub fn classify(draw: f64, long_stay_prob: f64) -> Self {
        if draw > long_stay_prob {
            Self::ShortStay
        } else {
            Self::LongStay
        }
    }
}

/// Where a patient is in their journey through the ward
#[derive(Debug, Default)]
pub enum PathwayState {
    /// Created by the arrival generator but not yet started
    #[default]
    Created,
    /// Waiting for a bed
    AwaitingBed {
        /// When the wait started
        since: f64,
        /// The sampled (unadjusted) length of stay
        los: f64,
    },
    /// In a bed
    OccupyingBed {
        /// The bed the patient holds
        bed: Bed,
    },
    /// Left the ward
    Departed,
}

/// One patient's timeline through the ward. All times are in hours.
#[derive(Debug)]
pub struct Patient {
    /// Identifier
    pub id: PatientID,
    /// Arrival time
    pub arrival: f64,
    /// Time spent waiting for a bed, once a bed has been allocated
    pub wait_bed: Option<f64>,
    /// Length of stay in bed (including any overnight extension)
    pub bed_los: Option<f64>,
    /// Time from arrival to departure
    pub total_time: Option<f64>,
    /// Set when the pathway process starts
    pub pathway: Option<Pathway>,
    /// Current state
    pub state: PathwayState,
}

impl Patient {
    /// Create a newly arrived patient
    pub fn new(id: PatientID, arrival: f64) -> Self {
        Self {
            id,
            arrival,
            wait_bed: None,
            bed_los: None,
            total_time: None,
            pathway: None,
            state: PathwayState::Created,
        }
    }

    /// Whether the patient has left the ward
    pub fn has_departed(&self) -> bool {
        matches!(self.state, PathwayState::Departed)
    }
}
