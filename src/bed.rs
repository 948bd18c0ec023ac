//! The ward's pool of beds.
use crate::patient::PatientID;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A bed's identifier, from 1 to the number of beds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
pub struct BedID(pub u32);

/// A bed.
///
/// Beds can only be created by a [`BedPool`] and are neither `Clone` nor `Copy`, so whoever holds
/// a `Bed` is its only occupant until it is handed back with [`BedPool::release`].
#[derive(Debug, PartialEq, Eq)]
pub struct Bed {
    id: BedID,
}

impl Bed {
    /// The bed's identifier
    pub fn id(&self) -> BedID {
        self.id
    }
}

/// A fixed-size pool of beds with a first-come-first-served queue of waiting patients.
#[derive(Debug)]
pub struct BedPool {
    capacity: u32,
    free: VecDeque<Bed>,
    waiting: VecDeque<PatientID>,
}

impl BedPool {
    /// Create a pool of `n_beds` free beds with IDs `1..=n_beds`
    pub fn new(n_beds: u32) -> Self {
        Self {
            capacity: n_beds,
            free: (1..=n_beds).map(|id| Bed { id: BedID(id) }).collect(),
            waiting: VecDeque::new(),
        }
    }

    /// Request a bed for a patient.
    ///
    /// Returns the longest-free bed if there is one. Otherwise the patient joins the back of the
    /// waiting queue and `None` is returned. The patient will be handed a bed by a later call to
    /// [`BedPool::release`].
    pub fn acquire(&mut self, patient: PatientID) -> Option<Bed> {
        let bed = self.free.pop_front();
        if bed.is_none() {
            self.waiting.push_back(patient);
        }

        bed
    }

    /// Return a bed to the pool.
    ///
    /// If anyone is waiting, the bed goes straight to the patient who has waited longest and that
    /// patient is returned along with the bed.
    pub fn release(&mut self, bed: Bed) -> Option<(PatientID, Bed)> {
        match self.waiting.pop_front() {
            Some(patient) => Some((patient, bed)),
            None => {
                self.free.push_back(bed);
                None
            }
        }
    }

    /// Total number of beds
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of beds currently held by patients
    #[allow(clippy::cast_possible_truncation)]
    pub fn occupied(&self) -> u32 {
        self.capacity - self.free.len() as u32
    }

    /// Number of patients waiting for a bed
    pub fn queue_length(&self) -> usize {
        self.waiting.len()
    }
}
