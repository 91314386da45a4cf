//! In-memory edge store
//!
//! An adjacency map keyed by patient id. Used by tests and by anything that
//! wants to reason about sibling families without a database.

use crate::relationship::SiblingEdge;
use crate::traits::{PatientDirectory, RelationshipStore};
use crate::PatientId;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Errors from [`MemoryStore`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryStoreError {
    /// Edge rejected by a storage-level invariant
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Patients plus directed sibling edges, held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    patients: BTreeSet<PatientId>,
    adjacency: BTreeMap<PatientId, BTreeSet<PatientId>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that knows the given patients and has no edges
    pub fn with_patients<I: IntoIterator<Item = PatientId>>(ids: I) -> Self {
        Self {
            patients: ids.into_iter().collect(),
            adjacency: BTreeMap::new(),
        }
    }

    /// Register a patient
    pub fn add_patient(&mut self, id: PatientId) {
        self.patients.insert(id);
    }

    /// Drop a patient record. Edges are left alone; sweep them first with
    /// `CliqueMaintainer::remove_patient`.
    pub fn forget_patient(&mut self, id: PatientId) {
        self.patients.remove(&id);
    }

    /// Known patients, in id order
    pub fn patients(&self) -> Vec<PatientId> {
        self.patients.iter().copied().collect()
    }

    /// Every directed edge, in (patient, sibling) order
    pub fn edges(&self) -> Vec<SiblingEdge> {
        self.adjacency
            .iter()
            .flat_map(|(&patient, siblings)| {
                siblings.iter().map(move |&sibling| SiblingEdge::new(patient, sibling))
            })
            .collect()
    }

    /// Number of directed edges
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum()
    }
}

impl RelationshipStore for MemoryStore {
    type Error = MemoryStoreError;

    fn edge_exists(&self, a: PatientId, b: PatientId) -> Result<bool, Self::Error> {
        Ok(self.adjacency.get(&a).is_some_and(|s| s.contains(&b)))
    }

    fn insert_edge(&mut self, a: PatientId, b: PatientId) -> Result<(), Self::Error> {
        if a == b {
            return Err(MemoryStoreError::ConstraintViolation(format!(
                "self-loop edge for patient {}",
                a
            )));
        }
        self.adjacency.entry(a).or_default().insert(b);
        Ok(())
    }

    fn delete_edge(&mut self, a: PatientId, b: PatientId) -> Result<(), Self::Error> {
        if let Some(siblings) = self.adjacency.get_mut(&a) {
            siblings.remove(&b);
            if siblings.is_empty() {
                self.adjacency.remove(&a);
            }
        }
        Ok(())
    }

    fn neighbors(&self, a: PatientId) -> Result<BTreeSet<PatientId>, Self::Error> {
        Ok(self.adjacency.get(&a).cloned().unwrap_or_default())
    }

    fn delete_edges_touching(&mut self, id: PatientId) -> Result<usize, Self::Error> {
        let mut removed = self.adjacency.remove(&id).map_or(0, |s| s.len());
        self.adjacency.retain(|_, siblings| {
            if siblings.remove(&id) {
                removed += 1;
            }
            !siblings.is_empty()
        });
        Ok(removed)
    }
}

impl PatientDirectory for MemoryStore {
    type Error = MemoryStoreError;

    fn contains_patient(&self, id: PatientId) -> Result<bool, Self::Error> {
        Ok(self.patients.contains(&id))
    }
}
