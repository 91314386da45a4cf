//! Relationship module - directed sibling edges

use super::PatientId;

/// One directed sibling entry: `sibling` is a registered sibling of `patient`
///
/// Edges are always stored in symmetric pairs; a single `SiblingEdge` is
/// only ever half of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SiblingEdge {
    /// Owning patient
    pub patient: PatientId,

    /// The sibling recorded against `patient`
    pub sibling: PatientId,
}

impl SiblingEdge {
    /// Create a directed edge
    pub fn new(patient: PatientId, sibling: PatientId) -> Self {
        Self { patient, sibling }
    }

    /// The opposite direction of this edge
    pub fn reversed(&self) -> Self {
        Self {
            patient: self.sibling,
            sibling: self.patient,
        }
    }

    /// True for an edge from a patient to itself
    pub fn is_self_loop(&self) -> bool {
        self.patient == self.sibling
    }
}
