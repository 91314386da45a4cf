//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the sibling algorithm and
//! storage. Implementations live in `memory` (tests) and `clinic-store`.

use crate::PatientId;
use std::collections::BTreeSet;

/// Durable storage of directed sibling edges
///
/// No business rules live here: every operation touches exactly the edge it
/// names. All calls participate in whatever transaction the implementor is
/// bound to.
pub trait RelationshipStore {
    /// Error type for store operations
    type Error;

    /// True iff edge (a, b) is present
    fn edge_exists(&self, a: PatientId, b: PatientId) -> Result<bool, Self::Error>;

    /// Insert edge (a, b); no-op if present, constraint violation if a == b
    fn insert_edge(&mut self, a: PatientId, b: PatientId) -> Result<(), Self::Error>;

    /// Delete edge (a, b); no-op if absent
    fn delete_edge(&mut self, a: PatientId, b: PatientId) -> Result<(), Self::Error>;

    /// All b such that edge (a, b) exists
    fn neighbors(&self, a: PatientId) -> Result<BTreeSet<PatientId>, Self::Error>;

    /// Delete every edge with `id` in either column, returning how many went
    fn delete_edges_touching(&mut self, id: PatientId) -> Result<usize, Self::Error>;
}

/// Existence lookup against the patient records that own the identifiers
pub trait PatientDirectory {
    /// Error type for lookups
    type Error;

    /// True if a patient record with this id exists
    fn contains_patient(&self, id: PatientId) -> Result<bool, Self::Error>;
}

/// A store that can both answer existence checks and hold edges, with one
/// shared error type
pub trait SiblingBackend:
    RelationshipStore + PatientDirectory<Error = <Self as RelationshipStore>::Error>
{
}

impl<T> SiblingBackend for T where
    T: RelationshipStore + PatientDirectory<Error = <T as RelationshipStore>::Error>
{
}
