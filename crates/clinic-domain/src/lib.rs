//! Clinic Domain Layer
//!
//! Patient identifiers, the sibling edge model, and the algorithm that keeps
//! sibling families consistent. Storage lives behind the traits in
//! [`traits`]; `clinic-store` provides the SQLite implementation and
//! [`memory`] an in-memory one.
//!
//! ## Key Concepts
//!
//! - **Patient**: a registered record, identified by a UUIDv7 [`PatientId`]
//! - **Sibling edge**: one directed "is a sibling of" entry; always stored in
//!   symmetric pairs
//! - **Clique**: a family, every member linked to every other member
//! - **Clique maintainer**: the only writer of sibling edges
//! - **Visit**: a consultation recorded against a patient
//!
//! ## Architecture
//!
//! - Pure domain logic, no I/O
//! - Infrastructure implementations live in other crates
//! - Trait definitions for every storage interaction

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clique;
pub mod error;
pub mod memory;
pub mod patient;
pub mod relationship;
pub mod traits;
pub mod visit;

// Re-exports for convenience
pub use clique::{audit, CliqueMaintainer, InvariantViolation};
pub use error::SiblingError;
pub use memory::{MemoryStore, MemoryStoreError};
pub use patient::{NewPatient, Patient, PatientId, PatientProfile, PatientUpdate};
pub use relationship::SiblingEdge;
pub use visit::{NewVisit, Visit};
