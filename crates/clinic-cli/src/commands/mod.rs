//! Command implementations.

pub mod config;
pub mod patient;
pub mod sibling;
pub mod visit;

pub use self::config::execute_config;
pub use self::patient::execute_patient;
pub use self::sibling::execute_sibling;
pub use self::visit::execute_visit;

use crate::error::{CliError, Result};
use clinic_domain::Patient;
use clinic_store::SqliteStore;

/// Look up a patient by UUID or display id.
pub(crate) fn resolve_patient(store: &SqliteStore, reference: &str) -> Result<Patient> {
    store
        .resolve(reference)?
        .ok_or_else(|| CliError::UnknownPatient(reference.to_string()))
}
