//! Clinic Storage Layer
//!
//! SQLite-backed patient registry with the sibling join table.
//!
//! # Architecture
//!
//! - `patients` holds the records that own the identifiers
//! - `patient_siblings` holds directed sibling edges, composite primary key,
//!   self-loops rejected by a `CHECK` constraint
//! - `visits` holds consultations, removed with their patient
//! - every mutating operation runs inside one transaction; the sibling
//!   algorithm from `clinic-domain` runs against that transaction through
//!   [`SqliteTransaction`]
//!
//! # Examples
//!
//! ```no_run
//! use clinic_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for patient operations
//! ```

#![warn(missing_docs)]

mod rows;
mod transaction;

pub use transaction::SqliteTransaction;

use clinic_domain::traits::PatientDirectory;
use clinic_domain::{
    audit, CliqueMaintainer, InvariantViolation, NewPatient, NewVisit, Patient, PatientId,
    PatientUpdate, SiblingError, Visit,
};
use rusqlite::{params, Connection, TransactionBehavior};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Patient not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Display id already registered
    #[error("Duplicate patient: display id '{0}' already exists")]
    Duplicate(String),

    /// Request rejected before any write
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Storage-level invariant violated
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl From<SiblingError<StoreError>> for StoreError {
    fn from(err: SiblingError<StoreError>) -> Self {
        match err {
            SiblingError::NotFound(id) => StoreError::NotFound(format!("patient {}", id)),
            SiblingError::InvalidOperation(msg) => StoreError::InvalidOperation(msg),
            SiblingError::Store(e) => e,
        }
    }
}

/// Current timestamp in seconds since Unix epoch
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// How long a writer waits for another connection's lock before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-based patient registry
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own
/// SqliteStore instance. Several stores may share one database file: writes
/// take the write lock up front and wait up to five seconds for it.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a store at the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use clinic_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("clinic.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize pragmas and the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(include_str!("schema.sql"))?;
        info!("Schema ready");
        Ok(())
    }

    /// Run `f` inside one transaction.
    ///
    /// Commits when `f` returns `Ok`; rolls back every write made through
    /// the handle when it returns `Err`.
    pub fn transaction<T, F>(&mut self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut SqliteTransaction<'_>) -> Result<T, StoreError>,
    {
        // IMMEDIATE so the read-then-write in the sibling algorithm never
        // has to upgrade a shared lock
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut tx = SqliteTransaction::new(tx);
        let value = f(&mut tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Register a patient, linking any initial siblings in the same
    /// transaction.
    ///
    /// Rejects a display id that is already taken. If linking fails the
    /// patient row is rolled back too.
    pub fn create_patient(&mut self, new: NewPatient) -> Result<Patient, StoreError> {
        new.validate().map_err(StoreError::InvalidOperation)?;
        let (patient, sibling_ids) = new.into_patient(current_timestamp());

        let patient = self.transaction(|tx| {
            if tx.find_by_display_id(&patient.display_id)?.is_some() {
                return Err(StoreError::Duplicate(patient.display_id.clone()));
            }
            tx.insert_patient(&patient)?;
            CliqueMaintainer::new(&mut *tx).link_all(patient.id, &sibling_ids)?;
            Ok(patient)
        })?;

        info!(
            patient = %patient.id,
            display_id = %patient.display_id,
            siblings = sibling_ids.len(),
            "Patient registered"
        );
        Ok(patient)
    }

    /// Get a patient by id
    pub fn get_patient(&self, id: PatientId) -> Result<Option<Patient>, StoreError> {
        rows::get_patient(&self.conn, id)
    }

    /// Get a patient by clinic-facing display id
    pub fn find_by_display_id(&self, display_id: &str) -> Result<Option<Patient>, StoreError> {
        rows::find_by_display_id(&self.conn, display_id)
    }

    /// Resolve either a UUID or a display id to a patient
    pub fn resolve(&self, reference: &str) -> Result<Option<Patient>, StoreError> {
        match PatientId::from_string(reference) {
            Ok(id) => self.get_patient(id),
            Err(_) => self.find_by_display_id(reference.trim()),
        }
    }

    /// Case-insensitive substring search over name and display id.
    ///
    /// Name matches come first, then display id matches; each patient
    /// appears once. An empty query returns nothing.
    pub fn search_patients(&self, query: &str, limit: usize) -> Result<Vec<Patient>, StoreError> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let limit = i64::try_from(limit)
            .map_err(|_| StoreError::InvalidOperation(format!("search limit {} is too large", limit)))?;

        let sql = format!(
            "SELECT {} FROM patients
             WHERE name LIKE ?1 ESCAPE '\\' OR display_id LIKE ?1 ESCAPE '\\'
             ORDER BY CASE WHEN name LIKE ?1 ESCAPE '\\' THEN 0 ELSE 1 END, name, display_id
             LIMIT ?2",
            rows::PATIENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let patients = stmt
            .query_map(
                params![rows::like_pattern(query), limit],
                rows::patient_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(patients)
    }

    /// Apply a partial update to a patient record
    pub fn update_patient(&mut self, id: PatientId, update: PatientUpdate) -> Result<Patient, StoreError> {
        self.transaction(|tx| {
            let mut patient = tx
                .get_patient(id)?
                .ok_or_else(|| StoreError::NotFound(format!("patient {}", id)))?;
            update
                .apply(&mut patient)
                .map_err(StoreError::InvalidOperation)?;
            tx.update_patient(&patient)?;
            Ok(patient)
        })
    }

    /// Delete a patient, sweeping its sibling edges first.
    ///
    /// Visits go with the row. Returns the number of directed sibling edges
    /// removed.
    pub fn delete_patient(&mut self, id: PatientId) -> Result<usize, StoreError> {
        let swept = self.transaction(|tx| {
            if tx.get_patient(id)?.is_none() {
                return Err(StoreError::NotFound(format!("patient {}", id)));
            }
            let swept = CliqueMaintainer::new(&mut *tx).remove_patient(id)?;
            tx.delete_patient_row(id)?;
            Ok(swept)
        })?;

        info!(patient = %id, edges = swept, "Patient deleted");
        Ok(swept)
    }

    /// Link `sibling` into `patient`'s family.
    ///
    /// Both patients must exist. Returns the number of directed edges
    /// written (zero when the link already existed).
    pub fn link_siblings(&mut self, patient: PatientId, sibling: PatientId) -> Result<usize, StoreError> {
        let result = self.transaction(|tx| {
            if patient != sibling && !tx.contains_patient(sibling)? {
                return Err(StoreError::NotFound(format!("patient {}", sibling)));
            }
            Ok(CliqueMaintainer::new(&mut *tx).link(patient, sibling)?)
        });

        match &result {
            Ok(created) => info!(%patient, %sibling, edges = created, "Siblings linked"),
            Err(e) => warn!(%patient, %sibling, error = %e, "Sibling link rejected"),
        }
        result
    }

    /// Detach `sibling` from `patient`'s family.
    ///
    /// Returns the number of directed edges removed (zero when they were not
    /// linked).
    pub fn unlink_siblings(&mut self, patient: PatientId, sibling: PatientId) -> Result<usize, StoreError> {
        let result = self.transaction(|tx| Ok(CliqueMaintainer::new(&mut *tx).unlink(patient, sibling)?));

        match &result {
            Ok(removed) => info!(%patient, %sibling, edges = removed, "Siblings unlinked"),
            Err(e) => warn!(%patient, %sibling, error = %e, "Sibling unlink rejected"),
        }
        result
    }

    /// The other members of `patient`'s family, ordered by name
    pub fn siblings_of(&self, patient: PatientId) -> Result<Vec<Patient>, StoreError> {
        if !rows::patient_exists(&self.conn, patient)? {
            return Err(StoreError::NotFound(format!("patient {}", patient)));
        }

        let mut siblings = Vec::new();
        for id in rows::neighbors(&self.conn, patient)? {
            let sibling = rows::get_patient(&self.conn, id)?.ok_or_else(|| {
                StoreError::InvalidData(format!("sibling edge points at missing patient {}", id))
            })?;
            siblings.push(sibling);
        }
        siblings.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.display_id.cmp(&b.display_id)));
        Ok(siblings)
    }

    /// Record a visit for an existing patient
    pub fn create_visit(&mut self, new: NewVisit) -> Result<Visit, StoreError> {
        new.validate().map_err(StoreError::InvalidOperation)?;
        let patient = new.patient_id;

        let visit = self.transaction(|tx| {
            if !tx.contains_patient(patient)? {
                return Err(StoreError::NotFound(format!("patient {}", patient)));
            }
            tx.insert_visit(new)
        })?;

        info!(%patient, visit = visit.id, "Visit recorded");
        Ok(visit)
    }

    /// A patient's visits, newest first
    pub fn visits_of(&self, patient: PatientId) -> Result<Vec<Visit>, StoreError> {
        if !rows::patient_exists(&self.conn, patient)? {
            return Err(StoreError::NotFound(format!("patient {}", patient)));
        }
        rows::visits_of(&self.conn, patient)
    }

    /// Check every family for symmetry, self-loops and completeness
    pub fn audit_siblings(&mut self) -> Result<Vec<InvariantViolation>, StoreError> {
        self.transaction(|tx| {
            let ids = tx.patient_ids()?;
            audit(&*tx, ids)
        })
    }

    /// Number of registered patients
    pub fn patient_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Number of directed sibling edges
    pub fn edge_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM patient_siblings", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
