//! Transaction handle that carries the sibling traits

use crate::rows::{self, id_to_bytes, languages_to_json};
use crate::StoreError;
use clinic_domain::patient::DATE_FORMAT;
use clinic_domain::traits::{PatientDirectory, RelationshipStore};
use clinic_domain::visit::TIME_FORMAT;
use clinic_domain::{NewVisit, Patient, PatientId, Visit};
use rusqlite::{named_params, params, Transaction};
use std::collections::BTreeSet;
use tracing::debug;

/// One open SQLite transaction
///
/// Handed to the closure passed to [`SqliteStore::transaction`](crate::SqliteStore::transaction).
/// Everything done through it commits or rolls back together.
pub struct SqliteTransaction<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> SqliteTransaction<'conn> {
    pub(crate) fn new(tx: Transaction<'conn>) -> Self {
        Self { tx }
    }

    pub(crate) fn commit(self) -> Result<(), StoreError> {
        self.tx.commit()?;
        Ok(())
    }

    /// Look up a patient inside this transaction
    pub fn get_patient(&self, id: PatientId) -> Result<Option<Patient>, StoreError> {
        rows::get_patient(&self.tx, id)
    }

    /// Look up a patient by clinic-facing id inside this transaction
    pub fn find_by_display_id(&self, display_id: &str) -> Result<Option<Patient>, StoreError> {
        rows::find_by_display_id(&self.tx, display_id)
    }

    /// Every registered patient id
    pub fn patient_ids(&self) -> Result<Vec<PatientId>, StoreError> {
        rows::all_patient_ids(&self.tx)
    }

    /// Insert a patient row
    pub fn insert_patient(&mut self, patient: &Patient) -> Result<(), StoreError> {
        self.write_patient(
            "INSERT INTO patients (id, display_id, name, date_of_birth, phone_number,
                 address, phone_number_secondary, father_name, father_occupation,
                 mother_name, mother_occupation, para, languages, hospital, delivery,
                 birth_weight_kg, birth_length_cm, birth_ofc_cm, g6pd, tsh_mlul, feeding,
                 allergies, vaccination_summary, other_notes, created_at)
             VALUES (:id, :display_id, :name, :date_of_birth, :phone_number,
                 :address, :phone_number_secondary, :father_name, :father_occupation,
                 :mother_name, :mother_occupation, :para, :languages, :hospital, :delivery,
                 :birth_weight_kg, :birth_length_cm, :birth_ofc_cm, :g6pd, :tsh_mlul, :feeding,
                 :allergies, :vaccination_summary, :other_notes, :created_at)",
            patient,
        )?;
        Ok(())
    }

    /// Overwrite the mutable columns of a patient row
    pub fn update_patient(&mut self, patient: &Patient) -> Result<(), StoreError> {
        let changed = self.write_patient(
            "UPDATE patients SET
                 name = :name, date_of_birth = :date_of_birth, phone_number = :phone_number,
                 address = :address, phone_number_secondary = :phone_number_secondary,
                 father_name = :father_name, father_occupation = :father_occupation,
                 mother_name = :mother_name, mother_occupation = :mother_occupation,
                 para = :para, languages = :languages, hospital = :hospital,
                 delivery = :delivery, birth_weight_kg = :birth_weight_kg,
                 birth_length_cm = :birth_length_cm, birth_ofc_cm = :birth_ofc_cm,
                 g6pd = :g6pd, tsh_mlul = :tsh_mlul, feeding = :feeding,
                 allergies = :allergies, vaccination_summary = :vaccination_summary,
                 other_notes = :other_notes
             WHERE id = :id AND display_id = :display_id AND created_at = :created_at",
            patient,
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("patient {}", patient.id)));
        }
        Ok(())
    }

    // Both statements bind the full column set by name
    fn write_patient(&mut self, sql: &str, patient: &Patient) -> Result<usize, StoreError> {
        let profile = &patient.profile;
        let written = self.tx.execute(
            sql,
            named_params! {
                ":id": id_to_bytes(patient.id),
                ":display_id": &patient.display_id,
                ":name": &patient.name,
                ":date_of_birth": patient.date_of_birth.format(DATE_FORMAT).to_string(),
                ":phone_number": &patient.phone_number,
                ":address": &profile.address,
                ":phone_number_secondary": &profile.phone_number_secondary,
                ":father_name": &profile.father_name,
                ":father_occupation": &profile.father_occupation,
                ":mother_name": &profile.mother_name,
                ":mother_occupation": &profile.mother_occupation,
                ":para": &profile.para,
                ":languages": languages_to_json(&profile.languages)?,
                ":hospital": &profile.hospital,
                ":delivery": &profile.delivery,
                ":birth_weight_kg": profile.birth_weight_kg,
                ":birth_length_cm": profile.birth_length_cm,
                ":birth_ofc_cm": profile.birth_ofc_cm,
                ":g6pd": &profile.g6pd,
                ":tsh_mlul": profile.tsh_mlul,
                ":feeding": &profile.feeding,
                ":allergies": &profile.allergies,
                ":vaccination_summary": &profile.vaccination_summary,
                ":other_notes": &profile.other_notes,
                ":created_at": patient.created_at as i64,
            },
        )?;
        Ok(written)
    }

    /// Insert a visit row, returning the stored record
    pub fn insert_visit(&mut self, new: NewVisit) -> Result<Visit, StoreError> {
        self.tx.execute(
            "INSERT INTO visits (patient_id, visit_date, visit_time, weight_kg, doctor_notes, total_charge)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id_to_bytes(new.patient_id),
                new.date.format(DATE_FORMAT).to_string(),
                new.time.format(TIME_FORMAT).to_string(),
                new.weight_kg,
                new.doctor_notes.as_deref().map(str::trim).filter(|n| !n.is_empty()),
                new.total_charge,
            ],
        )?;
        Ok(new.into_visit(self.tx.last_insert_rowid()))
    }

    /// Delete a patient row. Sibling edges must already be swept.
    pub fn delete_patient_row(&mut self, id: PatientId) -> Result<bool, StoreError> {
        let deleted = self
            .tx
            .execute("DELETE FROM patients WHERE id = ?1", params![id_to_bytes(id)])?;
        Ok(deleted > 0)
    }
}

impl RelationshipStore for SqliteTransaction<'_> {
    type Error = StoreError;

    fn edge_exists(&self, a: PatientId, b: PatientId) -> Result<bool, Self::Error> {
        rows::edge_exists(&self.tx, a, b)
    }

    fn insert_edge(&mut self, a: PatientId, b: PatientId) -> Result<(), Self::Error> {
        if a == b {
            return Err(StoreError::ConstraintViolation(format!(
                "self-loop sibling edge for patient {}",
                a
            )));
        }
        let inserted = self.tx.execute(
            "INSERT INTO patient_siblings (patient_id, sibling_id) VALUES (?1, ?2)
             ON CONFLICT(patient_id, sibling_id) DO NOTHING",
            params![id_to_bytes(a), id_to_bytes(b)],
        )?;
        if inserted > 0 {
            debug!(patient = %a, sibling = %b, "sibling edge inserted");
        }
        Ok(())
    }

    fn delete_edge(&mut self, a: PatientId, b: PatientId) -> Result<(), Self::Error> {
        let deleted = self.tx.execute(
            "DELETE FROM patient_siblings WHERE patient_id = ?1 AND sibling_id = ?2",
            params![id_to_bytes(a), id_to_bytes(b)],
        )?;
        if deleted > 0 {
            debug!(patient = %a, sibling = %b, "sibling edge deleted");
        }
        Ok(())
    }

    fn neighbors(&self, a: PatientId) -> Result<BTreeSet<PatientId>, Self::Error> {
        rows::neighbors(&self.tx, a)
    }

    fn delete_edges_touching(&mut self, id: PatientId) -> Result<usize, Self::Error> {
        let bytes = id_to_bytes(id);
        let deleted = self.tx.execute(
            "DELETE FROM patient_siblings WHERE patient_id = ?1 OR sibling_id = ?1",
            params![bytes],
        )?;
        debug!(patient = %id, edges = deleted, "sibling edges swept");
        Ok(deleted)
    }
}

impl PatientDirectory for SqliteTransaction<'_> {
    type Error = StoreError;

    fn contains_patient(&self, id: PatientId) -> Result<bool, Self::Error> {
        rows::patient_exists(&self.tx, id)
    }
}
