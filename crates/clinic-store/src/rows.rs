//! Row conversions and the queries shared by the store and its transactions

use crate::StoreError;
use clinic_domain::patient::DATE_FORMAT;
use clinic_domain::visit::TIME_FORMAT;
use clinic_domain::{Patient, PatientId, PatientProfile, Visit};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;

pub(crate) const PATIENT_COLUMNS: &str = "id, display_id, name, date_of_birth, phone_number, \
     address, phone_number_secondary, father_name, father_occupation, mother_name, \
     mother_occupation, para, languages, hospital, delivery, birth_weight_kg, birth_length_cm, \
     birth_ofc_cm, g6pd, tsh_mlul, feeding, allergies, vaccination_summary, other_notes, created_at";

pub(crate) const VISIT_COLUMNS: &str =
    "id, patient_id, visit_date, visit_time, weight_kg, doctor_notes, total_charge";

/// Convert PatientId to bytes for storage
pub(crate) fn id_to_bytes(id: PatientId) -> Vec<u8> {
    id.value().to_be_bytes().to_vec()
}

/// Convert bytes to PatientId
pub(crate) fn bytes_to_id(bytes: &[u8]) -> Result<PatientId, StoreError> {
    if bytes.len() != 16 {
        return Err(StoreError::InvalidData(format!(
            "Expected 16 bytes for PatientId, got {}",
            bytes.len()
        )));
    }
    let mut arr = [0u8; 16];
    arr.copy_from_slice(bytes);
    Ok(PatientId::from_value(u128::from_be_bytes(arr)))
}

fn id_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<PatientId> {
    let bytes: Vec<u8> = row.get(idx)?;
    bytes_to_id(&bytes)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Blob, Box::new(e)))
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Encode the languages list for the `languages` column
pub(crate) fn languages_to_json(languages: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(languages)
        .map_err(|e| StoreError::InvalidData(format!("languages: {}", e)))
}

fn languages_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    let profile = PatientProfile {
        address: row.get(5)?,
        phone_number_secondary: row.get(6)?,
        father_name: row.get(7)?,
        father_occupation: row.get(8)?,
        mother_name: row.get(9)?,
        mother_occupation: row.get(10)?,
        para: row.get(11)?,
        languages: languages_column(row, 12)?,
        hospital: row.get(13)?,
        delivery: row.get(14)?,
        birth_weight_kg: row.get(15)?,
        birth_length_cm: row.get(16)?,
        birth_ofc_cm: row.get(17)?,
        g6pd: row.get(18)?,
        tsh_mlul: row.get(19)?,
        feeding: row.get(20)?,
        allergies: row.get(21)?,
        vaccination_summary: row.get(22)?,
        other_notes: row.get(23)?,
    };

    Ok(Patient {
        id: id_column(row, 0)?,
        display_id: row.get(1)?,
        name: row.get(2)?,
        date_of_birth: date_column(row, 3)?,
        phone_number: row.get(4)?,
        profile,
        created_at: row.get::<_, i64>(24)? as u64,
    })
}

pub(crate) fn visit_from_row(row: &Row<'_>) -> rusqlite::Result<Visit> {
    let time: String = row.get(3)?;
    let time = NaiveTime::parse_from_str(&time, TIME_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(Visit {
        id: row.get(0)?,
        patient_id: id_column(row, 1)?,
        date: date_column(row, 2)?,
        time,
        weight_kg: row.get(4)?,
        doctor_notes: row.get(5)?,
        total_charge: row.get(6)?,
    })
}

pub(crate) fn patient_exists(conn: &Connection, id: PatientId) -> Result<bool, StoreError> {
    let exists = conn
        .query_row(
            "SELECT 1 FROM patients WHERE id = ?1",
            params![id_to_bytes(id)],
            |_| Ok(true),
        )
        .optional()?
        .unwrap_or(false);
    Ok(exists)
}

pub(crate) fn get_patient(conn: &Connection, id: PatientId) -> Result<Option<Patient>, StoreError> {
    let sql = format!("SELECT {} FROM patients WHERE id = ?1", PATIENT_COLUMNS);
    let patient = conn
        .query_row(&sql, params![id_to_bytes(id)], patient_from_row)
        .optional()?;
    Ok(patient)
}

pub(crate) fn find_by_display_id(
    conn: &Connection,
    display_id: &str,
) -> Result<Option<Patient>, StoreError> {
    let sql = format!("SELECT {} FROM patients WHERE display_id = ?1", PATIENT_COLUMNS);
    let patient = conn
        .query_row(&sql, params![display_id], patient_from_row)
        .optional()?;
    Ok(patient)
}

pub(crate) fn neighbors(conn: &Connection, id: PatientId) -> Result<BTreeSet<PatientId>, StoreError> {
    let mut stmt = conn.prepare("SELECT sibling_id FROM patient_siblings WHERE patient_id = ?1")?;
    let ids = stmt
        .query_map(params![id_to_bytes(id)], |row| id_column(row, 0))?
        .collect::<Result<BTreeSet<_>, _>>()?;
    Ok(ids)
}

pub(crate) fn edge_exists(conn: &Connection, a: PatientId, b: PatientId) -> Result<bool, StoreError> {
    let exists = conn
        .query_row(
            "SELECT 1 FROM patient_siblings WHERE patient_id = ?1 AND sibling_id = ?2",
            params![id_to_bytes(a), id_to_bytes(b)],
            |_| Ok(true),
        )
        .optional()?
        .unwrap_or(false);
    Ok(exists)
}

/// Visits of one patient, newest first
pub(crate) fn visits_of(conn: &Connection, id: PatientId) -> Result<Vec<Visit>, StoreError> {
    let sql = format!(
        "SELECT {} FROM visits WHERE patient_id = ?1
         ORDER BY visit_date DESC, visit_time DESC, id DESC",
        VISIT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let visits = stmt
        .query_map(params![id_to_bytes(id)], visit_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(visits)
}

pub(crate) fn all_patient_ids(conn: &Connection) -> Result<Vec<PatientId>, StoreError> {
    let mut stmt = conn.prepare("SELECT id FROM patients ORDER BY id")?;
    let ids = stmt
        .query_map([], |row| id_column(row, 0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

/// Escape LIKE wildcards so user input matches literally
pub(crate) fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_bytes_roundtrip() {
        let id = PatientId::new();
        assert_eq!(bytes_to_id(&id_to_bytes(id)).unwrap(), id);
    }

    #[test]
    fn test_bytes_wrong_length() {
        assert!(matches!(bytes_to_id(&[0u8; 8]), Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn test_languages_json() {
        let languages = vec!["Malay".to_string(), "English".to_string()];
        assert_eq!(languages_to_json(&languages).unwrap(), r#"["Malay","English"]"#);
        assert_eq!(languages_to_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("tan"), "%tan%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
