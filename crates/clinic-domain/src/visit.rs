//! Visit module - consultations recorded against a patient

use crate::PatientId;
use chrono::{NaiveDate, NaiveTime, Timelike};

/// Time format used for visit times at every boundary
pub const TIME_FORMAT: &str = "%H:%M";

/// A recorded consultation
#[derive(Debug, Clone, PartialEq)]
pub struct Visit {
    /// Row id assigned by storage, increasing in insertion order
    pub id: i64,

    /// Patient seen
    pub patient_id: PatientId,

    /// Consultation date
    pub date: NaiveDate,

    /// Consultation time
    pub time: NaiveTime,

    /// Weight measured at the visit, in kilograms
    pub weight_kg: f64,

    /// Doctor's notes
    pub doctor_notes: Option<String>,

    /// Amount charged
    pub total_charge: Option<f64>,
}

/// Payload for recording a visit
#[derive(Debug, Clone, PartialEq)]
pub struct NewVisit {
    /// Patient seen
    pub patient_id: PatientId,

    /// Consultation date
    pub date: NaiveDate,

    /// Consultation time
    pub time: NaiveTime,

    /// Weight in kilograms
    pub weight_kg: f64,

    /// Doctor's notes
    pub doctor_notes: Option<String>,

    /// Amount charged
    pub total_charge: Option<f64>,
}

impl NewVisit {
    /// Create a payload without notes or charge
    pub fn new(patient_id: PatientId, date: NaiveDate, time: NaiveTime, weight_kg: f64) -> Self {
        Self {
            patient_id,
            date,
            time,
            weight_kg,
            doctor_notes: None,
            total_charge: None,
        }
    }

    /// Attach doctor's notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.doctor_notes = Some(notes.into());
        self
    }

    /// Attach the amount charged
    pub fn with_charge(mut self, charge: f64) -> Self {
        self.total_charge = Some(charge);
        self
    }

    /// Weight must be positive, a charge must not be negative
    pub fn validate(&self) -> Result<(), String> {
        if !self.weight_kg.is_finite() || self.weight_kg <= 0.0 {
            return Err(format!("weight must be a positive number, got {}", self.weight_kg));
        }
        if let Some(charge) = self.total_charge {
            if !charge.is_finite() || charge < 0.0 {
                return Err(format!("charge must not be negative, got {}", charge));
            }
        }
        Ok(())
    }

    /// Materialize the record with the id storage assigned.
    ///
    /// Times are kept to the minute.
    pub fn into_visit(self, id: i64) -> Visit {
        let time = self
            .time
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(self.time);
        Visit {
            id,
            patient_id: self.patient_id,
            date: self.date,
            time,
            weight_kg: self.weight_kg,
            doctor_notes: self
                .doctor_notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            total_charge: self.total_charge,
        }
    }
}

/// Parse an `HH:MM` or `HH:MM:SS` time
pub fn parse_time(s: &str) -> Result<NaiveTime, String> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| format!("Invalid time '{}': {} (expected HH:MM)", s, e))
}
