//! Patient module - the record that sibling links hang off

use chrono::NaiveDate;
use std::fmt;

/// Date format used for dates of birth at every boundary (storage, CLI).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Unique identifier for a patient record based on UUIDv7
///
/// The identifier is opaque to the sibling algorithm; it is only ever
/// compared, hashed and stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatientId(u128);

impl PatientId {
    /// Generate a new UUIDv7-based PatientId
    ///
    /// # Examples
    ///
    /// ```
    /// use clinic_domain::PatientId;
    ///
    /// let id = PatientId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a PatientId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a PatientId from its hyphenated UUID string
    ///
    /// # Examples
    ///
    /// ```
    /// use clinic_domain::PatientId;
    ///
    /// let id = PatientId::new();
    /// let parsed = PatientId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid patient id '{}': {}", s, e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for PatientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// A registered patient
#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    /// Surrogate key
    pub id: PatientId,

    /// Clinic-facing identifier (e.g. "A1147"), unique across patients
    pub display_id: String,

    /// Full name
    pub name: String,

    /// Date of birth
    pub date_of_birth: NaiveDate,

    /// Primary contact number
    pub phone_number: Option<String>,

    /// Family, birth and clinical background
    pub profile: PatientProfile,

    /// When the record was registered (unix seconds)
    pub created_at: u64,
}

/// Background details kept on a patient record
///
/// Every field is optional; blank text is stored as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientProfile {
    /// Home address
    pub address: Option<String>,
    /// Secondary contact number
    pub phone_number_secondary: Option<String>,
    /// Father's name
    pub father_name: Option<String>,
    /// Father's occupation
    pub father_occupation: Option<String>,
    /// Mother's name
    pub mother_name: Option<String>,
    /// Mother's occupation
    pub mother_occupation: Option<String>,
    /// Obstetric history of the mother (para)
    pub para: Option<String>,
    /// Languages spoken at home
    pub languages: Vec<String>,
    /// Hospital of birth
    pub hospital: Option<String>,
    /// Mode of delivery
    pub delivery: Option<String>,
    /// Birth weight in kilograms
    pub birth_weight_kg: Option<f64>,
    /// Birth length in centimetres
    pub birth_length_cm: Option<f64>,
    /// Occipitofrontal circumference at birth in centimetres
    pub birth_ofc_cm: Option<i64>,
    /// G6PD screening result
    pub g6pd: Option<String>,
    /// TSH screening result (mIU/L)
    pub tsh_mlul: Option<i64>,
    /// Feeding method
    pub feeding: Option<String>,
    /// Known allergies
    pub allergies: Option<String>,
    /// Vaccination summary
    pub vaccination_summary: Option<String>,
    /// Free-form notes
    pub other_notes: Option<String>,
}

impl PatientProfile {
    /// Reject measurements that cannot be real
    pub fn validate(&self) -> Result<(), String> {
        for (label, value) in [
            ("birth weight", self.birth_weight_kg),
            ("birth length", self.birth_length_cm),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 {
                    return Err(format!("{} must be a positive number, got {}", label, v));
                }
            }
        }
        if let Some(ofc) = self.birth_ofc_cm {
            if ofc <= 0 {
                return Err(format!("birth OFC must be positive, got {}", ofc));
            }
        }
        if let Some(tsh) = self.tsh_mlul {
            if tsh < 0 {
                return Err(format!("TSH must not be negative, got {}", tsh));
            }
        }
        Ok(())
    }

    /// Trim text, turn blank text into `None` and drop blank languages
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            address: clean(self.address),
            phone_number_secondary: clean(self.phone_number_secondary),
            father_name: clean(self.father_name),
            father_occupation: clean(self.father_occupation),
            mother_name: clean(self.mother_name),
            mother_occupation: clean(self.mother_occupation),
            para: clean(self.para),
            languages: self
                .languages
                .into_iter()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect(),
            hospital: clean(self.hospital),
            delivery: clean(self.delivery),
            birth_weight_kg: self.birth_weight_kg,
            birth_length_cm: self.birth_length_cm,
            birth_ofc_cm: self.birth_ofc_cm,
            g6pd: clean(self.g6pd),
            tsh_mlul: self.tsh_mlul,
            feeding: clean(self.feeding),
            allergies: clean(self.allergies),
            vaccination_summary: clean(self.vaccination_summary),
            other_notes: clean(self.other_notes),
        }
    }
}

/// Payload for registering a new patient
#[derive(Debug, Clone, PartialEq)]
pub struct NewPatient {
    /// Clinic-facing identifier
    pub display_id: String,

    /// Full name
    pub name: String,

    /// Date of birth
    pub date_of_birth: NaiveDate,

    /// Primary contact number
    pub phone_number: Option<String>,

    /// Family, birth and clinical background
    pub profile: PatientProfile,

    /// Existing patients to register as siblings of the new record
    pub sibling_ids: Vec<PatientId>,
}

impl NewPatient {
    /// Create a payload without initial siblings
    pub fn new(display_id: impl Into<String>, name: impl Into<String>, date_of_birth: NaiveDate) -> Self {
        Self {
            display_id: display_id.into(),
            name: name.into(),
            date_of_birth,
            phone_number: None,
            profile: PatientProfile::default(),
            sibling_ids: Vec::new(),
        }
    }

    /// Attach initial siblings
    pub fn with_siblings(mut self, sibling_ids: Vec<PatientId>) -> Self {
        self.sibling_ids = sibling_ids;
        self
    }

    /// Attach a phone number
    pub fn with_phone(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }

    /// Attach background details
    pub fn with_profile(mut self, profile: PatientProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Check the fields that storage cannot check for us
    pub fn validate(&self) -> Result<(), String> {
        self.profile.validate()?;
        if self.display_id.trim().is_empty() {
            return Err("display id must not be empty".to_string());
        }
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        Ok(())
    }

    /// Materialize the record with a freshly generated id
    pub fn into_patient(self, created_at: u64) -> (Patient, Vec<PatientId>) {
        let patient = Patient {
            id: PatientId::new(),
            display_id: self.display_id.trim().to_string(),
            name: self.name.trim().to_string(),
            date_of_birth: self.date_of_birth,
            phone_number: self.phone_number,
            profile: self.profile.normalized(),
            created_at,
        };
        (patient, self.sibling_ids)
    }
}

/// Partial update of a patient record; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientUpdate {
    /// New full name
    pub name: Option<String>,

    /// New date of birth
    pub date_of_birth: Option<NaiveDate>,

    /// New phone number; a blank value clears it
    pub phone_number: Option<String>,

    /// Replacement background details
    pub profile: Option<PatientProfile>,
}

impl PatientUpdate {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.date_of_birth.is_none()
            && self.phone_number.is_none()
            && self.profile.is_none()
    }

    /// Apply the update onto an existing record
    pub fn apply(self, patient: &mut Patient) -> Result<(), String> {
        if let Some(profile) = &self.profile {
            profile.validate()?;
        }
        if let Some(name) = self.name {
            if name.trim().is_empty() {
                return Err("name must not be empty".to_string());
            }
            patient.name = name.trim().to_string();
        }
        if let Some(dob) = self.date_of_birth {
            patient.date_of_birth = dob;
        }
        if let Some(phone) = self.phone_number {
            let phone = phone.trim();
            patient.phone_number = (!phone.is_empty()).then(|| phone.to_string());
        }
        if let Some(profile) = self.profile {
            patient.profile = profile.normalized();
        }
        Ok(())
    }
}

/// Parse a `YYYY-MM-DD` date of birth
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| format!("Invalid date '{}': {} (expected YYYY-MM-DD)", s, e))
}
