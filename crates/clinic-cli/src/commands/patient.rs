//! Patient command implementation.

use super::resolve_patient;
use crate::cli::{AddPatientArgs, PatientAction, PatientArgs, ProfileArgs, UpdatePatientArgs};
use crate::config::{MAX_SEARCH_LIMIT, MIN_SEARCH_LIMIT};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use clinic_domain::patient::parse_date;
use clinic_domain::{NewPatient, Patient, PatientProfile, PatientUpdate};
use clinic_store::SqliteStore;
use std::io::{self, Write};

/// Execute the patient command.
pub fn execute_patient(
    args: PatientArgs,
    store: &mut SqliteStore,
    search_limit: usize,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        PatientAction::Add(add) => {
            let patient = add_patient(add, store)?;
            println!("{}", formatter.format_patients(&[patient])?);
        }
        PatientAction::Show { patient } => {
            let patient = resolve_patient(store, &patient)?;
            let siblings = store.siblings_of(patient.id)?;
            let visits = store.visits_of(patient.id)?;
            println!("{}", formatter.format_patient_detail(&patient, &siblings, &visits)?);
        }
        PatientAction::Search { query, limit } => {
            let patients = search_patients(store, &query, limit.unwrap_or(search_limit))?;
            println!("{}", formatter.format_patients(&patients)?);
        }
        PatientAction::Update(update) => {
            let patient = update_patient(update, store)?;
            println!("{}", formatter.format_patients(&[patient])?);
        }
        PatientAction::Delete { patient, yes } => {
            let patient = resolve_patient(store, &patient)?;
            if !yes && !confirm(&format!("Delete {} ({})?", patient.name, patient.display_id))? {
                println!("{}", formatter.info("Operation cancelled"));
                return Ok(());
            }
            let swept = store.delete_patient(patient.id)?;
            println!(
                "{}",
                formatter.success(&format!(
                    "Deleted {} and removed {} sibling edge(s)",
                    patient.display_id, swept
                ))
            );
        }
    }
    Ok(())
}

/// Register a patient, resolving any initial siblings first.
pub fn add_patient(args: AddPatientArgs, store: &mut SqliteStore) -> Result<Patient> {
    let date_of_birth = parse_date(&args.dob).map_err(CliError::InvalidInput)?;
    let sibling_ids = args
        .siblings
        .iter()
        .map(|reference| resolve_patient(&*store, reference).map(|p| p.id))
        .collect::<Result<Vec<_>>>()?;

    let mut new = NewPatient::new(args.display_id, args.name, date_of_birth)
        .with_siblings(sibling_ids)
        .with_profile(args.profile.merge_into(PatientProfile::default()));
    if let Some(phone) = args.phone.filter(|p| !p.trim().is_empty()) {
        new = new.with_phone(phone.trim());
    }
    Ok(store.create_patient(new)?)
}

/// Search with a caller-supplied limit, held to the same range as the
/// configured one.
pub fn search_patients(store: &SqliteStore, query: &str, limit: usize) -> Result<Vec<Patient>> {
    if !(MIN_SEARCH_LIMIT..=MAX_SEARCH_LIMIT).contains(&limit) {
        return Err(CliError::InvalidInput(format!(
            "limit must be between {} and {}, got {}",
            MIN_SEARCH_LIMIT, MAX_SEARCH_LIMIT, limit
        )));
    }
    Ok(store.search_patients(query, limit)?)
}

/// Apply the given field changes to an existing patient.
pub fn update_patient(args: UpdatePatientArgs, store: &mut SqliteStore) -> Result<Patient> {
    let patient = resolve_patient(store, &args.patient)?;
    let update = PatientUpdate {
        name: args.name,
        date_of_birth: args
            .dob
            .as_deref()
            .map(parse_date)
            .transpose()
            .map_err(CliError::InvalidInput)?,
        phone_number: args.phone,
        profile: (!args.profile.is_empty()).then(|| args.profile.merge_into(patient.profile.clone())),
    };
    if update.is_empty() {
        return Err(CliError::InvalidInput(
            "nothing to update; pass --name, --dob, --phone or a profile flag".to_string(),
        ));
    }
    Ok(store.update_patient(patient.id, update)?)
}

impl ProfileArgs {
    /// True when no profile flag was given
    pub fn is_empty(&self) -> bool {
        self.address.is_none()
            && self.phone_secondary.is_none()
            && self.father_name.is_none()
            && self.father_occupation.is_none()
            && self.mother_name.is_none()
            && self.mother_occupation.is_none()
            && self.para.is_none()
            && self.languages.is_empty()
            && self.hospital.is_none()
            && self.delivery.is_none()
            && self.birth_weight.is_none()
            && self.birth_length.is_none()
            && self.birth_ofc.is_none()
            && self.g6pd.is_none()
            && self.tsh.is_none()
            && self.feeding.is_none()
            && self.allergies.is_none()
            && self.vaccination.is_none()
            && self.notes.is_none()
    }

    /// Overlay the given flags on `base`. Blank text survives here and is
    /// cleared when the profile is normalized on write.
    pub fn merge_into(self, mut base: PatientProfile) -> PatientProfile {
        fn set<T>(field: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *field = value;
            }
        }

        set(&mut base.address, self.address);
        set(&mut base.phone_number_secondary, self.phone_secondary);
        set(&mut base.father_name, self.father_name);
        set(&mut base.father_occupation, self.father_occupation);
        set(&mut base.mother_name, self.mother_name);
        set(&mut base.mother_occupation, self.mother_occupation);
        set(&mut base.para, self.para);
        if !self.languages.is_empty() {
            base.languages = self.languages;
        }
        set(&mut base.hospital, self.hospital);
        set(&mut base.delivery, self.delivery);
        set(&mut base.birth_weight_kg, self.birth_weight);
        set(&mut base.birth_length_cm, self.birth_length);
        set(&mut base.birth_ofc_cm, self.birth_ofc);
        set(&mut base.g6pd, self.g6pd);
        set(&mut base.tsh_mlul, self.tsh);
        set(&mut base.feeding, self.feeding);
        set(&mut base.allergies, self.allergies);
        set(&mut base.vaccination_summary, self.vaccination);
        set(&mut base.other_notes, self.notes);
        base
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().eq_ignore_ascii_case("y"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_args(display_id: &str, name: &str, siblings: &[&str]) -> AddPatientArgs {
        AddPatientArgs {
            display_id: display_id.to_string(),
            name: name.to_string(),
            dob: "2017-03-09".to_string(),
            phone: None,
            siblings: siblings.iter().map(|s| s.to_string()).collect(),
            profile: ProfileArgs::default(),
        }
    }

    fn update_args(patient: &str) -> UpdatePatientArgs {
        UpdatePatientArgs {
            patient: patient.to_string(),
            name: None,
            dob: None,
            phone: None,
            profile: ProfileArgs::default(),
        }
    }

    #[test]
    fn test_add_with_siblings_by_display_id() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let first = add_patient(add_args("A1", "Aiman", &[]), &mut store).unwrap();
        let second = add_patient(add_args("A2", "Balqis", &["A1"]), &mut store).unwrap();

        let siblings = store.siblings_of(first.id).unwrap();
        assert_eq!(siblings.len(), 1);
        assert_eq!(siblings[0].id, second.id);
    }

    #[test]
    fn test_add_rejects_bad_date() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let mut args = add_args("A1", "Aiman", &[]);
        args.dob = "09/03/2017".to_string();

        assert!(matches!(add_patient(args, &mut store), Err(CliError::InvalidInput(_))));
        assert_eq!(store.patient_count().unwrap(), 0);
    }

    #[test]
    fn test_add_rejects_unknown_sibling() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let result = add_patient(add_args("A1", "Aiman", &["ZZ9"]), &mut store);

        assert!(matches!(result, Err(CliError::UnknownPatient(_))));
        assert_eq!(store.patient_count().unwrap(), 0);
    }

    #[test]
    fn test_update_requires_a_field() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        add_patient(add_args("A1", "Aiman", &[]), &mut store).unwrap();

        let args = update_args("A1");
        assert!(matches!(update_patient(args, &mut store), Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_update_date_of_birth() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        add_patient(add_args("A1", "Aiman", &[]), &mut store).unwrap();

        let args = UpdatePatientArgs {
            dob: Some("2016-12-31".to_string()),
            ..update_args("A1")
        };
        let updated = update_patient(args, &mut store).unwrap();
        assert_eq!(updated.date_of_birth, parse_date("2016-12-31").unwrap());
    }

    #[test]
    fn test_search_limit_range() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        add_patient(add_args("A1", "Aiman", &[]), &mut store).unwrap();

        assert!(matches!(search_patients(&store, "a", 0), Err(CliError::InvalidInput(_))));
        assert!(matches!(search_patients(&store, "a", 101), Err(CliError::InvalidInput(_))));
        assert!(matches!(
            search_patients(&store, "a", usize::MAX),
            Err(CliError::InvalidInput(_))
        ));
        assert_eq!(search_patients(&store, "a", 100).unwrap().len(), 1);
    }

    #[test]
    fn test_add_with_profile() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let mut args = add_args("A1", "Aiman", &[]);
        args.profile = ProfileArgs {
            mother_name: Some("Siti".to_string()),
            languages: vec!["Malay".to_string()],
            birth_ofc: Some(34),
            allergies: Some("  ".to_string()),
            ..Default::default()
        };

        let patient = add_patient(args, &mut store).unwrap();
        assert_eq!(patient.profile.mother_name.as_deref(), Some("Siti"));
        assert_eq!(patient.profile.languages, vec!["Malay"]);
        assert_eq!(patient.profile.birth_ofc_cm, Some(34));
        assert!(patient.profile.allergies.is_none());
    }

    #[test]
    fn test_update_profile_keeps_untouched_fields() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let mut args = add_args("A1", "Aiman", &[]);
        args.profile = ProfileArgs {
            father_name: Some("Rahman".to_string()),
            g6pd: Some("Normal".to_string()),
            feeding: Some("Formula".to_string()),
            ..Default::default()
        };
        add_patient(args, &mut store).unwrap();

        let args = UpdatePatientArgs {
            profile: ProfileArgs {
                g6pd: Some("Deficient".to_string()),
                feeding: Some(String::new()),
                ..Default::default()
            },
            ..update_args("A1")
        };
        let updated = update_patient(args, &mut store).unwrap();

        assert_eq!(updated.profile.father_name.as_deref(), Some("Rahman"));
        assert_eq!(updated.profile.g6pd.as_deref(), Some("Deficient"));
        assert!(updated.profile.feeding.is_none());
        assert_eq!(store.find_by_display_id("A1").unwrap().unwrap().profile, updated.profile);
    }

    #[test]
    fn test_update_rejects_bad_birth_length() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        add_patient(add_args("A1", "Aiman", &[]), &mut store).unwrap();

        let args = UpdatePatientArgs {
            profile: ProfileArgs {
                birth_length: Some(0.0),
                ..Default::default()
            },
            ..update_args("A1")
        };
        assert!(update_patient(args, &mut store).is_err());
    }
}
