//! Visit command implementation.

use super::resolve_patient;
use crate::cli::{AddVisitArgs, VisitAction, VisitArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use chrono::{Local, NaiveDateTime};
use clinic_domain::patient::parse_date;
use clinic_domain::visit::parse_time;
use clinic_domain::{NewVisit, Visit};
use clinic_store::SqliteStore;

/// Execute the visit command.
pub fn execute_visit(args: VisitArgs, store: &mut SqliteStore, formatter: &Formatter) -> Result<()> {
    match args.action {
        VisitAction::Add(add) => {
            let visit = add_visit(add, store, Local::now().naive_local())?;
            println!("{}", formatter.format_visits(&[visit])?);
        }
        VisitAction::List { patient } => {
            let patient = resolve_patient(store, &patient)?;
            let visits = store.visits_of(patient.id)?;
            println!("{}", formatter.format_visits(&visits)?);
        }
    }
    Ok(())
}

/// Record a visit. Missing date or time is taken from `now`.
pub fn add_visit(args: AddVisitArgs, store: &mut SqliteStore, now: NaiveDateTime) -> Result<Visit> {
    let patient = resolve_patient(store, &args.patient)?;
    let date = match args.date.as_deref() {
        Some(date) => parse_date(date).map_err(CliError::InvalidInput)?,
        None => now.date(),
    };
    let time = match args.time.as_deref() {
        Some(time) => parse_time(time).map_err(CliError::InvalidInput)?,
        None => now.time(),
    };

    let mut new = NewVisit::new(patient.id, date, time, args.weight);
    if let Some(notes) = args.notes {
        new = new.with_notes(notes);
    }
    if let Some(charge) = args.charge {
        new = new.with_charge(charge);
    }
    Ok(store.create_visit(new)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use clinic_domain::NewPatient;

    fn store_with_patient() -> SqliteStore {
        let mut store = SqliteStore::new(":memory:").unwrap();
        store
            .create_patient(NewPatient::new("A1", "Aiman", parse_date("2019-04-02").unwrap()))
            .unwrap();
        store
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(16, 45, 12)
            .unwrap()
    }

    fn visit_args(patient: &str) -> AddVisitArgs {
        AddVisitArgs {
            patient: patient.to_string(),
            weight: 13.2,
            date: None,
            time: None,
            notes: None,
            charge: None,
        }
    }

    #[test]
    fn test_add_defaults_to_now() {
        let mut store = store_with_patient();
        let visit = add_visit(visit_args("A1"), &mut store, now()).unwrap();

        assert_eq!(visit.date, now().date());
        assert_eq!(visit.time, NaiveTime::from_hms_opt(16, 45, 0).unwrap());
        assert_eq!(visit.weight_kg, 13.2);
    }

    #[test]
    fn test_add_with_explicit_fields() {
        let mut store = store_with_patient();
        let args = AddVisitArgs {
            date: Some("2025-01-05".to_string()),
            time: Some("08:30".to_string()),
            notes: Some("Follow-up, afebrile".to_string()),
            charge: Some(35.5),
            ..visit_args("A1")
        };

        let visit = add_visit(args, &mut store, now()).unwrap();
        assert_eq!(visit.date, parse_date("2025-01-05").unwrap());
        assert_eq!(visit.time, NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert_eq!(visit.doctor_notes.as_deref(), Some("Follow-up, afebrile"));
        assert_eq!(visit.total_charge, Some(35.5));

        let patient = store.find_by_display_id("A1").unwrap().unwrap();
        assert_eq!(store.visits_of(patient.id).unwrap(), vec![visit]);
    }

    #[test]
    fn test_add_rejects_bad_time() {
        let mut store = store_with_patient();
        let args = AddVisitArgs {
            time: Some("8.30pm".to_string()),
            ..visit_args("A1")
        };
        assert!(matches!(add_visit(args, &mut store, now()), Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_add_for_unknown_patient() {
        let mut store = store_with_patient();
        let result = add_visit(visit_args("ZZ9"), &mut store, now());
        assert!(matches!(result, Err(CliError::UnknownPatient(_))));
    }

    #[test]
    fn test_add_rejects_negative_charge() {
        let mut store = store_with_patient();
        let args = AddVisitArgs {
            charge: Some(-10.0),
            ..visit_args("A1")
        };
        assert!(matches!(add_visit(args, &mut store, now()), Err(CliError::Store(_))));
    }
}
