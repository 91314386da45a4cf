//! Sibling command implementation.

use super::resolve_patient;
use crate::cli::{SiblingAction, SiblingArgs};
use crate::config::OutputFormat;
use crate::error::Result;
use crate::output::Formatter;
use clinic_store::SqliteStore;

/// Execute the sibling command.
pub fn execute_sibling(args: SiblingArgs, store: &mut SqliteStore, formatter: &Formatter) -> Result<()> {
    match args.action {
        SiblingAction::Link { patient, sibling } => {
            let (patient, sibling) = (resolve_patient(store, &patient)?, resolve_patient(store, &sibling)?);
            let created = store.link_siblings(patient.id, sibling.id)?;
            report_edges(formatter, "created", created)?;
        }
        SiblingAction::Unlink { patient, sibling } => {
            let (patient, sibling) = (resolve_patient(store, &patient)?, resolve_patient(store, &sibling)?);
            let removed = store.unlink_siblings(patient.id, sibling.id)?;
            report_edges(formatter, "removed", removed)?;
        }
        SiblingAction::List { patient } => {
            let patient = resolve_patient(store, &patient)?;
            let siblings = store.siblings_of(patient.id)?;
            println!("{}", formatter.format_patients(&siblings)?);
        }
        SiblingAction::Check => {
            let violations = store.audit_siblings()?;
            println!("{}", formatter.format_violations(&violations)?);
        }
    }
    Ok(())
}

fn report_edges(formatter: &Formatter, operation: &str, count: usize) -> Result<()> {
    match formatter.format() {
        OutputFormat::Json => println!("{}", serde_json::json!({ "edges": count, "operation": operation })),
        OutputFormat::Quiet => println!("{}", count),
        OutputFormat::Table => println!("{}", formatter.edges_changed(operation, count)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use clinic_domain::NewPatient;
    use clinic_domain::patient::parse_date;

    fn store_with(ids: &[&str]) -> SqliteStore {
        let mut store = SqliteStore::new(":memory:").unwrap();
        for id in ids {
            store
                .create_patient(NewPatient::new(*id, format!("Patient {}", id), parse_date("2015-01-01").unwrap()))
                .unwrap();
        }
        store
    }

    fn link(patient: &str, sibling: &str) -> SiblingArgs {
        SiblingArgs {
            action: SiblingAction::Link {
                patient: patient.to_string(),
                sibling: sibling.to_string(),
            },
        }
    }

    #[test]
    fn test_link_by_display_id() {
        let mut store = store_with(&["A1", "A2", "A3"]);
        let formatter = Formatter::new(OutputFormat::Quiet, false);

        execute_sibling(link("A1", "A2"), &mut store, &formatter).unwrap();
        execute_sibling(link("A1", "A3"), &mut store, &formatter).unwrap();

        assert_eq!(store.edge_count().unwrap(), 6);
        assert!(store.audit_siblings().unwrap().is_empty());
    }

    #[test]
    fn test_unlink_by_display_id() {
        let mut store = store_with(&["A1", "A2", "A3"]);
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        execute_sibling(link("A1", "A2"), &mut store, &formatter).unwrap();
        execute_sibling(link("A1", "A3"), &mut store, &formatter).unwrap();

        let unlink = SiblingArgs {
            action: SiblingAction::Unlink {
                patient: "A2".to_string(),
                sibling: "A3".to_string(),
            },
        };
        execute_sibling(unlink, &mut store, &formatter).unwrap();

        assert_eq!(store.edge_count().unwrap(), 2);
    }

    #[test]
    fn test_link_unknown_reference() {
        let mut store = store_with(&["A1"]);
        let formatter = Formatter::new(OutputFormat::Quiet, false);

        let result = execute_sibling(link("A1", "nobody"), &mut store, &formatter);
        assert!(matches!(result, Err(CliError::UnknownPatient(_))));
    }

    #[test]
    fn test_self_link_surfaces_store_error() {
        let mut store = store_with(&["A1"]);
        let formatter = Formatter::new(OutputFormat::Quiet, false);

        let result = execute_sibling(link("A1", "A1"), &mut store, &formatter);
        assert!(matches!(result, Err(CliError::Store(_))));
        assert_eq!(store.edge_count().unwrap(), 0);
    }
}
