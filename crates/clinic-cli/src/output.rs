//! Output formatting for the CLI.

use crate::config::{Config, OutputFormat};
use crate::error::Result;
use clinic_domain::patient::DATE_FORMAT;
use clinic_domain::visit::TIME_FORMAT;
use clinic_domain::{InvariantViolation, Patient, PatientProfile, Visit};
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// The format this formatter renders.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format a list of patients.
    pub fn format_patients(&self, patients: &[Patient]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let values: Vec<serde_json::Value> = patients.iter().map(patient_json).collect();
                Ok(serde_json::to_string_pretty(&values)?)
            }
            OutputFormat::Table => Ok(self.format_patients_table(patients)),
            OutputFormat::Quiet => Ok(patients
                .iter()
                .map(|p| p.display_id.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Format one patient together with their siblings and visits.
    pub fn format_patient_detail(
        &self,
        patient: &Patient,
        siblings: &[Patient],
        visits: &[Visit],
    ) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let mut value = patient_json(patient);
                value["profile"] = profile_json(&patient.profile);
                value["siblings"] = siblings.iter().map(patient_json).collect();
                value["visits"] = visits.iter().map(visit_json).collect();
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Quiet => Ok(patient.display_id.clone()),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Field", "Value"]);
                builder.push_record(["ID", &patient.id.to_string()]);
                builder.push_record(["Display ID", &patient.display_id]);
                builder.push_record(["Name", &patient.name]);
                builder.push_record(["Date of birth", &patient.date_of_birth.format(DATE_FORMAT).to_string()]);
                builder.push_record(["Phone", patient.phone_number.as_deref().unwrap_or("-")]);
                for (field, value) in profile_rows(&patient.profile) {
                    builder.push_record([field.to_string(), value]);
                }
                let sibling_names = if siblings.is_empty() {
                    "-".to_string()
                } else {
                    siblings
                        .iter()
                        .map(|s| format!("{} ({})", s.name, s.display_id))
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                builder.push_record(["Siblings", &sibling_names]);

                let mut table = builder.build();
                table.with(Style::rounded());
                if visits.is_empty() {
                    return Ok(table.to_string());
                }
                Ok(format!("{}\n{}", table, self.format_visits_table(visits)))
            }
        }
    }

    /// Format a list of visits.
    pub fn format_visits(&self, visits: &[Visit]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let values: Vec<serde_json::Value> = visits.iter().map(visit_json).collect();
                Ok(serde_json::to_string_pretty(&values)?)
            }
            OutputFormat::Table => Ok(self.format_visits_table(visits)),
            OutputFormat::Quiet => Ok(visits
                .iter()
                .map(|v| v.id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_visits_table(&self, visits: &[Visit]) -> String {
        if visits.is_empty() {
            return self.colorize("No visits recorded.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Visit", "Date", "Time", "Weight (kg)", "Charge", "Notes"]);

        for visit in visits {
            builder.push_record([
                visit.id.to_string(),
                visit.date.format(DATE_FORMAT).to_string(),
                visit.time.format(TIME_FORMAT).to_string(),
                format!("{:.2}", visit.weight_kg),
                visit
                    .total_charge
                    .map(|c| format!("{:.2}", c))
                    .unwrap_or_else(|| "-".to_string()),
                visit.doctor_notes.clone().unwrap_or_else(|| "-".to_string()),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    fn format_patients_table(&self, patients: &[Patient]) -> String {
        if patients.is_empty() {
            return self.colorize("No patients found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Display ID", "Name", "Date of birth", "Phone", "ID"]);

        for patient in patients {
            let id = patient.id.to_string();
            builder.push_record([
                patient.display_id.as_str(),
                patient.name.as_str(),
                &patient.date_of_birth.format(DATE_FORMAT).to_string(),
                patient.phone_number.as_deref().unwrap_or("-"),
                &id[..8], // Truncate ID for readability
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format the result of a family audit.
    pub fn format_violations(&self, violations: &[InvariantViolation]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let values: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
                Ok(serde_json::to_string_pretty(&values)?)
            }
            _ if violations.is_empty() => Ok(self.success("All sibling families are consistent")),
            _ => Ok(violations
                .iter()
                .map(|v| self.error(&v.to_string()))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Format the effective configuration.
    pub fn format_config(&self, config: &Config) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(config)?),
            _ => Ok(format!(
                "database_path = {}\nsearch_limit  = {}\nlog_level     = {}\ncolor         = {}\nformat        = {}",
                config.database_path.display(),
                config.search_limit,
                config.log_level,
                config.settings.color,
                config.settings.format
            )),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format the result of an edge-changing operation.
    pub fn edges_changed(&self, operation: &str, count: usize) -> String {
        if count == 0 {
            self.info(&format!("Nothing to do, no sibling edges {}", operation))
        } else {
            self.success(&format!("{} {} sibling edge(s)", capitalize(operation), count))
        }
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn patient_json(patient: &Patient) -> serde_json::Value {
    serde_json::json!({
        "id": patient.id.to_string(),
        "display_id": patient.display_id,
        "name": patient.name,
        "date_of_birth": patient.date_of_birth.format(DATE_FORMAT).to_string(),
        "phone_number": patient.phone_number,
        "created_at": patient.created_at,
    })
}

fn profile_json(profile: &PatientProfile) -> serde_json::Value {
    serde_json::json!({
        "address": profile.address,
        "phone_number_secondary": profile.phone_number_secondary,
        "father_name": profile.father_name,
        "father_occupation": profile.father_occupation,
        "mother_name": profile.mother_name,
        "mother_occupation": profile.mother_occupation,
        "para": profile.para,
        "languages": profile.languages,
        "hospital": profile.hospital,
        "delivery": profile.delivery,
        "birth_weight_kg": profile.birth_weight_kg,
        "birth_length_cm": profile.birth_length_cm,
        "birth_ofc_cm": profile.birth_ofc_cm,
        "g6pd": profile.g6pd,
        "tsh_mlul": profile.tsh_mlul,
        "feeding": profile.feeding,
        "allergies": profile.allergies,
        "vaccination_summary": profile.vaccination_summary,
        "other_notes": profile.other_notes,
    })
}

/// Labelled profile values, skipping the ones not recorded
fn profile_rows(profile: &PatientProfile) -> Vec<(&'static str, String)> {
    let text = [
        ("Address", &profile.address),
        ("Phone 2", &profile.phone_number_secondary),
        ("Father", &profile.father_name),
        ("Father's occupation", &profile.father_occupation),
        ("Mother", &profile.mother_name),
        ("Mother's occupation", &profile.mother_occupation),
        ("Para", &profile.para),
        ("Hospital", &profile.hospital),
        ("Delivery", &profile.delivery),
        ("G6PD", &profile.g6pd),
        ("Feeding", &profile.feeding),
        ("Allergies", &profile.allergies),
        ("Vaccination", &profile.vaccination_summary),
        ("Notes", &profile.other_notes),
    ];

    let mut rows: Vec<(&'static str, String)> = text
        .into_iter()
        .filter_map(|(label, value)| value.clone().map(|v| (label, v)))
        .collect();
    if !profile.languages.is_empty() {
        rows.push(("Languages", profile.languages.join(", ")));
    }
    if let Some(weight) = profile.birth_weight_kg {
        rows.push(("Birth weight (kg)", weight.to_string()));
    }
    if let Some(length) = profile.birth_length_cm {
        rows.push(("Birth length (cm)", length.to_string()));
    }
    if let Some(ofc) = profile.birth_ofc_cm {
        rows.push(("Birth OFC (cm)", ofc.to_string()));
    }
    if let Some(tsh) = profile.tsh_mlul {
        rows.push(("TSH (mIU/L)", tsh.to_string()));
    }
    rows
}

fn visit_json(visit: &Visit) -> serde_json::Value {
    serde_json::json!({
        "id": visit.id,
        "patient_id": visit.patient_id.to_string(),
        "date": visit.date.format(DATE_FORMAT).to_string(),
        "time": visit.time.format(TIME_FORMAT).to_string(),
        "weight_kg": visit.weight_kg,
        "doctor_notes": visit.doctor_notes,
        "total_charge": visit.total_charge,
    })
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_domain::patient::parse_date;
    use clinic_domain::{NewVisit, PatientId, SiblingEdge};
    use chrono::NaiveTime;

    fn create_test_patient(display_id: &str, name: &str) -> Patient {
        Patient {
            id: PatientId::new(),
            display_id: display_id.to_string(),
            name: name.to_string(),
            date_of_birth: parse_date("2018-06-21").unwrap(),
            phone_number: None,
            profile: PatientProfile::default(),
            created_at: 1_700_000_000,
        }
    }

    fn create_test_visit(patient: &Patient, id: i64) -> Visit {
        NewVisit::new(
            patient.id,
            parse_date("2025-03-14").unwrap(),
            NaiveTime::from_hms_opt(9, 5, 0).unwrap(),
            14.25,
        )
        .with_charge(40.0)
        .into_visit(id)
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter
            .format_patients(&[create_test_patient("A1", "Aiman")])
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["display_id"], "A1");
        assert_eq!(parsed[0]["date_of_birth"], "2018-06-21");
        assert!(parsed[0]["phone_number"].is_null());
    }

    #[test]
    fn test_quiet_format() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter
            .format_patients(&[create_test_patient("A1", "Aiman"), create_test_patient("A2", "Balqis")])
            .unwrap();
        assert_eq!(output, "A1\nA2");
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter
            .format_patients(&[create_test_patient("A1", "Aiman")])
            .unwrap();
        assert!(output.contains("Display ID"));
        assert!(output.contains("Aiman"));
    }

    #[test]
    fn test_empty_patients() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_patients(&[]).unwrap();
        assert!(output.contains("No patients found"));
    }

    #[test]
    fn test_detail_lists_siblings() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let patient = create_test_patient("A1", "Aiman");
        let sibling = create_test_patient("A2", "Balqis");
        let visit = create_test_visit(&patient, 3);
        let output = formatter
            .format_patient_detail(&patient, &[sibling], &[visit])
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["siblings"][0]["display_id"], "A2");
        assert_eq!(parsed["visits"][0]["id"], 3);
        assert_eq!(parsed["visits"][0]["time"], "09:05");
        assert!(parsed["profile"]["languages"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_detail_table_shows_recorded_profile_and_visits() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let mut patient = create_test_patient("A1", "Aiman");
        patient.profile.mother_name = Some("Siti".to_string());
        patient.profile.languages = vec!["Malay".to_string(), "English".to_string()];
        patient.profile.birth_ofc_cm = Some(34);

        let output = formatter
            .format_patient_detail(&patient, &[], &[create_test_visit(&patient, 1)])
            .unwrap();
        assert!(output.contains("Siti"));
        assert!(output.contains("Malay, English"));
        assert!(output.contains("Birth OFC (cm)"));
        assert!(!output.contains("Allergies"));
        assert!(output.contains("2025-03-14"));
        assert!(output.contains("14.25"));
    }

    #[test]
    fn test_detail_table_without_visits() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let patient = create_test_patient("A1", "Aiman");
        let output = formatter.format_patient_detail(&patient, &[], &[]).unwrap();
        assert!(!output.contains("Weight (kg)"));
    }

    #[test]
    fn test_visits_formats() {
        let patient = create_test_patient("A1", "Aiman");
        let visits = [create_test_visit(&patient, 4), create_test_visit(&patient, 2)];

        let quiet = Formatter::new(OutputFormat::Quiet, false);
        assert_eq!(quiet.format_visits(&visits).unwrap(), "4\n2");

        let table = Formatter::new(OutputFormat::Table, false);
        assert!(table.format_visits(&[]).unwrap().contains("No visits recorded"));
        let output = table.format_visits(&visits).unwrap();
        assert!(output.contains("40.00"));
        assert!(output.contains("09:05"));
    }

    #[test]
    fn test_config_shows_format_as_written_in_file() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_config(&Config::default()).unwrap();
        assert!(output.contains("format        = table"), "{}", output);
    }

    #[test]
    fn test_violations_output() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert!(formatter.format_violations(&[]).unwrap().contains("consistent"));

        let a = PatientId::new();
        let b = PatientId::new();
        let output = formatter
            .format_violations(&[InvariantViolation::Asymmetric(SiblingEdge::new(a, b))])
            .unwrap();
        assert!(output.starts_with("✗"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.edges_changed("created", 2), "✓ Created 2 sibling edge(s)");
        assert_eq!(formatter.edges_changed("removed", 0), "ℹ Nothing to do, no sibling edges removed");
    }
}
