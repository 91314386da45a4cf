//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};

/// Clinic CLI - Manage patient records and sibling families.
#[derive(Debug, Parser)]
#[command(name = "clinic")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CLINIC_CONFIG")]
    pub config: Option<String>,

    /// Database file, overriding the configured one
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register and manage patients
    Patient(PatientArgs),

    /// Link, unlink and list siblings
    Sibling(SiblingArgs),

    /// Record and list visits
    Visit(VisitArgs),

    /// Show or change configuration
    Config(ConfigArgs),
}

/// Arguments for patient management.
#[derive(Debug, Parser)]
pub struct PatientArgs {
    #[command(subcommand)]
    pub action: PatientAction,
}

/// Patient actions.
#[derive(Debug, Subcommand)]
pub enum PatientAction {
    /// Register a new patient
    Add(AddPatientArgs),

    /// Show one patient with their siblings and visits
    Show {
        /// Patient UUID or display id
        patient: String,
    },

    /// Search patients by name or display id
    Search {
        /// Search text
        query: String,

        /// Maximum number of results (defaults to the configured limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Change a patient's details
    Update(UpdatePatientArgs),

    /// Delete a patient and detach them from their family
    Delete {
        /// Patient UUID or display id
        patient: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Arguments for `patient add`.
#[derive(Debug, Parser)]
pub struct AddPatientArgs {
    /// Clinic-facing identifier, e.g. A1147
    #[arg(long)]
    pub display_id: String,

    /// Full name
    #[arg(short, long)]
    pub name: String,

    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    pub dob: String,

    /// Contact number
    #[arg(short, long)]
    pub phone: Option<String>,

    /// Existing patient to link as a sibling (repeatable)
    #[arg(short, long = "sibling")]
    pub siblings: Vec<String>,

    #[command(flatten)]
    pub profile: ProfileArgs,
}

/// Arguments for `patient update`.
#[derive(Debug, Parser)]
pub struct UpdatePatientArgs {
    /// Patient UUID or display id
    pub patient: String,

    /// New full name
    #[arg(short, long)]
    pub name: Option<String>,

    /// New date of birth (YYYY-MM-DD)
    #[arg(long)]
    pub dob: Option<String>,

    /// New contact number; an empty value clears it
    #[arg(short, long)]
    pub phone: Option<String>,

    #[command(flatten)]
    pub profile: ProfileArgs,
}

/// Background and birth details shared by `patient add` and `patient update`.
///
/// On update only the flags given change; an empty text value clears the field.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ProfileArgs {
    /// Home address
    #[arg(long)]
    pub address: Option<String>,

    /// Secondary contact number
    #[arg(long = "phone2")]
    pub phone_secondary: Option<String>,

    /// Father's name
    #[arg(long)]
    pub father_name: Option<String>,

    /// Father's occupation
    #[arg(long)]
    pub father_occupation: Option<String>,

    /// Mother's name
    #[arg(long)]
    pub mother_name: Option<String>,

    /// Mother's occupation
    #[arg(long)]
    pub mother_occupation: Option<String>,

    /// Mother's parity, e.g. 2+0
    #[arg(long)]
    pub para: Option<String>,

    /// Spoken language (repeatable; replaces the whole list on update)
    #[arg(long = "language")]
    pub languages: Vec<String>,

    /// Hospital of birth
    #[arg(long)]
    pub hospital: Option<String>,

    /// Mode of delivery
    #[arg(long)]
    pub delivery: Option<String>,

    /// Birth weight in kilograms
    #[arg(long)]
    pub birth_weight: Option<f64>,

    /// Birth length in centimetres
    #[arg(long)]
    pub birth_length: Option<f64>,

    /// Birth head circumference in centimetres
    #[arg(long)]
    pub birth_ofc: Option<i64>,

    /// G6PD screening result
    #[arg(long)]
    pub g6pd: Option<String>,

    /// TSH screening result in mIU/L
    #[arg(long)]
    pub tsh: Option<i64>,

    /// Feeding method
    #[arg(long)]
    pub feeding: Option<String>,

    /// Known allergies
    #[arg(long)]
    pub allergies: Option<String>,

    /// Vaccination summary
    #[arg(long)]
    pub vaccination: Option<String>,

    /// Anything else worth keeping
    #[arg(long)]
    pub notes: Option<String>,
}

/// Arguments for visit management.
#[derive(Debug, Parser)]
pub struct VisitArgs {
    #[command(subcommand)]
    pub action: VisitAction,
}

/// Visit actions.
#[derive(Debug, Subcommand)]
pub enum VisitAction {
    /// Record a consultation
    Add(AddVisitArgs),

    /// List a patient's visits, newest first
    List {
        /// Patient UUID or display id
        patient: String,
    },
}

/// Arguments for `visit add`.
#[derive(Debug, Parser)]
pub struct AddVisitArgs {
    /// Patient UUID or display id
    pub patient: String,

    /// Weight in kilograms
    #[arg(short, long)]
    pub weight: f64,

    /// Visit date (YYYY-MM-DD), today when omitted
    #[arg(long)]
    pub date: Option<String>,

    /// Visit time (HH:MM), now when omitted
    #[arg(long)]
    pub time: Option<String>,

    /// Doctor's notes
    #[arg(short, long)]
    pub notes: Option<String>,

    /// Amount charged
    #[arg(long)]
    pub charge: Option<f64>,
}

/// Arguments for sibling management.
#[derive(Debug, Parser)]
pub struct SiblingArgs {
    #[command(subcommand)]
    pub action: SiblingAction,
}

/// Sibling actions.
#[derive(Debug, Subcommand)]
pub enum SiblingAction {
    /// Add a patient to another patient's family
    Link {
        /// Patient whose family grows
        patient: String,
        /// Patient joining the family
        sibling: String,
    },

    /// Remove a patient from another patient's family
    Unlink {
        /// Patient whose family shrinks
        patient: String,
        /// Patient leaving the family
        sibling: String,
    },

    /// List a patient's siblings
    List {
        /// Patient UUID or display id
        patient: String,
    },

    /// Verify that every family is symmetric and complete
    Check,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Change the default number of search results
    SetSearchLimit {
        /// New limit (1-100)
        limit: usize,
    },
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
