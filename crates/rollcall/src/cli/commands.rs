//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgGroup, Args, Subcommand, ValueEnum};

use crate::member::{Group, MaritalStatus, Member};
use crate::photo::Facing;

/// Register command arguments.
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("photo_source").args(["photo", "camera_frame"])))]
pub struct RegisterCommand {
    /// Full name
    #[arg(short, long)]
    pub name: String,

    /// Serial number printed on the card
    #[arg(long)]
    pub serial: Option<String>,

    /// Street address
    #[arg(long)]
    pub address: Option<String>,

    /// Neighborhood
    #[arg(long)]
    pub neighborhood: Option<String>,

    /// City
    #[arg(long)]
    pub city: Option<String>,

    /// Department (region)
    #[arg(long)]
    pub department: Option<String>,

    /// Mobile phone
    #[arg(long)]
    pub cellphone: Option<String>,

    /// Email address
    #[arg(long)]
    pub email: Option<String>,

    /// Date of birth (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub birth_date: Option<NaiveDate>,

    /// Marital status
    #[arg(long, value_enum)]
    pub marital_status: Option<MaritalStatusArg>,

    /// Date of baptism (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub baptism_date: Option<NaiveDate>,

    /// Church (defaults to the configured church)
    #[arg(long)]
    pub church: Option<String>,

    /// Time attending the church, as written on the sheet
    #[arg(long)]
    pub time_in_church: Option<String>,

    /// Ministry group
    #[arg(short, long, value_enum)]
    pub group: Option<GroupArg>,

    /// Use this image file as the photo, byte for byte
    #[arg(long, value_name = "FILE")]
    pub photo: Option<PathBuf>,

    /// Snapshot this image as if it were a live camera frame
    #[arg(long, value_name = "FILE")]
    pub camera_frame: Option<PathBuf>,

    /// Camera direction for --camera-frame (front snapshots are mirrored;
    /// defaults to the configured direction)
    #[arg(long, value_enum)]
    pub facing: Option<FacingArg>,

    /// JSON file of signature strokes: `[[[x, y], ...], ...]`
    #[arg(long, value_name = "FILE")]
    pub signature: Option<PathBuf>,
}

impl RegisterCommand {
    /// Copy the text and date fields given on the command line into `member`.
    pub fn apply_to(&self, member: &mut Member) {
        member.name.clone_from(&self.name);
        let text_fields = [
            (&self.serial, &mut member.serial_number),
            (&self.address, &mut member.address),
            (&self.neighborhood, &mut member.neighborhood),
            (&self.city, &mut member.city),
            (&self.department, &mut member.department),
            (&self.cellphone, &mut member.cellphone),
            (&self.email, &mut member.email),
            (&self.church, &mut member.church),
            (&self.time_in_church, &mut member.time_in_church),
        ];
        for (value, field) in text_fields {
            if let Some(value) = value {
                field.clone_from(value);
            }
        }
        member.birth_date = self.birth_date.or(member.birth_date);
        member.baptism_date = self.baptism_date.or(member.baptism_date);
        if let Some(status) = self.marital_status {
            member.marital_status = Some(status.into());
        }
        if let Some(group) = self.group {
            member.group = Some(group.into());
        }
    }
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only members whose name contains this text (case-insensitive)
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only members of this group
    #[arg(short, long, value_enum)]
    pub group: Option<GroupArg>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Member ID
    pub id: i64,

    /// Output as JSON (images included as data URIs)
    #[arg(short, long)]
    pub json: bool,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Member ID
    pub id: i64,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Export command arguments.
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("image").args(["photo", "signature"]).required(true)))]
pub struct ExportCommand {
    /// Member ID
    pub id: i64,

    /// Export the photo
    #[arg(long)]
    pub photo: bool,

    /// Export the signature
    #[arg(long)]
    pub signature: bool,

    /// Destination file
    #[arg(short, long, value_name = "FILE")]
    pub out: PathBuf,
}

/// Dashboard command arguments.
#[derive(Debug, Args)]
pub struct DashboardCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Group argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GroupArg {
    /// EVG
    Evg,
    /// FTU
    Ftu,
    /// FJU
    Fju,
    /// EBI
    Ebi,
    /// CALEB
    Caleb,
    /// NINGUNO
    Ninguno,
}

impl From<GroupArg> for Group {
    fn from(arg: GroupArg) -> Self {
        match arg {
            GroupArg::Evg => Self::Evg,
            GroupArg::Ftu => Self::Ftu,
            GroupArg::Fju => Self::Fju,
            GroupArg::Ebi => Self::Ebi,
            GroupArg::Caleb => Self::Caleb,
            GroupArg::Ninguno => Self::Ninguno,
        }
    }
}

/// Marital status argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MaritalStatusArg {
    /// SOLTERO(A)
    Soltero,
    /// CASADO(A)
    Casado,
    /// DIVORCIADO(A)
    Divorciado,
    /// VIUDO(A)
    Viudo,
    /// UNIÓN LIBRE
    UnionLibre,
}

impl From<MaritalStatusArg> for MaritalStatus {
    fn from(arg: MaritalStatusArg) -> Self {
        match arg {
            MaritalStatusArg::Soltero => Self::Single,
            MaritalStatusArg::Casado => Self::Married,
            MaritalStatusArg::Divorciado => Self::Divorced,
            MaritalStatusArg::Viudo => Self::Widowed,
            MaritalStatusArg::UnionLibre => Self::CommonLaw,
        }
    }
}

/// Camera direction argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FacingArg {
    /// Toward the user (mirrored)
    #[default]
    Front,
    /// Away from the user
    Back,
}

impl From<FacingArg> for Facing {
    fn from(arg: FacingArg) -> Self {
        match arg {
            FacingArg::Front => Self::Front,
            FacingArg::Back => Self::Back,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
