//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::error::{Error, Result};
use crate::model::{CargoLine, CrossingRole, Direction};

/// Record command arguments: one full crossing entry.
#[derive(Debug, Args)]
pub struct RecordCommand {
    /// Last name
    #[arg(long)]
    pub last_name: String,

    /// First name
    #[arg(long)]
    pub first_name: String,

    /// Patronymic
    #[arg(long)]
    pub patronymic: Option<String>,

    /// Date of birth (DD.MM.YYYY)
    #[arg(long)]
    pub dob: String,

    /// Identity document number
    #[arg(long)]
    pub document: String,

    /// Citizenship
    #[arg(long)]
    pub citizenship: Option<String>,

    /// Notes stored on the person record
    #[arg(long)]
    pub notes: Option<String>,

    /// Crossing direction
    #[arg(short, long, value_enum, default_value = "in")]
    pub direction: DirectionArg,

    /// Crossing role
    #[arg(short, long, value_enum, default_value = "pedestrian")]
    pub role: RoleArg,

    /// Purpose of the trip
    #[arg(long)]
    pub purpose: Option<String>,

    /// Destination town (required for inbound crossings)
    #[arg(long)]
    pub destination: Option<String>,

    /// Vehicle make (driver role)
    #[arg(long)]
    pub vehicle_make: Option<String>,

    /// Vehicle license plate (driver role)
    #[arg(long)]
    pub vehicle_plate: Option<String>,

    /// Cargo line as "description:quantity:unit", repeatable
    #[arg(long = "cargo", value_name = "DESC:QTY:UNIT")]
    pub cargo: Vec<String>,

    /// Link this entry as a passenger of a committed driver crossing
    #[arg(long, value_name = "CROSSING_ID")]
    pub driver_crossing: Option<i64>,

    /// Answer yes to every confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Check command arguments: silent screening, no commit.
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Last name
    #[arg(long)]
    pub last_name: String,

    /// First name
    #[arg(long)]
    pub first_name: String,

    /// Patronymic
    #[arg(long)]
    pub patronymic: Option<String>,

    /// Date of birth (DD.MM.YYYY)
    #[arg(long)]
    pub dob: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Log command arguments: recent journal with prefix filters.
#[derive(Debug, Args)]
pub struct LogCommand {
    /// Maximum number of rows
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Last-name prefix filter
    #[arg(long)]
    pub last_name: Option<String>,

    /// First-name prefix filter
    #[arg(long)]
    pub first_name: Option<String>,

    /// Patronymic prefix filter
    #[arg(long)]
    pub patronymic: Option<String>,

    /// Citizenship prefix filter
    #[arg(long)]
    pub citizenship: Option<String>,

    /// Document-number prefix filter
    #[arg(long)]
    pub document: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Wanted-list administration commands.
#[derive(Debug, Subcommand)]
pub enum WantedCommand {
    /// Add a wanted-list entry
    Add {
        /// Last name
        #[arg(long)]
        last_name: String,

        /// First name
        #[arg(long)]
        first_name: String,

        /// Patronymic
        #[arg(long)]
        patronymic: Option<String>,

        /// Date of birth (DD.MM.YYYY)
        #[arg(long)]
        dob: String,

        /// Case information
        #[arg(long)]
        info: Option<String>,

        /// Prescribed actions on match
        #[arg(long)]
        actions: Option<String>,
    },

    /// Remove a wanted-list entry by id
    Remove {
        /// Entry id
        id: i64,
    },

    /// List all wanted-list entries
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Watch-list administration commands.
#[derive(Debug, Subcommand)]
pub enum WatchCommand {
    /// Add a watch-list entry
    Add {
        /// Last name
        #[arg(long)]
        last_name: String,

        /// First name
        #[arg(long)]
        first_name: String,

        /// Patronymic
        #[arg(long)]
        patronymic: Option<String>,

        /// Date of birth (DD.MM.YYYY)
        #[arg(long)]
        dob: String,

        /// Why the person is being watched
        #[arg(long)]
        reason: Option<String>,
    },

    /// Remove a watch-list entry by id
    Remove {
        /// Entry id
        id: i64,
    },

    /// List all watch-list entries
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
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

/// Direction argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    /// Entry into the controlled zone
    In,
    /// Exit from the controlled zone
    Out,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::In => Self::In,
            DirectionArg::Out => Self::Out,
        }
    }
}

/// Crossing role argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    /// On foot
    Pedestrian,
    /// Driving a vehicle
    Driver,
    /// Riding with a driver
    Passenger,
}

impl From<RoleArg> for CrossingRole {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Pedestrian => Self::Pedestrian,
            RoleArg::Driver => Self::Driver,
            RoleArg::Passenger => Self::Passenger,
        }
    }
}

/// Parse a "description:quantity:unit" cargo argument.
///
/// # Errors
///
/// Returns a validation error when the argument is malformed or the
/// quantity is not a number.
pub fn parse_cargo_line(raw: &str) -> Result<CargoLine> {
    let mut parts = raw.splitn(3, ':');
    let description = parts.next().unwrap_or("").trim();
    let quantity = parts.next().unwrap_or("").trim();
    let unit = parts.next().unwrap_or("").trim();

    if description.is_empty() || unit.is_empty() {
        return Err(Error::invalid_cargo(format!(
            "cargo argument must be description:quantity:unit, got {raw:?}"
        )));
    }
    let quantity: f64 = quantity.parse().map_err(|_| {
        Error::invalid_cargo(format!("cargo quantity is not a number in {raw:?}"))
    })?;

    Ok(CargoLine {
        description: description.to_string(),
        quantity,
        unit: unit.to_string(),
    })
}
