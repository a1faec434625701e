//! Core domain types for the checkpoint registry.
//!
//! Defines identities, reference-list entries, vehicles, cargo lines, and
//! crossing records, the shapes shared between the workflow, the matching
//! engine, and storage.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Direction of a crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Entry into the controlled zone.
    In,
    /// Exit from the controlled zone.
    Out,
}

impl Direction {
    /// Parse a stored direction value, defaulting to `In` on unknown input.
    #[must_use]
    pub fn from_db_str(value: &str) -> Self {
        match value {
            "in" => Self::In,
            "out" => Self::Out,
            other => {
                warn!("Unknown direction: {}, defaulting to in", other);
                Self::In
            }
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::In => write!(f, "in"),
            Self::Out => write!(f, "out"),
        }
    }
}

/// The subject's role in a crossing, relative to an associated vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossingRole {
    /// On foot, no vehicle.
    Pedestrian,
    /// Driving a vehicle.
    Driver,
    /// Riding in a driver's vehicle; the crossing references the driver's.
    Passenger,
}

impl CrossingRole {
    /// Whether this role carries vehicle information.
    #[must_use]
    pub fn requires_vehicle(&self) -> bool {
        matches!(self, Self::Driver | Self::Passenger)
    }

    /// Parse a stored role value, defaulting to `Pedestrian` on unknown input.
    #[must_use]
    pub fn from_db_str(value: &str) -> Self {
        match value {
            "pedestrian" => Self::Pedestrian,
            "driver" => Self::Driver,
            "passenger" => Self::Passenger,
            other => {
                warn!("Unknown crossing role: {}, defaulting to pedestrian", other);
                Self::Pedestrian
            }
        }
    }
}

impl std::fmt::Display for CrossingRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pedestrian => write!(f, "pedestrian"),
            Self::Driver => write!(f, "driver"),
            Self::Passenger => write!(f, "passenger"),
        }
    }
}

/// A personal identity as entered on the form.
///
/// Name fields may legitimately differ in case and spelling across records
/// referring to the same real person; the document number is the natural key
/// for a resolved person record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Last name (required at submit).
    pub last_name: String,
    /// First name (required at submit).
    pub first_name: String,
    /// Patronymic, frequently absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patronymic: Option<String>,
    /// Date of birth as text, canonically `DD.MM.YYYY`.
    pub dob: String,
    /// Citizenship.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citizenship: Option<String>,
    /// Identity document number (required at submit).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    /// Free-text notes carried on the person record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Identity {
    /// Patronymic, with absence mapped to the empty string.
    #[must_use]
    pub fn patronymic_or_empty(&self) -> &str {
        self.patronymic.as_deref().unwrap_or("")
    }

    /// Full display name: "LAST FIRST PATRONYMIC", patronymic omitted when
    /// absent.
    #[must_use]
    pub fn full_name(&self) -> String {
        let mut name = format!("{} {}", self.last_name, self.first_name);
        if let Some(patronymic) = self.patronymic.as_deref() {
            if !patronymic.is_empty() {
                name.push(' ');
                name.push_str(patronymic);
            }
        }
        name
    }

    /// Uppercase all text fields in place (culture-invariant fold).
    ///
    /// Applied by the workflow at submit time so stored records keep one
    /// register regardless of how the operator typed them.
    pub fn make_uppercase(&mut self) {
        self.last_name = self.last_name.to_uppercase();
        self.first_name = self.first_name.to_uppercase();
        if let Some(p) = self.patronymic.as_mut() {
            *p = p.to_uppercase();
        }
        if let Some(c) = self.citizenship.as_mut() {
            *c = c.to_uppercase();
        }
        if let Some(d) = self.document.as_mut() {
            *d = d.to_uppercase();
        }
    }
}

/// A resolved person record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Storage-assigned identifier.
    pub id: i64,
    /// The stored identity fields.
    pub identity: Identity,
}

/// A vehicle reference: make plus license plate, unique by plate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRef {
    /// Storage-assigned identifier, if resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Vehicle make.
    pub make: String,
    /// License plate.
    pub plate: String,
}

impl VehicleRef {
    /// "MAKE/PLATE" display form used throughout the journal.
    #[must_use]
    pub fn info(&self) -> String {
        format!("{}/{}", self.make, self.plate)
    }
}

/// One cargo line item attached to a crossing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CargoLine {
    /// What is being carried.
    pub description: String,
    /// Quantity in the given unit.
    pub quantity: f64,
    /// Unit of measure.
    pub unit: String,
}

/// The in-progress crossing draft owned by the workflow.
///
/// Exists only for the duration of one entry session, until committed or
/// discarded. The timestamp and operator id are assigned at commit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossingDraft {
    /// Identity fields under edit.
    pub identity: Identity,
    /// Crossing direction.
    pub direction: Direction,
    /// Crossing role.
    pub role: CrossingRole,
    /// Purpose of the trip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// Destination town (required when direction is `In`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// Vehicle under edit (meaningful only for vehicle roles).
    pub vehicle: VehicleRef,
    /// Temporary cargo list, persisted with the crossing at commit.
    pub cargo: Vec<CargoLine>,
}

impl Default for CrossingDraft {
    fn default() -> Self {
        Self {
            identity: Identity::default(),
            direction: Direction::In,
            role: CrossingRole::Pedestrian,
            purpose: None,
            destination: None,
            vehicle: VehicleRef::default(),
            cargo: Vec::new(),
        }
    }
}

impl CrossingDraft {
    /// Uppercase all text fields of the draft in place.
    pub fn make_uppercase(&mut self) {
        self.identity.make_uppercase();
        if let Some(p) = self.purpose.as_mut() {
            *p = p.to_uppercase();
        }
        if let Some(d) = self.destination.as_mut() {
            *d = d.to_uppercase();
        }
        self.vehicle.make = self.vehicle.make.to_uppercase();
        self.vehicle.plate = self.vehicle.plate.to_uppercase();
    }
}

/// A commit-ready crossing record handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCrossing {
    /// Resolved person id.
    pub person_id: i64,
    /// Resolved vehicle id, when the role carries one.
    pub vehicle_id: Option<i64>,
    /// Crossing direction.
    pub direction: Direction,
    /// Crossing role.
    pub role: CrossingRole,
    /// Purpose of the trip.
    pub purpose: Option<String>,
    /// Destination town.
    pub destination: Option<String>,
    /// Recording operator id.
    pub operator: String,
    /// Commit timestamp, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    /// The driver crossing this passenger crossing belongs to. One level
    /// deep only: a driver crossing never carries a back-reference itself.
    pub driver_crossing_id: Option<i64>,
}

/// A committed crossing as read back from the journal, with person and
/// vehicle display fields joined in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crossing {
    /// Storage-assigned identifier.
    pub id: i64,
    /// The subject's person id.
    pub person_id: i64,
    /// "LAST FIRST PATRONYMIC" display name.
    pub full_name: String,
    /// The subject's date of birth as stored.
    pub person_dob: String,
    /// The subject's document number.
    pub person_document: String,
    /// The subject's citizenship.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citizenship: Option<String>,
    /// Crossing direction.
    pub direction: Direction,
    /// Crossing role.
    pub role: CrossingRole,
    /// Purpose of the trip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// Destination town.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// Resolved vehicle id, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<i64>,
    /// "MAKE/PLATE", empty when no vehicle.
    pub vehicle_info: String,
    /// Recording operator id.
    pub operator: String,
    /// Commit timestamp.
    pub timestamp: String,
    /// Driver back-reference for passenger crossings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_crossing_id: Option<i64>,
    /// Soft-delete flag; deleted rows stay in the journal but are excluded
    /// from workflow lookups.
    pub deleted: bool,
}

impl Crossing {
    /// Reconstruct the vehicle reference from the joined display field.
    ///
    /// The plate is the segment after the last `/`; the make itself may
    /// contain slashes.
    #[must_use]
    pub fn vehicle_ref(&self) -> Option<VehicleRef> {
        let (make, plate) = self.vehicle_info.rsplit_once('/')?;
        Some(VehicleRef {
            id: self.vehicle_id,
            make: make.trim().to_string(),
            plate: plate.trim().to_string(),
        })
    }
}

/// An entry on the wanted list: investigative action prescribed on match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WantedEntry {
    /// Storage-assigned identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Last name.
    pub last_name: String,
    /// First name.
    pub first_name: String,
    /// Patronymic, frequently absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patronymic: Option<String>,
    /// Date of birth as text.
    pub dob: String,
    /// Free-text case information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    /// Prescribed actions on match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<String>,
}

/// An entry on the advisory watch list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchEntry {
    /// Storage-assigned identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Last name.
    pub last_name: String,
    /// First name.
    pub first_name: String,
    /// Patronymic, frequently absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patronymic: Option<String>,
    /// Date of birth as text.
    pub dob: String,
    /// Why the person is being watched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
