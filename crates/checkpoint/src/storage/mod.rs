//! Storage layer for the checkpoint registry.
//!
//! This module provides `SQLite`-based persistence for persons, vehicles,
//! the crossing journal, cargo lines, and both reference lists. The
//! [`CrossingStore`] trait is the contract consumed by the entry workflow;
//! [`Storage`] is its `rusqlite` implementation.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{
    CargoLine, Crossing, CrossingRole, Direction, Identity, NewCrossing, Person, VehicleRef,
    WantedEntry, WatchEntry,
};

/// Columns with distinct-value lookups for operator autocompletion.
///
/// A closed enum resolved to fixed prepared queries, so no caller-supplied
/// identifier ever reaches the SQL layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistinctField {
    /// Trip purposes from the journal.
    Purpose,
    /// Destination towns from the journal.
    Destination,
    /// Vehicle makes.
    VehicleMake,
    /// Citizenships from person records.
    Citizenship,
}

impl DistinctField {
    fn query(self) -> &'static str {
        match self {
            Self::Purpose => {
                "SELECT DISTINCT purpose FROM crossings
                 WHERE purpose IS NOT NULL AND purpose != '' ORDER BY purpose"
            }
            Self::Destination => {
                "SELECT DISTINCT destination FROM crossings
                 WHERE destination IS NOT NULL AND destination != '' ORDER BY destination"
            }
            Self::VehicleMake => "SELECT DISTINCT make FROM vehicles ORDER BY make",
            Self::Citizenship => {
                "SELECT DISTINCT citizenship FROM persons
                 WHERE citizenship IS NOT NULL AND citizenship != '' ORDER BY citizenship"
            }
        }
    }
}

/// Persistence contract consumed by the entry workflow.
///
/// All lookups that feed workflow decisions exclude soft-deleted journal
/// rows.
pub trait CrossingStore {
    /// Find a person by document number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_person_by_document(&self, document: &str) -> Result<Option<Person>>;

    /// Create a person record, returning the assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn create_person(&self, identity: &Identity) -> Result<i64>;

    /// Replace the stored notes of a person.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn update_person_notes(&self, person_id: i64, notes: Option<&str>) -> Result<()>;

    /// Get a person by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_person(&self, person_id: i64) -> Result<Option<Person>>;

    /// Find a vehicle by license plate.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_vehicle_by_plate(&self, plate: &str) -> Result<Option<VehicleRef>>;

    /// Create a vehicle record, returning the assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn create_vehicle(&self, make: &str, plate: &str) -> Result<i64>;

    /// All wanted-list entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn wanted_entries(&self) -> Result<Vec<WantedEntry>>;

    /// All watch-list entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn watch_entries(&self) -> Result<Vec<WatchEntry>>;

    /// The most recent non-deleted crossing of a person, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn most_recent_crossing(&self, person_id: i64) -> Result<Option<Crossing>>;

    /// The most recent non-deleted driver crossing of a person, excluding
    /// the given crossing id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn previous_driver_crossing(
        &self,
        person_id: i64,
        excluding_id: i64,
    ) -> Result<Option<Crossing>>;

    /// Non-deleted passenger crossings chained to a driver crossing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn passenger_crossings_of(&self, driver_crossing_id: i64) -> Result<Vec<Crossing>>;

    /// Persist a crossing, returning the assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn create_crossing(&self, crossing: &NewCrossing) -> Result<i64>;

    /// Persist cargo lines against a committed crossing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn attach_cargo(&self, crossing_id: i64, lines: &[CargoLine]) -> Result<()>;
}

/// `SQLite`-backed storage for the checkpoint registry.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

/// Joined journal projection shared by every crossing read.
const CROSSING_SELECT: &str = r"
SELECT c.id, c.person_id, p.last_name, p.first_name, p.patronymic, p.dob,
       p.document, p.citizenship, c.direction, c.role, c.purpose,
       c.destination, c.vehicle_id, v.make, v.plate, c.operator, c.timestamp,
       c.driver_crossing_id, c.deleted
FROM crossings c
JOIN persons p ON p.id = c.person_id
LEFT JOIN vehicles v ON v.id = c.vehicle_id
";

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // Enable WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a crossing by id, deleted or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn crossing(&self, id: i64) -> Result<Option<Crossing>> {
        let sql = format!("{CROSSING_SELECT} WHERE c.id = ?1");
        let result = self
            .conn
            .query_row(&sql, [id], Self::row_to_crossing)
            .optional()?;
        Ok(result)
    }

    /// The most recent non-deleted crossings, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn recent_crossings(&self, limit: usize) -> Result<Vec<Crossing>> {
        let sql = format!(
            "{CROSSING_SELECT} WHERE c.deleted = 0 ORDER BY c.timestamp DESC, c.id DESC LIMIT ?1"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let crossings = stmt
            .query_map([limit_i64], Self::row_to_crossing)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(crossings)
    }

    /// Soft-delete a crossing.
    ///
    /// The row stays in the journal for audit but disappears from workflow
    /// lookups. Returns `true` if a row was marked.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn mark_crossing_deleted(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("UPDATE crossings SET deleted = 1 WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    /// Count non-deleted journal rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn crossing_count(&self) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM crossings WHERE deleted = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Add a wanted-list entry, returning the assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn add_wanted(&self, entry: &WantedEntry) -> Result<i64> {
        self.conn.execute(
            r"
            INSERT INTO wanted (last_name, first_name, patronymic, dob, info, actions)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                entry.last_name,
                entry.first_name,
                entry.patronymic,
                entry.dob,
                entry.info,
                entry.actions,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Remove a wanted-list entry. Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove_wanted(&self, id: i64) -> Result<bool> {
        let affected = self.conn.execute("DELETE FROM wanted WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    /// Count wanted-list entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn wanted_count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM wanted", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Add a watch-list entry, returning the assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn add_watch(&self, entry: &WatchEntry) -> Result<i64> {
        self.conn.execute(
            r"
            INSERT INTO watch (last_name, first_name, patronymic, dob, reason)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                entry.last_name,
                entry.first_name,
                entry.patronymic,
                entry.dob,
                entry.reason,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Remove a watch-list entry. Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove_watch(&self, id: i64) -> Result<bool> {
        let affected = self.conn.execute("DELETE FROM watch WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    /// Count watch-list entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn watch_count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM watch", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Distinct values of a journal column for operator autocompletion.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn distinct_values(&self, field: DistinctField) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(field.query())?;
        let values = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(values)
    }

    /// Cargo lines of a crossing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn cargo_of(&self, crossing_id: i64) -> Result<Vec<CargoLine>> {
        let mut stmt = self.conn.prepare(
            "SELECT description, quantity, unit FROM cargo WHERE crossing_id = ?1 ORDER BY id",
        )?;
        let lines = stmt
            .query_map([crossing_id], |row| {
                Ok(CargoLine {
                    description: row.get(0)?,
                    quantity: row.get(1)?,
                    unit: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(lines)
    }

    /// Convert a database row to a Person struct.
    fn row_to_person(row: &rusqlite::Row) -> rusqlite::Result<Person> {
        Ok(Person {
            id: row.get(0)?,
            identity: Identity {
                last_name: row.get(1)?,
                first_name: row.get(2)?,
                patronymic: row.get(3)?,
                dob: row.get(4)?,
                citizenship: row.get(5)?,
                document: row.get(6)?,
                notes: row.get(7)?,
            },
        })
    }

    /// Convert a joined database row to a Crossing struct.
    fn row_to_crossing(row: &rusqlite::Row) -> rusqlite::Result<Crossing> {
        let last_name: String = row.get(2)?;
        let first_name: String = row.get(3)?;
        let patronymic: Option<String> = row.get(4)?;

        let mut full_name = format!("{last_name} {first_name}");
        if let Some(p) = patronymic.as_deref() {
            if !p.is_empty() {
                full_name.push(' ');
                full_name.push_str(p);
            }
        }

        let direction_str: String = row.get(8)?;
        let role_str: String = row.get(9)?;

        let make: Option<String> = row.get(13)?;
        let plate: Option<String> = row.get(14)?;
        let vehicle_info = match (make, plate) {
            (Some(make), Some(plate)) => format!("{make}/{plate}"),
            _ => String::new(),
        };

        let deleted: i64 = row.get(18)?;

        Ok(Crossing {
            id: row.get(0)?,
            person_id: row.get(1)?,
            full_name,
            person_dob: row.get(5)?,
            person_document: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
            citizenship: row.get(7)?,
            direction: Direction::from_db_str(&direction_str),
            role: CrossingRole::from_db_str(&role_str),
            purpose: row.get(10)?,
            destination: row.get(11)?,
            vehicle_id: row.get(12)?,
            vehicle_info,
            operator: row.get(15)?,
            timestamp: row.get(16)?,
            driver_crossing_id: row.get(17)?,
            deleted: deleted != 0,
        })
    }
}

impl CrossingStore for Storage {
    fn find_person_by_document(&self, document: &str) -> Result<Option<Person>> {
        let result = self
            .conn
            .query_row(
                r"
                SELECT id, last_name, first_name, patronymic, dob, citizenship, document, notes
                FROM persons WHERE document = ?1
                ",
                [document],
                Self::row_to_person,
            )
            .optional()?;
        Ok(result)
    }

    fn create_person(&self, identity: &Identity) -> Result<i64> {
        self.conn.execute(
            r"
            INSERT INTO persons (last_name, first_name, patronymic, dob, citizenship, document, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                identity.last_name,
                identity.first_name,
                identity.patronymic,
                identity.dob,
                identity.citizenship,
                identity.document,
                identity.notes,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("Created person with id {}", id);
        Ok(id)
    }

    fn update_person_notes(&self, person_id: i64, notes: Option<&str>) -> Result<()> {
        self.conn.execute(
            "UPDATE persons SET notes = ?1 WHERE id = ?2",
            params![notes, person_id],
        )?;
        Ok(())
    }

    fn get_person(&self, person_id: i64) -> Result<Option<Person>> {
        let result = self
            .conn
            .query_row(
                r"
                SELECT id, last_name, first_name, patronymic, dob, citizenship, document, notes
                FROM persons WHERE id = ?1
                ",
                [person_id],
                Self::row_to_person,
            )
            .optional()?;
        Ok(result)
    }

    fn find_vehicle_by_plate(&self, plate: &str) -> Result<Option<VehicleRef>> {
        let result = self
            .conn
            .query_row(
                "SELECT id, make, plate FROM vehicles WHERE plate = ?1",
                [plate],
                |row| {
                    Ok(VehicleRef {
                        id: Some(row.get(0)?),
                        make: row.get(1)?,
                        plate: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(result)
    }

    fn create_vehicle(&self, make: &str, plate: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO vehicles (make, plate) VALUES (?1, ?2)",
            params![make, plate],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn wanted_entries(&self) -> Result<Vec<WantedEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, last_name, first_name, patronymic, dob, info, actions FROM wanted ORDER BY id",
        )?;
        let entries = stmt
            .query_map([], |row| {
                Ok(WantedEntry {
                    id: Some(row.get(0)?),
                    last_name: row.get(1)?,
                    first_name: row.get(2)?,
                    patronymic: row.get(3)?,
                    dob: row.get(4)?,
                    info: row.get(5)?,
                    actions: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn watch_entries(&self) -> Result<Vec<WatchEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, last_name, first_name, patronymic, dob, reason FROM watch ORDER BY id",
        )?;
        let entries = stmt
            .query_map([], |row| {
                Ok(WatchEntry {
                    id: Some(row.get(0)?),
                    last_name: row.get(1)?,
                    first_name: row.get(2)?,
                    patronymic: row.get(3)?,
                    dob: row.get(4)?,
                    reason: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn most_recent_crossing(&self, person_id: i64) -> Result<Option<Crossing>> {
        let sql = format!(
            "{CROSSING_SELECT} WHERE c.person_id = ?1 AND c.deleted = 0
             ORDER BY c.timestamp DESC, c.id DESC LIMIT 1"
        );
        let result = self
            .conn
            .query_row(&sql, [person_id], Self::row_to_crossing)
            .optional()?;
        Ok(result)
    }

    fn previous_driver_crossing(
        &self,
        person_id: i64,
        excluding_id: i64,
    ) -> Result<Option<Crossing>> {
        let sql = format!(
            "{CROSSING_SELECT} WHERE c.person_id = ?1 AND c.id != ?2
             AND c.role = 'driver' AND c.deleted = 0
             ORDER BY c.timestamp DESC, c.id DESC LIMIT 1"
        );
        let result = self
            .conn
            .query_row(&sql, params![person_id, excluding_id], Self::row_to_crossing)
            .optional()?;
        Ok(result)
    }

    fn passenger_crossings_of(&self, driver_crossing_id: i64) -> Result<Vec<Crossing>> {
        let sql = format!(
            "{CROSSING_SELECT} WHERE c.driver_crossing_id = ?1 AND c.deleted = 0
             ORDER BY c.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let crossings = stmt
            .query_map([driver_crossing_id], Self::row_to_crossing)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(crossings)
    }

    fn create_crossing(&self, crossing: &NewCrossing) -> Result<i64> {
        self.conn.execute(
            r"
            INSERT INTO crossings (person_id, vehicle_id, direction, role, purpose,
                                   destination, operator, timestamp, driver_crossing_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
            params![
                crossing.person_id,
                crossing.vehicle_id,
                crossing.direction.to_string(),
                crossing.role.to_string(),
                crossing.purpose,
                crossing.destination,
                crossing.operator,
                crossing.timestamp,
                crossing.driver_crossing_id,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("Recorded crossing with id {}", id);
        Ok(id)
    }

    fn attach_cargo(&self, crossing_id: i64, lines: &[CargoLine]) -> Result<()> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO cargo (crossing_id, description, quantity, unit) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for line in lines {
            stmt.execute(params![
                crossing_id,
                line.description,
                line.quantity,
                line.unit
            ])?;
        }
        Ok(())
    }
}
