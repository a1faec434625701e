//! `SQLite` schema definitions for the checkpoint registry.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the persons table.
///
/// The document number is the natural key for a resolved person; name
/// fields may drift across entries and are reconciled at the workflow
/// level.
pub const CREATE_PERSONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS persons (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    last_name TEXT NOT NULL,
    first_name TEXT NOT NULL,
    patronymic TEXT,
    dob TEXT NOT NULL,
    citizenship TEXT,
    document TEXT UNIQUE,
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the vehicles table, unique by plate.
pub const CREATE_VEHICLES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS vehicles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    make TEXT NOT NULL,
    plate TEXT NOT NULL UNIQUE
)
";

/// SQL statement to create the crossings journal.
///
/// `driver_crossing_id` is the passenger back-reference, one level deep.
/// `deleted` is a soft-delete flag; deleted rows stay for audit.
pub const CREATE_CROSSINGS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS crossings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    person_id INTEGER NOT NULL REFERENCES persons(id),
    vehicle_id INTEGER REFERENCES vehicles(id),
    direction TEXT NOT NULL,
    role TEXT NOT NULL,
    purpose TEXT,
    destination TEXT,
    operator TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    driver_crossing_id INTEGER REFERENCES crossings(id),
    deleted INTEGER NOT NULL DEFAULT 0
)
";

/// SQL statement to create the cargo table.
pub const CREATE_CARGO_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS cargo (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crossing_id INTEGER NOT NULL REFERENCES crossings(id),
    description TEXT NOT NULL,
    quantity REAL NOT NULL,
    unit TEXT NOT NULL
)
";

/// SQL statement to create the wanted reference list.
pub const CREATE_WANTED_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS wanted (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    last_name TEXT NOT NULL,
    first_name TEXT NOT NULL,
    patronymic TEXT,
    dob TEXT NOT NULL,
    info TEXT,
    actions TEXT
)
";

/// SQL statement to create the watch reference list.
pub const CREATE_WATCH_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS watch (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    last_name TEXT NOT NULL,
    first_name TEXT NOT NULL,
    patronymic TEXT,
    dob TEXT NOT NULL,
    reason TEXT
)
";

/// SQL statement to create an index on the journal timestamp.
pub const CREATE_TIMESTAMP_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_crossings_timestamp ON crossings(timestamp DESC)
";

/// SQL statement to create an index on the journal person id.
pub const CREATE_PERSON_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_crossings_person ON crossings(person_id)
";

/// SQL statement to create an index on the driver back-reference.
pub const CREATE_DRIVER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_crossings_driver ON crossings(driver_crossing_id)
";

/// SQL statement to create an index on person documents.
pub const CREATE_DOCUMENT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_persons_document ON persons(document)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_PERSONS_TABLE,
    CREATE_VEHICLES_TABLE,
    CREATE_CROSSINGS_TABLE,
    CREATE_CARGO_TABLE,
    CREATE_WANTED_TABLE,
    CREATE_WATCH_TABLE,
    CREATE_TIMESTAMP_INDEX,
    CREATE_PERSON_INDEX,
    CREATE_DRIVER_INDEX,
    CREATE_DOCUMENT_INDEX,
    CREATE_METADATA_TABLE,
];
