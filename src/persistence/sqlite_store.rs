//! SQLite implementation of the LoginStore trait

use super::{LoginStore, PersistenceError};
use crate::models::LoginEvent;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::net::Ipv4Addr;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

const LOGIN_COLUMNS: &str =
    "username, timestamp, event_id, source_ip, latitude, longitude, accuracy_radius";

/// Columns of a `logins` row before the address is parsed
type RawLogin = (String, i64, String, String, f64, f64, u16);

/// SQLite-based login history
///
/// A single connection is shared behind a mutex, so statements from
/// concurrent requests are serialized.
pub struct SqliteLoginStore {
    conn: Mutex<Connection>,
}

impl SqliteLoginStore {
    /// Open (or create) a login database at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, PersistenceError> {
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    /// Create an in-memory SQLite database (useful for testing)
    pub fn in_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, PersistenceError> {
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(SqliteLoginStore {
            conn: Mutex::new(conn),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, PersistenceError> {
        self.conn.lock().map_err(|_| PersistenceError::LockPoisoned)
    }

    fn read_row(row: &Row<'_>) -> rusqlite::Result<RawLogin> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
        ))
    }

    fn into_event(raw: RawLogin) -> Result<LoginEvent, PersistenceError> {
        let (username, timestamp, event_id, ip_str, latitude, longitude, accuracy_radius) = raw;
        let source_ip = Ipv4Addr::from_str(&ip_str)
            .map_err(|_| PersistenceError::InvalidData(format!("Invalid IP address: {}", ip_str)))?;

        Ok(LoginEvent {
            username,
            timestamp,
            event_id,
            source_ip,
            latitude,
            longitude,
            accuracy_radius,
        })
    }
}

impl LoginStore for SqliteLoginStore {
    fn insert_login(&self, event: &LoginEvent) -> Result<(), PersistenceError> {
        let conn = self.connection()?;
        let result = conn.execute(
            "INSERT INTO logins
             (username, timestamp, event_id, source_ip, latitude, longitude, accuracy_radius)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                event.username,
                event.timestamp,
                event.event_id,
                event.source_ip.to_string(),
                event.latitude,
                event.longitude,
                event.accuracy_radius
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(PersistenceError::DuplicateEventId(event.event_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn find_by_event_id(&self, event_id: &str) -> Result<Option<LoginEvent>, PersistenceError> {
        let conn = self.connection()?;
        let raw = conn
            .query_row(
                &format!("SELECT {} FROM logins WHERE event_id = ?", LOGIN_COLUMNS),
                params![event_id],
                Self::read_row,
            )
            .optional()?;

        raw.map(Self::into_event).transpose()
    }

    fn logins_by_username(&self, username: &str) -> Result<Vec<LoginEvent>, PersistenceError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM logins WHERE username = ? ORDER BY timestamp ASC, event_id ASC",
            LOGIN_COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![username], Self::read_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(Self::into_event).collect()
    }

    fn count_logins(&self) -> Result<usize, PersistenceError> {
        let conn = self.connection()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM logins", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
