//! Persistence module for login history
//!
//! Every ingested login is recorded durably so that later (or earlier,
//! when events arrive out of order) logins can be compared against it.

pub mod sqlite_store;

pub use sqlite_store::SqliteLoginStore;

use crate::models::LoginEvent;
use thiserror::Error;

/// Errors that can occur during persistence operations
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Event id already recorded: {0}")]
    DuplicateEventId(String),

    #[error("Invalid data in database: {0}")]
    InvalidData(String),

    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

/// Trait for login history backends
///
/// Implementations must reject a second insert of the same event id and
/// return a user's logins sorted ascending by timestamp, then event id.
pub trait LoginStore: Send + Sync {
    /// Record a login. Fails with [`PersistenceError::DuplicateEventId`]
    /// when the event id is already known.
    fn insert_login(&self, event: &LoginEvent) -> Result<(), PersistenceError>;

    /// Look up a login by its event id
    fn find_by_event_id(&self, event_id: &str) -> Result<Option<LoginEvent>, PersistenceError>;

    /// All logins for a user, ascending by `(timestamp, event_id)`
    fn logins_by_username(&self, username: &str) -> Result<Vec<LoginEvent>, PersistenceError>;

    /// Number of recorded logins across all users
    fn count_logins(&self) -> Result<usize, PersistenceError>;

    /// A user's logins other than the one identified by `event_id`
    fn history_excluding(
        &self,
        username: &str,
        event_id: &str,
    ) -> Result<Vec<LoginEvent>, PersistenceError> {
        let mut logins = self.logins_by_username(username)?;
        logins.retain(|login| login.event_id != event_id);
        Ok(logins)
    }
}
