//! Roster error types

use offthepost_storage::{ErrorKind, StorageError, Table};
use rusqlite::Connection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: Table, id: i64 },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Delete rejected: {0}")]
    Referential(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<rusqlite::Error> for RosterError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.into())
    }
}

impl RosterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Referential(_) => ErrorKind::Referential,
            Self::Storage(e) => e.kind(),
        }
    }
}

/// Fail with `NotFound` unless `id` exists in `table`.
pub(crate) fn require(conn: &Connection, table: Table, id: i64) -> Result<(), RosterError> {
    if offthepost_storage::exists(conn, table, id)? {
        Ok(())
    } else {
        Err(RosterError::NotFound { entity: table, id })
    }
}

/// Map a failed `DELETE` so a dangling foreign key reports as referential.
pub(crate) fn delete_blocked(err: rusqlite::Error) -> RosterError {
    RosterError::Storage(StorageError::from(err).on_delete())
}
