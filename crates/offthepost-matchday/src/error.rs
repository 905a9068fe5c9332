//! Matchday error types

use offthepost_storage::{ErrorKind, StorageError, Table};
use rusqlite::Connection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatchdayError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: Table, id: i64 },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Delete rejected: {0}")]
    Referential(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<rusqlite::Error> for MatchdayError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.into())
    }
}

impl MatchdayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Referential(_) => ErrorKind::Referential,
            Self::Storage(e) => e.kind(),
        }
    }
}

pub(crate) fn require(conn: &Connection, table: Table, id: i64) -> Result<(), MatchdayError> {
    if offthepost_storage::exists(conn, table, id)? {
        Ok(())
    } else {
        Err(MatchdayError::NotFound { entity: table, id })
    }
}

pub(crate) fn require_optional(
    conn: &Connection,
    table: Table,
    id: Option<i64>,
) -> Result<(), MatchdayError> {
    match id {
        Some(id) => require(conn, table, id),
        None => Ok(()),
    }
}

/// Map a failed `DELETE` so a dangling foreign key reports as referential.
pub(crate) fn delete_blocked(err: rusqlite::Error) -> MatchdayError {
    MatchdayError::Storage(StorageError::from(err).on_delete())
}
