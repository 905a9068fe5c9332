//! Storage error types

use rusqlite::ffi;
use thiserror::Error;

/// Caller-facing classification shared by every error type in the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing required field, uniqueness or check constraint violated.
    Validation,
    /// A referenced or requested id does not exist.
    NotFound,
    /// A delete would leave a non-cascaded reference dangling.
    Referential,
    Internal,
}

/// Declarative constraint that rejected a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    Unique,
    Check,
    NotNull,
    ForeignKey,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A delete refused because another row still points at the target
    #[error("Delete blocked: {0}")]
    DeleteBlocked(rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Which schema constraint failed, if this error is a constraint failure.
    pub fn violation(&self) -> Option<Violation> {
        let (Self::Sqlite(rusqlite::Error::SqliteFailure(err, _))
        | Self::DeleteBlocked(rusqlite::Error::SqliteFailure(err, _))) = self
        else {
            return None;
        };
        if err.code != rusqlite::ErrorCode::ConstraintViolation {
            return None;
        }

        match err.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                Some(Violation::Unique)
            }
            ffi::SQLITE_CONSTRAINT_CHECK => Some(Violation::Check),
            ffi::SQLITE_CONSTRAINT_NOTNULL => Some(Violation::NotNull),
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Violation::ForeignKey),
            _ => None,
        }
    }

    /// Reclassify a foreign-key failure raised by a delete. On inserts and
    /// updates the same failure means the referenced row is missing.
    pub fn on_delete(self) -> Self {
        match self {
            Self::Sqlite(err) if Self::is_foreign_key(&err) => Self::DeleteBlocked(err),
            other => other,
        }
    }

    fn is_foreign_key(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY
        )
    }

    pub fn kind(&self) -> ErrorKind {
        if let Self::DeleteBlocked(_) = self {
            return ErrorKind::Referential;
        }
        match self.violation() {
            Some(Violation::Unique | Violation::Check | Violation::NotNull) => {
                ErrorKind::Validation
            }
            Some(Violation::ForeignKey) => ErrorKind::NotFound,
            None => ErrorKind::Internal,
        }
    }
}
