//! Core error types

use offthepost_storage::{ErrorKind, Table};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: Table, id: i64 },

    #[error("Storage error: {0}")]
    Storage(#[from] offthepost_storage::StorageError),

    #[error("Roster error: {0}")]
    Roster(#[from] offthepost_roster::RosterError),

    #[error("Matchday error: {0}")]
    Matchday(#[from] offthepost_matchday::MatchdayError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.into())
    }
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Storage(e) => e.kind(),
            Self::Roster(e) => e.kind(),
            Self::Matchday(e) => e.kind(),
            Self::Io(_) | Self::Serialization(_) | Self::Config(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offthepost_matchday::MatchdayError;
    use offthepost_roster::RosterError;

    #[test]
    fn test_kind_follows_component_error() {
        let err: CoreError = RosterError::Validation("name taken".into()).into();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err: CoreError = MatchdayError::Referential("goals remain".into()).into();
        assert_eq!(err.kind(), ErrorKind::Referential);

        let err = CoreError::NotFound {
            entity: Table::Users,
            id: 3,
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "User not found: 3");

        assert_eq!(
            CoreError::Config("bad path".into()).kind(),
            ErrorKind::Internal
        );
    }
}
