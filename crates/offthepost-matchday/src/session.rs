//! Session data structure

use chrono::{DateTime, Utc};
use offthepost_storage::timestamp;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::{GroupId, SessionId, UserId};

/// One scheduled or played game of a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub group_id: GroupId,
    /// Member who scheduled the session
    pub created_by_id: Option<UserId>,
    /// Member who finalizes the stats
    pub host_id: Option<UserId>,
    pub location: Option<String>,
    /// Scheduled kick-off
    pub start_time: DateTime<Utc>,
    /// Set once the session is finished
    pub completed_at: Option<DateTime<Utc>>,
}

pub(crate) const SESSION_COLUMNS: &str =
    "id, group_id, created_by_id, host_id, location, start_time, completed_at";

impl Session {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            group_id: row.get(1)?,
            created_by_id: row.get(2)?,
            host_id: row.get(3)?,
            location: row.get(4)?,
            start_time: timestamp::column(row, 5)?,
            completed_at: timestamp::optional_column(row, 6)?,
        })
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    pub group_id: GroupId,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub created_by_id: Option<UserId>,
    #[serde(default)]
    pub host_id: Option<UserId>,
    #[serde(default)]
    pub location: Option<String>,
}

impl NewSession {
    pub fn new(group_id: GroupId, start_time: DateTime<Utc>) -> Self {
        Self {
            group_id,
            start_time,
            created_by_id: None,
            host_id: None,
            location: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn created_by(mut self, user_id: UserId) -> Self {
        self.created_by_id = Some(user_id);
        self
    }

    pub fn hosted_by(mut self, user_id: UserId) -> Self {
        self.host_id = Some(user_id);
        self
    }
}
