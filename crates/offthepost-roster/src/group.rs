//! Group and membership data structures

use chrono::{DateTime, Utc};
use offthepost_storage::timestamp;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::{GroupId, MembershipId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    /// Unique group name
    pub name: String,
    /// Leader can add/remove/invite members
    pub leader_id: Option<UserId>,
}

pub(crate) const GROUP_COLUMNS: &str = "id, name, leader_id";

impl Group {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            leader_id: row.get(2)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGroup {
    pub name: String,
    #[serde(default)]
    pub leader_id: Option<UserId>,
}

impl NewGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            leader_id: None,
        }
    }

    pub fn with_leader(mut self, leader_id: UserId) -> Self {
        self.leader_id = Some(leader_id);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub id: MembershipId,
    pub user_id: UserId,
    pub group_id: GroupId,
    pub joined_at: DateTime<Utc>,
}

pub(crate) const MEMBERSHIP_COLUMNS: &str = "id, user_id, group_id, joined_at";

impl GroupMembership {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            group_id: row.get(2)?,
            joined_at: timestamp::column(row, 3)?,
        })
    }
}
