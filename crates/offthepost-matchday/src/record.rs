//! Goal and MVP vote records

use chrono::{DateTime, Utc};
use offthepost_storage::timestamp;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::{GoalId, SessionId, TeamId, UserId, VoteId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub session_id: SessionId,
    /// Team credited with the goal; always a team of `session_id`
    pub team_id: TeamId,
    pub scorer_id: UserId,
    /// Never equal to `scorer_id`
    pub assist_id: Option<UserId>,
    pub minute: Option<u32>,
    pub created_at: DateTime<Utc>,
}

pub(crate) const GOAL_COLUMNS: &str =
    "id, session_id, team_id, scorer_id, assist_id, minute, created_at";

impl Goal {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            session_id: row.get(1)?,
            team_id: row.get(2)?,
            scorer_id: row.get(3)?,
            assist_id: row.get(4)?,
            minute: row.get(5)?,
            created_at: timestamp::column(row, 6)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGoal {
    pub session_id: SessionId,
    pub team_id: TeamId,
    pub scorer_id: UserId,
    #[serde(default)]
    pub assist_id: Option<UserId>,
    #[serde(default)]
    pub minute: Option<u32>,
}

impl NewGoal {
    pub fn new(session_id: SessionId, team_id: TeamId, scorer_id: UserId) -> Self {
        Self {
            session_id,
            team_id,
            scorer_id,
            assist_id: None,
            minute: None,
        }
    }

    pub fn assisted_by(mut self, user_id: UserId) -> Self {
        self.assist_id = Some(user_id);
        self
    }

    pub fn in_minute(mut self, minute: u32) -> Self {
        self.minute = Some(minute);
        self
    }
}

/// One participant's pick for best player of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MvpVote {
    pub id: VoteId,
    pub session_id: SessionId,
    pub voter_id: UserId,
    pub voted_for_id: UserId,
    pub created_at: DateTime<Utc>,
}

pub(crate) const VOTE_COLUMNS: &str = "id, session_id, voter_id, voted_for_id, created_at";

impl MvpVote {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            session_id: row.get(1)?,
            voter_id: row.get(2)?,
            voted_for_id: row.get(3)?,
            created_at: timestamp::column(row, 4)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMvpVote {
    pub session_id: SessionId,
    pub voter_id: UserId,
    pub voted_for_id: UserId,
}

impl NewMvpVote {
    pub fn new(session_id: SessionId, voter_id: UserId, voted_for_id: UserId) -> Self {
        Self {
            session_id,
            voter_id,
            voted_for_id,
        }
    }
}
