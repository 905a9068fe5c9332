//! Session team data structures

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{SessionId, TeamId, TeamMembershipId, UserId};

/// One side within a session ("Red", "Team A", ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTeam {
    pub id: TeamId,
    pub session_id: SessionId,
    /// Unique within the session
    pub name: String,
    pub captain_id: Option<UserId>,
    /// Cached score; `None` until the session is completed or a score is set
    pub goals_for: Option<u32>,
    pub goals_against: Option<u32>,
}

pub(crate) const TEAM_COLUMNS: &str =
    "id, session_id, name, captain_id, goals_for, goals_against";

impl SessionTeam {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            session_id: row.get(1)?,
            name: row.get(2)?,
            captain_id: row.get(3)?,
            goals_for: row.get(4)?,
            goals_against: row.get(5)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSessionTeam {
    pub session_id: SessionId,
    pub name: String,
    #[serde(default)]
    pub captain_id: Option<UserId>,
}

impl NewSessionTeam {
    pub fn new(session_id: SessionId, name: impl Into<String>) -> Self {
        Self {
            session_id,
            name: name.into(),
            captain_id: None,
        }
    }

    pub fn captained_by(mut self, user_id: UserId) -> Self {
        self.captain_id = Some(user_id);
        self
    }
}

/// A player on a session team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTeamMembership {
    pub id: TeamMembershipId,
    pub session_team_id: TeamId,
    pub user_id: UserId,
}

pub(crate) const TEAM_MEMBERSHIP_COLUMNS: &str = "id, session_team_id, user_id";

impl SessionTeamMembership {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            session_team_id: row.get(1)?,
            user_id: row.get(2)?,
        })
    }
}

/// Recompute the cached score of every team in `session_id` from its goals.
pub(crate) fn refresh_scores(conn: &Connection, session_id: SessionId) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE session_teams SET
             goals_for = (SELECT COUNT(*) FROM goals g WHERE g.team_id = session_teams.id),
             goals_against = (SELECT COUNT(*) FROM goals g
                              WHERE g.session_id = session_teams.session_id
                                AND g.team_id != session_teams.id)
         WHERE session_id = ?1",
        [session_id],
    )
}

/// Refresh cached scores only once the session has been completed.
pub(crate) fn refresh_scores_if_completed(
    conn: &Connection,
    session_id: SessionId,
) -> rusqlite::Result<()> {
    let completed: bool = conn.query_row(
        "SELECT completed_at IS NOT NULL FROM sessions WHERE id = ?1",
        [session_id],
        |row| row.get(0),
    )?;
    if completed {
        refresh_scores(conn, session_id)?;
    }
    Ok(())
}
