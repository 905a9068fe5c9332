//! Session Manager
//!
//! Sessions, the teams inside them, and team rosters.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};

use offthepost_roster::normalize_text;
use offthepost_storage::{Database, Table};

use crate::error::{delete_blocked, require, require_optional, MatchdayError};
use crate::session::{NewSession, Session, SESSION_COLUMNS};
use crate::team::{
    refresh_scores, refresh_scores_if_completed, NewSessionTeam, SessionTeam,
    SessionTeamMembership, TEAM_COLUMNS, TEAM_MEMBERSHIP_COLUMNS,
};
use crate::{GroupId, Result, SessionId, TeamId, TeamMembershipId, UserId};

pub struct SessionManager {
    db: Database,
}

impl SessionManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn create_session(&self, new_session: NewSession) -> Result<Session> {
        let location = normalize_text(new_session.location);

        let session = self.db.transaction(|conn| -> Result<Session> {
            require(conn, Table::Groups, new_session.group_id)?;
            require_optional(conn, Table::Users, new_session.created_by_id)?;
            require_optional(conn, Table::Users, new_session.host_id)?;

            conn.execute(
                "INSERT INTO sessions (group_id, created_by_id, host_id, location, start_time)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    new_session.group_id,
                    new_session.created_by_id,
                    new_session.host_id,
                    location,
                    offthepost_storage::timestamp::to_sql(&new_session.start_time),
                ],
            )?;

            Ok(Session {
                id: conn.last_insert_rowid(),
                group_id: new_session.group_id,
                created_by_id: new_session.created_by_id,
                host_id: new_session.host_id,
                location,
                start_time: new_session.start_time,
                completed_at: None,
            })
        })?;

        tracing::info!(
            session_id = session.id,
            group_id = session.group_id,
            start_time = %session.start_time,
            "Created session"
        );

        Ok(session)
    }

    pub fn get_session(&self, session_id: SessionId) -> Result<Session> {
        self.db
            .with_connection(|conn| -> Result<Session> { load_session(conn, session_id) })
    }

    /// All sessions in insertion order
    pub fn list_sessions(&self) -> Result<Vec<Session>> {
        self.db.with_connection(|conn| -> Result<Vec<Session>> {
            let mut stmt =
                conn.prepare(&format!("SELECT {SESSION_COLUMNS} FROM sessions ORDER BY id"))?;
            let sessions = stmt
                .query_map([], Session::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(sessions)
        })
    }

    pub fn group_sessions(&self, group_id: GroupId) -> Result<Vec<Session>> {
        self.db.with_connection(|conn| -> Result<Vec<Session>> {
            require(conn, Table::Groups, group_id)?;

            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE group_id = ?1 ORDER BY id"
            ))?;
            let sessions = stmt
                .query_map([group_id], Session::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(sessions)
        })
    }

    /// Mark a session finished and cache every team's score from its goals.
    ///
    /// A session can only be completed once.
    pub fn complete_session(
        &self,
        session_id: SessionId,
        completed_at: DateTime<Utc>,
    ) -> Result<Session> {
        let session = self.db.transaction(|conn| -> Result<Session> {
            let mut session = load_session(conn, session_id)?;
            if session.is_completed() {
                return Err(MatchdayError::Validation(format!(
                    "Session {session_id} is already completed"
                )));
            }

            conn.execute(
                "UPDATE sessions SET completed_at = ?1 WHERE id = ?2",
                rusqlite::params![
                    offthepost_storage::timestamp::to_sql(&completed_at),
                    session_id
                ],
            )?;
            refresh_scores(conn, session_id)?;

            session.completed_at = Some(completed_at);
            Ok(session)
        })?;

        tracing::info!(session_id, completed_at = %completed_at, "Completed session");

        Ok(session)
    }

    /// Delete a session with its teams, rosters, goals and votes
    pub fn delete_session(&self, session_id: SessionId) -> Result<()> {
        self.db.transaction(|conn| -> Result<()> {
            require(conn, Table::Sessions, session_id)?;
            conn.execute("DELETE FROM sessions WHERE id = ?1", [session_id])
                .map_err(delete_blocked)?;
            Ok(())
        })?;

        tracing::info!(session_id, "Deleted session");

        Ok(())
    }

    pub fn create_team(&self, new_team: NewSessionTeam) -> Result<SessionTeam> {
        let name = new_team.name.trim().to_string();
        if name.is_empty() {
            return Err(MatchdayError::Validation("Team name is required".to_string()));
        }

        let team = self.db.transaction(|conn| -> Result<SessionTeam> {
            require(conn, Table::Sessions, new_team.session_id)?;
            require_optional(conn, Table::Users, new_team.captain_id)?;

            let taken: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM session_teams WHERE session_id = ?1 AND name = ?2)",
                rusqlite::params![new_team.session_id, name],
                |row| row.get(0),
            )?;
            if taken {
                return Err(MatchdayError::Validation(format!(
                    "Team name already used in session {}: {name}",
                    new_team.session_id
                )));
            }

            conn.execute(
                "INSERT INTO session_teams (session_id, name, captain_id) VALUES (?1, ?2, ?3)",
                rusqlite::params![new_team.session_id, name, new_team.captain_id],
            )?;
            let team_id = conn.last_insert_rowid();

            // A team joining a finished session gets its cached score at once
            refresh_scores_if_completed(conn, new_team.session_id)?;
            load_team(conn, team_id)
        })?;

        tracing::info!(
            team_id = team.id,
            session_id = team.session_id,
            team_name = %team.name,
            "Created session team"
        );

        Ok(team)
    }

    pub fn get_team(&self, team_id: TeamId) -> Result<SessionTeam> {
        self.db
            .with_connection(|conn| -> Result<SessionTeam> { load_team(conn, team_id) })
    }

    /// All teams in insertion order
    pub fn list_teams(&self) -> Result<Vec<SessionTeam>> {
        self.db.with_connection(|conn| -> Result<Vec<SessionTeam>> {
            let mut stmt =
                conn.prepare(&format!("SELECT {TEAM_COLUMNS} FROM session_teams ORDER BY id"))?;
            let teams = stmt
                .query_map([], SessionTeam::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(teams)
        })
    }

    pub fn session_teams(&self, session_id: SessionId) -> Result<Vec<SessionTeam>> {
        self.db.with_connection(|conn| -> Result<Vec<SessionTeam>> {
            require(conn, Table::Sessions, session_id)?;

            let mut stmt = conn.prepare(&format!(
                "SELECT {TEAM_COLUMNS} FROM session_teams WHERE session_id = ?1 ORDER BY id"
            ))?;
            let teams = stmt
                .query_map([session_id], SessionTeam::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(teams)
        })
    }

    /// Overwrite a team's cached score
    pub fn set_team_score(
        &self,
        team_id: TeamId,
        goals_for: u32,
        goals_against: u32,
    ) -> Result<SessionTeam> {
        let team = self.db.transaction(|conn| -> Result<SessionTeam> {
            let mut team = load_team(conn, team_id)?;
            conn.execute(
                "UPDATE session_teams SET goals_for = ?1, goals_against = ?2 WHERE id = ?3",
                rusqlite::params![goals_for, goals_against, team_id],
            )?;
            team.goals_for = Some(goals_for);
            team.goals_against = Some(goals_against);
            Ok(team)
        })?;

        tracing::info!(team_id, goals_for, goals_against, "Set team score");

        Ok(team)
    }

    /// Recompute the cached scores of a session's teams from the goal log
    pub fn refresh_team_scores(&self, session_id: SessionId) -> Result<Vec<SessionTeam>> {
        self.db.transaction(|conn| -> Result<()> {
            require(conn, Table::Sessions, session_id)?;
            refresh_scores(conn, session_id)?;
            Ok(())
        })?;

        tracing::debug!(session_id, "Refreshed team scores");

        self.session_teams(session_id)
    }

    /// Delete a team and its roster.
    ///
    /// Rejected while goals are still credited to the team.
    pub fn delete_team(&self, team_id: TeamId) -> Result<()> {
        self.db.transaction(|conn| -> Result<()> {
            require(conn, Table::SessionTeams, team_id)?;

            let goals: i64 = conn.query_row(
                "SELECT COUNT(*) FROM goals WHERE team_id = ?1",
                [team_id],
                |row| row.get(0),
            )?;
            if goals > 0 {
                tracing::warn!(team_id, goals, "Rejected team delete");
                return Err(MatchdayError::Referential(format!(
                    "Session team {team_id} still has {goals} goal(s) credited"
                )));
            }

            conn.execute("DELETE FROM session_teams WHERE id = ?1", [team_id])
                .map_err(delete_blocked)?;
            Ok(())
        })?;

        tracing::info!(team_id, "Deleted session team");

        Ok(())
    }

    /// Put a player on a team. The same player may appear on another team
    /// of the same session; only a repeat on this team is rejected.
    pub fn add_team_member(
        &self,
        team_id: TeamId,
        user_id: UserId,
    ) -> Result<SessionTeamMembership> {
        let membership = self.db.transaction(|conn| -> Result<SessionTeamMembership> {
            require(conn, Table::SessionTeams, team_id)?;
            require(conn, Table::Users, user_id)?;

            let already: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM session_team_memberships
                               WHERE session_team_id = ?1 AND user_id = ?2)",
                [team_id, user_id],
                |row| row.get(0),
            )?;
            if already {
                return Err(MatchdayError::Validation(format!(
                    "User {user_id} is already on session team {team_id}"
                )));
            }

            conn.execute(
                "INSERT INTO session_team_memberships (session_team_id, user_id) VALUES (?1, ?2)",
                [team_id, user_id],
            )?;

            Ok(SessionTeamMembership {
                id: conn.last_insert_rowid(),
                session_team_id: team_id,
                user_id,
            })
        })?;

        tracing::info!(
            membership_id = membership.id,
            team_id,
            user_id,
            "Added team member"
        );

        Ok(membership)
    }

    pub fn get_team_membership(
        &self,
        membership_id: TeamMembershipId,
    ) -> Result<SessionTeamMembership> {
        self.db.with_connection(|conn| -> Result<SessionTeamMembership> {
            conn.query_row(
                &format!(
                    "SELECT {TEAM_MEMBERSHIP_COLUMNS} FROM session_team_memberships WHERE id = ?1"
                ),
                [membership_id],
                SessionTeamMembership::from_row,
            )
            .optional()?
            .ok_or(MatchdayError::NotFound {
                entity: Table::SessionTeamMemberships,
                id: membership_id,
            })
        })
    }

    /// All team memberships in insertion order
    pub fn list_team_memberships(&self) -> Result<Vec<SessionTeamMembership>> {
        self.db
            .with_connection(|conn| -> Result<Vec<SessionTeamMembership>> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {TEAM_MEMBERSHIP_COLUMNS} FROM session_team_memberships ORDER BY id"
                ))?;
                let memberships = stmt
                    .query_map([], SessionTeamMembership::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(memberships)
            })
    }

    pub fn team_members(&self, team_id: TeamId) -> Result<Vec<SessionTeamMembership>> {
        self.db
            .with_connection(|conn| -> Result<Vec<SessionTeamMembership>> {
                require(conn, Table::SessionTeams, team_id)?;

                let mut stmt = conn.prepare(&format!(
                    "SELECT {TEAM_MEMBERSHIP_COLUMNS} FROM session_team_memberships
                     WHERE session_team_id = ?1 ORDER BY id"
                ))?;
                let memberships = stmt
                    .query_map([team_id], SessionTeamMembership::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(memberships)
            })
    }

    pub fn remove_team_member(&self, membership_id: TeamMembershipId) -> Result<()> {
        self.db.transaction(|conn| -> Result<()> {
            require(conn, Table::SessionTeamMemberships, membership_id)?;
            conn.execute(
                "DELETE FROM session_team_memberships WHERE id = ?1",
                [membership_id],
            )?;
            Ok(())
        })?;

        tracing::info!(membership_id, "Removed team member");

        Ok(())
    }
}

fn load_session(conn: &Connection, session_id: SessionId) -> Result<Session> {
    conn.query_row(
        &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
        [session_id],
        Session::from_row,
    )
    .optional()?
    .ok_or(MatchdayError::NotFound {
        entity: Table::Sessions,
        id: session_id,
    })
}

pub(crate) fn load_team(conn: &Connection, team_id: TeamId) -> Result<SessionTeam> {
    conn.query_row(
        &format!("SELECT {TEAM_COLUMNS} FROM session_teams WHERE id = ?1"),
        [team_id],
        SessionTeam::from_row,
    )
    .optional()?
    .ok_or(MatchdayError::NotFound {
        entity: Table::SessionTeams,
        id: team_id,
    })
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
