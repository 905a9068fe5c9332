//! Match Log
//!
//! Goals and MVP votes recorded against a session.

use chrono::Utc;
use rusqlite::OptionalExtension;

use offthepost_storage::{timestamp, Database, Table};

use crate::error::{require, require_optional, MatchdayError};
use crate::record::{Goal, MvpVote, NewGoal, NewMvpVote, GOAL_COLUMNS, VOTE_COLUMNS};
use crate::session_manager::load_team;
use crate::team::refresh_scores_if_completed;
use crate::{GoalId, Result, SessionId, VoteId};

pub struct MatchLog {
    db: Database,
}

impl MatchLog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Log a goal. The team must play in the goal's session and the
    /// assisting player, if any, cannot be the scorer.
    pub fn record_goal(&self, new_goal: NewGoal) -> Result<Goal> {
        if new_goal.assist_id == Some(new_goal.scorer_id) {
            return Err(MatchdayError::Validation(format!(
                "User {} cannot assist their own goal",
                new_goal.scorer_id
            )));
        }

        let goal = self.db.transaction(|conn| -> Result<Goal> {
            require(conn, Table::Sessions, new_goal.session_id)?;
            let team = load_team(conn, new_goal.team_id)?;
            if team.session_id != new_goal.session_id {
                return Err(MatchdayError::Validation(format!(
                    "Session team {} does not play in session {}",
                    team.id, new_goal.session_id
                )));
            }
            require(conn, Table::Users, new_goal.scorer_id)?;
            require_optional(conn, Table::Users, new_goal.assist_id)?;

            let created_at = Utc::now();
            conn.execute(
                "INSERT INTO goals (session_id, team_id, scorer_id, assist_id, minute, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    new_goal.session_id,
                    new_goal.team_id,
                    new_goal.scorer_id,
                    new_goal.assist_id,
                    new_goal.minute,
                    timestamp::to_sql(&created_at),
                ],
            )?;
            let id = conn.last_insert_rowid();
            refresh_scores_if_completed(conn, new_goal.session_id)?;

            Ok(Goal {
                id,
                session_id: new_goal.session_id,
                team_id: new_goal.team_id,
                scorer_id: new_goal.scorer_id,
                assist_id: new_goal.assist_id,
                minute: new_goal.minute,
                created_at,
            })
        })?;

        tracing::info!(
            goal_id = goal.id,
            session_id = goal.session_id,
            team_id = goal.team_id,
            scorer_id = goal.scorer_id,
            assist_id = ?goal.assist_id,
            "Recorded goal"
        );

        Ok(goal)
    }

    pub fn get_goal(&self, goal_id: GoalId) -> Result<Goal> {
        self.db.with_connection(|conn| -> Result<Goal> {
            conn.query_row(
                &format!("SELECT {GOAL_COLUMNS} FROM goals WHERE id = ?1"),
                [goal_id],
                Goal::from_row,
            )
            .optional()?
            .ok_or(MatchdayError::NotFound {
                entity: Table::Goals,
                id: goal_id,
            })
        })
    }

    /// All goals in insertion order
    pub fn list_goals(&self) -> Result<Vec<Goal>> {
        self.db.with_connection(|conn| -> Result<Vec<Goal>> {
            let mut stmt = conn.prepare(&format!("SELECT {GOAL_COLUMNS} FROM goals ORDER BY id"))?;
            let goals = stmt
                .query_map([], Goal::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(goals)
        })
    }

    pub fn session_goals(&self, session_id: SessionId) -> Result<Vec<Goal>> {
        self.db.with_connection(|conn| -> Result<Vec<Goal>> {
            require(conn, Table::Sessions, session_id)?;

            let mut stmt = conn.prepare(&format!(
                "SELECT {GOAL_COLUMNS} FROM goals WHERE session_id = ?1 ORDER BY id"
            ))?;
            let goals = stmt
                .query_map([session_id], Goal::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(goals)
        })
    }

    pub fn delete_goal(&self, goal_id: GoalId) -> Result<()> {
        self.db.transaction(|conn| -> Result<()> {
            let session_id: Option<SessionId> = conn
                .query_row(
                    "SELECT session_id FROM goals WHERE id = ?1",
                    [goal_id],
                    |row| row.get(0),
                )
                .optional()?;
            let session_id = session_id.ok_or(MatchdayError::NotFound {
                entity: Table::Goals,
                id: goal_id,
            })?;

            conn.execute("DELETE FROM goals WHERE id = ?1", [goal_id])?;
            refresh_scores_if_completed(conn, session_id)?;
            Ok(())
        })?;

        tracing::info!(goal_id, "Deleted goal");

        Ok(())
    }

    /// Cast a vote: one per voter and session, never for oneself.
    pub fn cast_vote(&self, new_vote: NewMvpVote) -> Result<MvpVote> {
        if new_vote.voter_id == new_vote.voted_for_id {
            return Err(MatchdayError::Validation(format!(
                "User {} cannot vote for themselves",
                new_vote.voter_id
            )));
        }

        let vote = self.db.transaction(|conn| -> Result<MvpVote> {
            require(conn, Table::Sessions, new_vote.session_id)?;
            require(conn, Table::Users, new_vote.voter_id)?;
            require(conn, Table::Users, new_vote.voted_for_id)?;

            let already: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM mvp_votes WHERE session_id = ?1 AND voter_id = ?2)",
                [new_vote.session_id, new_vote.voter_id],
                |row| row.get(0),
            )?;
            if already {
                return Err(MatchdayError::Validation(format!(
                    "User {} already voted in session {}",
                    new_vote.voter_id, new_vote.session_id
                )));
            }

            let created_at = Utc::now();
            conn.execute(
                "INSERT INTO mvp_votes (session_id, voter_id, voted_for_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    new_vote.session_id,
                    new_vote.voter_id,
                    new_vote.voted_for_id,
                    timestamp::to_sql(&created_at),
                ],
            )?;

            Ok(MvpVote {
                id: conn.last_insert_rowid(),
                session_id: new_vote.session_id,
                voter_id: new_vote.voter_id,
                voted_for_id: new_vote.voted_for_id,
                created_at,
            })
        })?;

        tracing::info!(
            vote_id = vote.id,
            session_id = vote.session_id,
            voter_id = vote.voter_id,
            voted_for_id = vote.voted_for_id,
            "Cast MVP vote"
        );

        Ok(vote)
    }

    pub fn get_vote(&self, vote_id: VoteId) -> Result<MvpVote> {
        self.db.with_connection(|conn| -> Result<MvpVote> {
            conn.query_row(
                &format!("SELECT {VOTE_COLUMNS} FROM mvp_votes WHERE id = ?1"),
                [vote_id],
                MvpVote::from_row,
            )
            .optional()?
            .ok_or(MatchdayError::NotFound {
                entity: Table::MvpVotes,
                id: vote_id,
            })
        })
    }

    /// All votes in insertion order
    pub fn list_votes(&self) -> Result<Vec<MvpVote>> {
        self.db.with_connection(|conn| -> Result<Vec<MvpVote>> {
            let mut stmt =
                conn.prepare(&format!("SELECT {VOTE_COLUMNS} FROM mvp_votes ORDER BY id"))?;
            let votes = stmt
                .query_map([], MvpVote::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(votes)
        })
    }

    pub fn session_votes(&self, session_id: SessionId) -> Result<Vec<MvpVote>> {
        self.db.with_connection(|conn| -> Result<Vec<MvpVote>> {
            require(conn, Table::Sessions, session_id)?;

            let mut stmt = conn.prepare(&format!(
                "SELECT {VOTE_COLUMNS} FROM mvp_votes WHERE session_id = ?1 ORDER BY id"
            ))?;
            let votes = stmt
                .query_map([session_id], MvpVote::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(votes)
        })
    }

    pub fn delete_vote(&self, vote_id: VoteId) -> Result<()> {
        self.db.transaction(|conn| -> Result<()> {
            require(conn, Table::MvpVotes, vote_id)?;
            conn.execute("DELETE FROM mvp_votes WHERE id = ?1", [vote_id])?;
            Ok(())
        })?;

        tracing::info!(vote_id, "Deleted MVP vote");

        Ok(())
    }
}

impl Clone for MatchLog {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
