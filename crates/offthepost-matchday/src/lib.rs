//! OffThePost Matchday
//!
//! Everything that happens around one game:
//! - A Session belongs to a group and is finished once `completed_at` is set
//! - Teams are named sides within a session, with rosters
//! - Goals (with optional assist) and MVP votes are logged per session

mod error;
mod match_log;
mod record;
mod session;
mod session_manager;
mod team;

pub use error::MatchdayError;
pub use match_log::MatchLog;
pub use record::{Goal, MvpVote, NewGoal, NewMvpVote};
pub use session::{NewSession, Session};
pub use session_manager::SessionManager;
pub use team::{NewSessionTeam, SessionTeam, SessionTeamMembership};

pub use offthepost_roster::{GroupId, UserId};

pub type SessionId = i64;
pub type TeamId = i64;
pub type TeamMembershipId = i64;
pub type GoalId = i64;
pub type VoteId = i64;

pub type Result<T> = std::result::Result<T, MatchdayError>;
