//! OffThePost Core
//!
//! Wires storage, roster and matchday together behind one `Store` handle
//! and computes the per-player statistics.

mod config;
mod error;
mod stats;
mod store;

pub use config::Config;
pub use error::CoreError;
pub use stats::{MvpTally, Stats, TeamPlayed, UserProfile};
pub use store::Store;

// Re-export component types
pub use offthepost_matchday::{
    Goal, GoalId, MatchLog, MatchdayError, MvpVote, NewGoal, NewMvpVote, NewSession,
    NewSessionTeam, Session, SessionId, SessionManager, SessionTeam, SessionTeamMembership,
    TeamId, TeamMembershipId, VoteId,
};
pub use offthepost_roster::{
    Group, GroupId, GroupManager, GroupMembership, MembershipId, NewGroup, NewUser, RosterError,
    User, UserId, UserManager,
};
pub use offthepost_storage::{Database, ErrorKind, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
