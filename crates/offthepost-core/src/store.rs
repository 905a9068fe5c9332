//! Store handle
//!
//! The one object an application builds at startup and hands to whatever
//! serves requests. Cloning is cheap; clones share the database connection.

use offthepost_matchday::{MatchLog, SessionManager};
use offthepost_roster::{GroupManager, UserManager};
use offthepost_storage::Database;

use crate::config::Config;
use crate::stats::Stats;
use crate::Result;

#[derive(Clone)]
pub struct Store {
    config: Config,
    db: Database,
    users: UserManager,
    groups: GroupManager,
    sessions: SessionManager,
    match_log: MatchLog,
    stats: Stats,
}

impl Store {
    /// Open (or create) the database named by `config`
    pub fn open(config: Config) -> Result<Self> {
        // Ensure data directory exists
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        tracing::info!(path = %config.database_path.display(), "Opened store");

        Ok(Self::with_database(config, db))
    }

    /// A throwaway store backed by an in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        let config = Config {
            database_path: ":memory:".into(),
        };
        Ok(Self::with_database(config, db))
    }

    fn with_database(config: Config, db: Database) -> Self {
        Self {
            config,
            users: UserManager::new(db.clone()),
            groups: GroupManager::new(db.clone()),
            sessions: SessionManager::new(db.clone()),
            match_log: MatchLog::new(db.clone()),
            stats: Stats::new(db.clone()),
            db,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn users(&self) -> &UserManager {
        &self.users
    }

    pub fn groups(&self) -> &GroupManager {
        &self.groups
    }

    /// Sessions, their teams and team rosters
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Goals and MVP votes
    pub fn match_log(&self) -> &MatchLog {
        &self.match_log
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }
}
