//! Database migrations
//!
//! Schema v1: users, groups, memberships, sessions, teams, goals, MVP votes.
//! Cascades follow ownership: group -> memberships and sessions,
//! session -> teams, goals and votes, team -> team memberships.
//! References to users never cascade.

use crate::Result;
use rusqlite::{Connection, OptionalExtension};

const SCHEMA_VERSION: i32 = 1;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    if current_version < SCHEMA_VERSION {
        set_schema_version(conn, SCHEMA_VERSION)?;
    }
    Ok(())
}

fn get_schema_version(conn: &Connection) -> Result<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )?;

    let version = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()?;

    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

fn migrate_v1(conn: &Connection) -> Result<()> {
    tracing::info!("Running migration v1: Initial schema");

    // Users and groups
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            fav_team TEXT,
            preferred_position TEXT,
            preferred_foot TEXT,
            nickname TEXT,
            profile_pic TEXT,
            CONSTRAINT ck_user_name_present CHECK (length(trim(name)) > 0)
        );

        CREATE TABLE IF NOT EXISTS play_groups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            leader_id INTEGER REFERENCES users(id),
            CONSTRAINT ck_group_name_present CHECK (length(trim(name)) > 0)
        );

        CREATE TABLE IF NOT EXISTS group_memberships (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            group_id INTEGER NOT NULL REFERENCES play_groups(id) ON DELETE CASCADE,
            joined_at TEXT NOT NULL,
            CONSTRAINT uq_user_group UNIQUE (user_id, group_id)
        );

        CREATE INDEX IF NOT EXISTS idx_group_memberships_group ON group_memberships(group_id);
        CREATE INDEX IF NOT EXISTS idx_play_groups_leader ON play_groups(leader_id);
    "#,
    )?;

    // Sessions and their teams
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id INTEGER NOT NULL REFERENCES play_groups(id) ON DELETE CASCADE,
            created_by_id INTEGER REFERENCES users(id),
            host_id INTEGER REFERENCES users(id),
            location TEXT,
            start_time TEXT NOT NULL,
            completed_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_group ON sessions(group_id);
        CREATE INDEX IF NOT EXISTS idx_sessions_created_by ON sessions(created_by_id);
        CREATE INDEX IF NOT EXISTS idx_sessions_host ON sessions(host_id);

        CREATE TABLE IF NOT EXISTS session_teams (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id INTEGER NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            captain_id INTEGER REFERENCES users(id),
            goals_for INTEGER,
            goals_against INTEGER,
            CONSTRAINT uq_team_name_per_session UNIQUE (session_id, name),
            CONSTRAINT ck_team_name_present CHECK (length(trim(name)) > 0),
            CONSTRAINT ck_team_score_non_negative
                CHECK ((goals_for IS NULL OR goals_for >= 0)
                   AND (goals_against IS NULL OR goals_against >= 0))
        );

        CREATE INDEX IF NOT EXISTS idx_session_teams_captain ON session_teams(captain_id);

        CREATE TABLE IF NOT EXISTS session_team_memberships (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_team_id INTEGER NOT NULL REFERENCES session_teams(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL REFERENCES users(id),
            CONSTRAINT uq_player_once_per_team UNIQUE (session_team_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_team_memberships_user ON session_team_memberships(user_id);
    "#,
    )?;

    // Match records
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS goals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id INTEGER NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
            team_id INTEGER NOT NULL REFERENCES session_teams(id),
            scorer_id INTEGER NOT NULL REFERENCES users(id),
            assist_id INTEGER REFERENCES users(id),
            minute INTEGER,
            created_at TEXT NOT NULL,
            CONSTRAINT ck_no_self_assist CHECK (assist_id IS NULL OR assist_id != scorer_id),
            CONSTRAINT ck_minute_non_negative CHECK (minute IS NULL OR minute >= 0)
        );

        CREATE INDEX IF NOT EXISTS idx_goals_session ON goals(session_id);
        CREATE INDEX IF NOT EXISTS idx_goals_team ON goals(team_id);
        CREATE INDEX IF NOT EXISTS idx_goals_scorer ON goals(scorer_id);
        CREATE INDEX IF NOT EXISTS idx_goals_assist ON goals(assist_id);

        CREATE TABLE IF NOT EXISTS mvp_votes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id INTEGER NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
            voter_id INTEGER NOT NULL REFERENCES users(id),
            voted_for_id INTEGER NOT NULL REFERENCES users(id),
            created_at TEXT NOT NULL,
            CONSTRAINT uq_one_vote_per_session UNIQUE (session_id, voter_id),
            CONSTRAINT ck_no_self_vote CHECK (voter_id != voted_for_id)
        );

        CREATE INDEX IF NOT EXISTS idx_mvp_votes_voter ON mvp_votes(voter_id);
        CREATE INDEX IF NOT EXISTS idx_mvp_votes_voted_for ON mvp_votes(voted_for_id);
    "#,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, StorageError, Violation};

    fn migrated() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    /// One group, one session, one team; users 1 and 2.
    fn seeded() -> Connection {
        let conn = migrated();
        conn.execute_batch(
            r#"
            INSERT INTO users (name) VALUES ('Khalid'), ('Mubarak');
            INSERT INTO play_groups (name) VALUES ('Hidden Leaf');
            INSERT INTO sessions (group_id, start_time) VALUES (1, '2025-08-28T18:30:00+00:00');
            INSERT INTO session_teams (session_id, name) VALUES (1, 'Team A');
        "#,
        )
        .unwrap();
        conn
    }

    fn violation_of(result: rusqlite::Result<usize>) -> Option<Violation> {
        StorageError::from(result.unwrap_err()).violation()
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = migrated();
        run_migrations(&conn).unwrap();

        let version: i32 = conn
            .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);

        let rows: i32 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_direct_writes_hit_unique_constraints() {
        let conn = seeded();

        let dup_user = conn.execute("INSERT INTO users (name) VALUES ('Khalid')", []);
        assert_eq!(violation_of(dup_user), Some(Violation::Unique));

        let dup_team = conn.execute(
            "INSERT INTO session_teams (session_id, name) VALUES (1, 'Team A')",
            [],
        );
        assert_eq!(violation_of(dup_team), Some(Violation::Unique));
    }

    #[test]
    fn test_direct_writes_hit_check_constraints() {
        let conn = seeded();

        let self_assist = conn.execute(
            "INSERT INTO goals (session_id, team_id, scorer_id, assist_id, created_at)
             VALUES (1, 1, 1, 1, '2025-08-28T19:00:00+00:00')",
            [],
        );
        assert_eq!(violation_of(self_assist), Some(Violation::Check));

        let self_vote = conn.execute(
            "INSERT INTO mvp_votes (session_id, voter_id, voted_for_id, created_at)
             VALUES (1, 2, 2, '2025-08-28T21:00:00+00:00')",
            [],
        );
        assert_eq!(violation_of(self_vote), Some(Violation::Check));

        let blank = conn.execute("INSERT INTO users (name) VALUES ('   ')", []);
        assert_eq!(violation_of(blank), Some(Violation::Check));
    }

    #[test]
    fn test_foreign_key_failure_kind_depends_on_operation() {
        let conn = seeded();

        // Inserting a row that points at a missing user
        let orphan = conn.execute(
            "INSERT INTO group_memberships (user_id, group_id, joined_at)
             VALUES (99, 1, '2025-08-28T18:00:00+00:00')",
            [],
        );
        let err = StorageError::from(orphan.unwrap_err());
        assert_eq!(err.violation(), Some(Violation::ForeignKey));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let orphan_goal = conn.execute(
            "INSERT INTO goals (session_id, team_id, scorer_id, created_at)
             VALUES (1, 1, 999, '2025-08-28T19:00:00+00:00')",
            [],
        );
        assert_eq!(
            StorageError::from(orphan_goal.unwrap_err()).kind(),
            ErrorKind::NotFound
        );

        // Captain reference blocks deleting the user
        conn.execute("UPDATE session_teams SET captain_id = 1 WHERE id = 1", [])
            .unwrap();
        let delete = conn.execute("DELETE FROM users WHERE id = 1", []);
        let err = StorageError::from(delete.unwrap_err()).on_delete();
        assert_eq!(err.violation(), Some(Violation::ForeignKey));
        assert_eq!(err.kind(), ErrorKind::Referential);

        // Only foreign-key failures are reclassified
        let dup = conn.execute("INSERT INTO users (name) VALUES ('Khalid')", []);
        let err = StorageError::from(dup.unwrap_err()).on_delete();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_session_delete_cascades() {
        let conn = seeded();
        conn.execute_batch(
            r#"
            INSERT INTO session_team_memberships (session_team_id, user_id) VALUES (1, 1);
            INSERT INTO goals (session_id, team_id, scorer_id, created_at)
                VALUES (1, 1, 1, '2025-08-28T19:00:00+00:00');
            INSERT INTO mvp_votes (session_id, voter_id, voted_for_id, created_at)
                VALUES (1, 2, 1, '2025-08-28T21:00:00+00:00');
        "#,
        )
        .unwrap();

        conn.execute("DELETE FROM sessions WHERE id = 1", []).unwrap();

        for table in [
            "session_teams",
            "session_team_memberships",
            "goals",
            "mvp_votes",
        ] {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
                .unwrap();
            assert_eq!(count, 0, "{table} should be empty");
        }

        let users: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(users, 2);
    }
}
