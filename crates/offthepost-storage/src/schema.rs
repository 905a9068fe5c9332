//! Table inventory and reference lookups shared by the managers.

use rusqlite::Connection;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Users,
    Groups,
    GroupMemberships,
    Sessions,
    SessionTeams,
    SessionTeamMemberships,
    Goals,
    MvpVotes,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Groups => "play_groups",
            Self::GroupMemberships => "group_memberships",
            Self::Sessions => "sessions",
            Self::SessionTeams => "session_teams",
            Self::SessionTeamMemberships => "session_team_memberships",
            Self::Goals => "goals",
            Self::MvpVotes => "mvp_votes",
        }
    }

    /// Singular entity name used in error messages.
    pub fn entity(self) -> &'static str {
        match self {
            Self::Users => "User",
            Self::Groups => "Group",
            Self::GroupMemberships => "Group membership",
            Self::Sessions => "Session",
            Self::SessionTeams => "Session team",
            Self::SessionTeamMemberships => "Team membership",
            Self::Goals => "Goal",
            Self::MvpVotes => "MVP vote",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entity())
    }
}

/// Every column that points at `users.id`. None of them cascade.
const USER_REFERENCE_COLUMNS: &[(Table, &str)] = &[
    (Table::GroupMemberships, "user_id"),
    (Table::Groups, "leader_id"),
    (Table::Sessions, "created_by_id"),
    (Table::Sessions, "host_id"),
    (Table::SessionTeams, "captain_id"),
    (Table::SessionTeamMemberships, "user_id"),
    (Table::Goals, "scorer_id"),
    (Table::Goals, "assist_id"),
    (Table::MvpVotes, "voter_id"),
    (Table::MvpVotes, "voted_for_id"),
];

/// Rows in `table` that reference a user through `column`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserReference {
    pub table: Table,
    pub column: &'static str,
    pub count: i64,
}

impl fmt::Display for UserReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} ({} row{})",
            self.table.name(),
            self.column,
            self.count,
            if self.count == 1 { "" } else { "s" }
        )
    }
}

pub fn exists(conn: &Connection, table: Table, id: i64) -> rusqlite::Result<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)",
        table.name()
    );
    conn.query_row(&sql, [id], |row| row.get(0))
}

/// All non-empty references to `user_id`, in a fixed column order.
pub fn user_references(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<UserReference>> {
    let mut references = Vec::new();

    for &(table, column) in USER_REFERENCE_COLUMNS {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?1",
            table.name(),
            column
        );
        let count: i64 = conn.query_row(&sql, [user_id], |row| row.get(0))?;
        if count > 0 {
            references.push(UserReference {
                table,
                column,
                count,
            });
        }
    }

    Ok(references)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[test]
    fn test_exists() {
        let db = Database::open_in_memory().unwrap();
        db.with_connection(|conn| {
            conn.execute("INSERT INTO users (name) VALUES ('Abdi')", [])?;
            assert!(exists(conn, Table::Users, 1)?);
            assert!(!exists(conn, Table::Users, 2)?);
            assert!(!exists(conn, Table::Groups, 1)?);
            Ok::<_, rusqlite::Error>(())
        })
        .unwrap();
    }

    #[test]
    fn test_user_references() {
        let db = Database::open_in_memory().unwrap();
        db.with_connection(|conn| {
            conn.execute_batch(
                r#"
                INSERT INTO users (name) VALUES ('Abdi'), ('Yaya');
                INSERT INTO play_groups (name, leader_id) VALUES ('The Boys', 1);
                INSERT INTO group_memberships (user_id, group_id, joined_at)
                    VALUES (1, 1, '2025-08-25T18:00:00+00:00');
            "#,
            )?;

            let refs = user_references(conn, 1)?;
            assert_eq!(refs.len(), 2);
            assert_eq!(refs[0].table, Table::GroupMemberships);
            assert_eq!(refs[0].to_string(), "group_memberships.user_id (1 row)");
            assert_eq!(refs[1].table, Table::Groups);
            assert_eq!(refs[1].column, "leader_id");

            assert!(user_references(conn, 2)?.is_empty());
            Ok::<_, rusqlite::Error>(())
        })
        .unwrap();
    }
}
