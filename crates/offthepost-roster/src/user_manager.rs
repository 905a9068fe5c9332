//! User Manager
//!
//! Creates, reads and deletes players. Users are referenced by almost
//! every other record and are never cascaded, so a delete is only allowed
//! once nothing points at the user any more.

use rusqlite::{Connection, OptionalExtension};

use offthepost_storage::{user_references, Database, Table};

use crate::error::{delete_blocked, require, RosterError};
use crate::user::{NewUser, User, USER_COLUMNS};
use crate::{Result, UserId};

pub struct UserManager {
    db: Database,
}

impl UserManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn create_user(&self, new_user: NewUser) -> Result<User> {
        let new_user = new_user.normalized()?;

        let user = self.db.transaction(|conn| -> Result<User> {
            if find_by_name(conn, &new_user.name)?.is_some() {
                return Err(RosterError::Validation(format!(
                    "User name already taken: {}",
                    new_user.name
                )));
            }

            conn.execute(
                "INSERT INTO users
                 (name, fav_team, preferred_position, preferred_foot, nickname, profile_pic)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    new_user.name,
                    new_user.fav_team,
                    new_user.preferred_position,
                    new_user.preferred_foot,
                    new_user.nickname,
                    new_user.profile_pic,
                ],
            )?;

            Ok(new_user.into_user(conn.last_insert_rowid()))
        })?;

        tracing::info!(user_id = user.id, user_name = %user.name, "Created user");

        Ok(user)
    }

    pub fn get_user(&self, user_id: UserId) -> Result<User> {
        self.db.with_connection(|conn| -> Result<User> {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                [user_id],
                User::from_row,
            )
            .optional()?
            .ok_or(RosterError::NotFound {
                entity: Table::Users,
                id: user_id,
            })
        })
    }

    pub fn find_user_by_name(&self, name: &str) -> Result<Option<User>> {
        self.db
            .with_connection(|conn| -> Result<Option<User>> { find_by_name(conn, name.trim()) })
    }

    /// All users in insertion order
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.db.with_connection(|conn| -> Result<Vec<User>> {
            let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
            let users = stmt
                .query_map([], User::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(users)
        })
    }

    /// Delete a user nothing refers to.
    ///
    /// Fails with `Referential` naming every table/column still pointing at
    /// the user (memberships, leadership, sessions, teams, goals, votes).
    pub fn delete_user(&self, user_id: UserId) -> Result<()> {
        self.db.transaction(|conn| -> Result<()> {
            require(conn, Table::Users, user_id)?;

            let references = user_references(conn, user_id)?;
            if !references.is_empty() {
                let listed = references
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                tracing::warn!(user_id, references = %listed, "Rejected user delete");
                return Err(RosterError::Referential(format!(
                    "User {user_id} is still referenced by {listed}"
                )));
            }

            conn.execute("DELETE FROM users WHERE id = ?1", [user_id])
                .map_err(delete_blocked)?;
            Ok(())
        })?;

        tracing::info!(user_id, "Deleted user");

        Ok(())
    }
}

fn find_by_name(conn: &Connection, name: &str) -> Result<Option<User>> {
    Ok(conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE name = ?1"),
            [name],
            User::from_row,
        )
        .optional()?)
}

impl Clone for UserManager {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
