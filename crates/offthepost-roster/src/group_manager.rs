//! Group Manager
//!
//! Groups, their leader, and who belongs to them.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use offthepost_storage::{timestamp, Database, Table};

use crate::error::{delete_blocked, require, RosterError};
use crate::group::{Group, GroupMembership, NewGroup, GROUP_COLUMNS, MEMBERSHIP_COLUMNS};
use crate::{GroupId, MembershipId, Result, UserId};

pub struct GroupManager {
    db: Database,
}

impl GroupManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn create_group(&self, new_group: NewGroup) -> Result<Group> {
        let name = new_group.name.trim().to_string();
        if name.is_empty() {
            return Err(RosterError::Validation("Group name is required".to_string()));
        }

        let group = self.db.transaction(|conn| -> Result<Group> {
            if let Some(leader_id) = new_group.leader_id {
                require(conn, Table::Users, leader_id)?;
            }
            if find_by_name(conn, &name)?.is_some() {
                return Err(RosterError::Validation(format!(
                    "Group name already taken: {name}"
                )));
            }

            conn.execute(
                "INSERT INTO play_groups (name, leader_id) VALUES (?1, ?2)",
                rusqlite::params![name, new_group.leader_id],
            )?;

            Ok(Group {
                id: conn.last_insert_rowid(),
                name,
                leader_id: new_group.leader_id,
            })
        })?;

        tracing::info!(group_id = group.id, group_name = %group.name, "Created group");

        Ok(group)
    }

    pub fn get_group(&self, group_id: GroupId) -> Result<Group> {
        self.db
            .with_connection(|conn| -> Result<Group> { load_group(conn, group_id) })
    }

    pub fn find_group_by_name(&self, name: &str) -> Result<Option<Group>> {
        self.db
            .with_connection(|conn| -> Result<Option<Group>> { find_by_name(conn, name.trim()) })
    }

    /// All groups in insertion order
    pub fn list_groups(&self) -> Result<Vec<Group>> {
        self.db.with_connection(|conn| -> Result<Vec<Group>> {
            let mut stmt =
                conn.prepare(&format!("SELECT {GROUP_COLUMNS} FROM play_groups ORDER BY id"))?;
            let groups = stmt
                .query_map([], Group::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(groups)
        })
    }

    /// Set or clear the group leader
    pub fn assign_leader(&self, group_id: GroupId, leader_id: Option<UserId>) -> Result<Group> {
        let group = self.db.transaction(|conn| -> Result<Group> {
            let mut group = load_group(conn, group_id)?;
            if let Some(leader_id) = leader_id {
                require(conn, Table::Users, leader_id)?;
            }

            conn.execute(
                "UPDATE play_groups SET leader_id = ?1 WHERE id = ?2",
                rusqlite::params![leader_id, group_id],
            )?;
            group.leader_id = leader_id;
            Ok(group)
        })?;

        tracing::info!(group_id, leader_id = ?group.leader_id, "Assigned group leader");

        Ok(group)
    }

    /// Delete a group together with its memberships and sessions
    /// (and, through the sessions, their teams, goals and votes).
    pub fn delete_group(&self, group_id: GroupId) -> Result<()> {
        self.db.transaction(|conn| -> Result<()> {
            require(conn, Table::Groups, group_id)?;
            conn.execute("DELETE FROM play_groups WHERE id = ?1", [group_id])
                .map_err(delete_blocked)?;
            Ok(())
        })?;

        tracing::info!(group_id, "Deleted group");

        Ok(())
    }

    pub fn add_member(&self, group_id: GroupId, user_id: UserId) -> Result<GroupMembership> {
        let membership = self.db.transaction(|conn| -> Result<GroupMembership> {
            require(conn, Table::Groups, group_id)?;
            require(conn, Table::Users, user_id)?;

            let existing: Option<MembershipId> = conn
                .query_row(
                    "SELECT id FROM group_memberships WHERE user_id = ?1 AND group_id = ?2",
                    [user_id, group_id],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Err(RosterError::Validation(format!(
                    "User {user_id} is already a member of group {group_id}"
                )));
            }

            let joined_at = Utc::now();
            conn.execute(
                "INSERT INTO group_memberships (user_id, group_id, joined_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![user_id, group_id, timestamp::to_sql(&joined_at)],
            )?;

            Ok(GroupMembership {
                id: conn.last_insert_rowid(),
                user_id,
                group_id,
                joined_at,
            })
        })?;

        tracing::info!(
            membership_id = membership.id,
            group_id,
            user_id,
            "Added group member"
        );

        Ok(membership)
    }

    pub fn get_membership(&self, membership_id: MembershipId) -> Result<GroupMembership> {
        self.db.with_connection(|conn| -> Result<GroupMembership> {
            conn.query_row(
                &format!("SELECT {MEMBERSHIP_COLUMNS} FROM group_memberships WHERE id = ?1"),
                [membership_id],
                GroupMembership::from_row,
            )
            .optional()?
            .ok_or(RosterError::NotFound {
                entity: Table::GroupMemberships,
                id: membership_id,
            })
        })
    }

    /// All memberships in insertion order
    pub fn list_memberships(&self) -> Result<Vec<GroupMembership>> {
        self.db.with_connection(|conn| -> Result<Vec<GroupMembership>> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MEMBERSHIP_COLUMNS} FROM group_memberships ORDER BY id"
            ))?;
            let memberships = stmt
                .query_map([], GroupMembership::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(memberships)
        })
    }

    /// Memberships of one group, in join order
    pub fn group_members(&self, group_id: GroupId) -> Result<Vec<GroupMembership>> {
        self.db.with_connection(|conn| -> Result<Vec<GroupMembership>> {
            require(conn, Table::Groups, group_id)?;

            let mut stmt = conn.prepare(&format!(
                "SELECT {MEMBERSHIP_COLUMNS} FROM group_memberships
                 WHERE group_id = ?1 ORDER BY id"
            ))?;
            let memberships = stmt
                .query_map([group_id], GroupMembership::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(memberships)
        })
    }

    pub fn remove_membership(&self, membership_id: MembershipId) -> Result<()> {
        self.db.transaction(|conn| -> Result<()> {
            require(conn, Table::GroupMemberships, membership_id)?;
            conn.execute(
                "DELETE FROM group_memberships WHERE id = ?1",
                [membership_id],
            )?;
            Ok(())
        })?;

        tracing::info!(membership_id, "Removed group member");

        Ok(())
    }
}

fn load_group(conn: &Connection, group_id: GroupId) -> Result<Group> {
    conn.query_row(
        &format!("SELECT {GROUP_COLUMNS} FROM play_groups WHERE id = ?1"),
        [group_id],
        Group::from_row,
    )
    .optional()?
    .ok_or(RosterError::NotFound {
        entity: Table::Groups,
        id: group_id,
    })
}

fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Group>> {
    Ok(conn
        .query_row(
            &format!("SELECT {GROUP_COLUMNS} FROM play_groups WHERE name = ?1"),
            [name],
            Group::from_row,
        )
        .optional()?)
}

impl Clone for GroupManager {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
