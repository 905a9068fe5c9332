//! OffThePost Roster
//!
//! The people side of the model:
//! - Users (players) with their profile fields
//! - Groups with an optional leader
//! - Group memberships, unique per (user, group)

mod error;
mod group;
mod group_manager;
mod user;
mod user_manager;

pub use error::RosterError;
pub use group::{Group, GroupMembership, NewGroup};
pub use group_manager::GroupManager;
pub use user::{normalize_text, NewUser, User};
pub use user_manager::UserManager;

pub type UserId = i64;
pub type GroupId = i64;
pub type MembershipId = i64;

pub type Result<T> = std::result::Result<T, RosterError>;
