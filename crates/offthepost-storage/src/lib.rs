//! OffThePost Storage Layer
//!
//! SQLite persistence for groups, sessions and match records.
//! Integrity constraints live in the schema so that every write path,
//! validated or not, is held to them.

mod database;
mod error;
mod migrations;
mod schema;
pub mod timestamp;

pub use database::Database;
pub use error::{ErrorKind, StorageError, Violation};
pub use schema::{exists, user_references, Table, UserReference};

pub type Result<T> = std::result::Result<T, StorageError>;
