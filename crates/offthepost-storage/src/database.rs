//! Database connection and operations

use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

use crate::error::StorageError;
use crate::migrations::run_migrations;
use crate::Result;

/// Shared handle to the single SQLite connection.
///
/// Clones share the connection; every closure runs with the connection
/// locked, so writes are serialized.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Enable foreign keys
        conn.pragma_update(None, "foreign_keys", "ON")?;

        // WAL mode for better concurrent performance
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_connection<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Connection) -> std::result::Result<T, E>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Run `f` inside a transaction. Any error rolls the transaction back.
    pub fn transaction<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Connection) -> std::result::Result<T, E>,
        E: From<StorageError>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(StorageError::from)?;
        let result = f(&tx)?;
        tx.commit().map_err(StorageError::from)?;
        Ok(result)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        db.with_connection(|conn| {
            let count: i32 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            assert_eq!(count, 0);
            Ok::<_, StorageError>(())
        })
        .unwrap();
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::open_in_memory().unwrap();
        let enabled: i32 = db
            .with_connection(|conn| conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0)))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();

        let result: Result<()> = db.transaction(|conn| {
            conn.execute("INSERT INTO users (name) VALUES ('Khalid')", [])?;
            conn.execute("INSERT INTO users (name) VALUES ('Khalid')", [])?;
            Ok(())
        });
        assert!(result.is_err());

        let count: i64 = db
            .with_connection(|conn| conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0)))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_reopen_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offthepost.db");

        {
            let db = Database::open(&path).unwrap();
            db.with_connection(|conn| {
                conn.execute("INSERT INTO users (name) VALUES ('Mohamed')", [])
            })
            .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let name: String = db
            .with_connection(|conn| {
                conn.query_row("SELECT name FROM users WHERE id = 1", [], |row| row.get(0))
            })
            .unwrap();
        assert_eq!(name, "Mohamed");
    }
}
