//! Database Connection and Setup
//!
//! Manages SQLite database connection and migrations.

use log::info;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult};

/// Shared connection handle used by every repository
pub type SharedConnection = Arc<Mutex<Option<Connection>>>;

/// Database state wrapper
#[derive(Clone)]
pub struct DbState {
    pub conn: SharedConnection,
}

impl DbState {
    /// Create an uninitialized state; repositories fail until a connection is set
    pub fn new() -> Self {
        Self {
            conn: Arc::new(Mutex::new(None)),
        }
    }

    /// Handle to pass into repositories
    pub fn connection(&self) -> SharedConnection {
        Arc::clone(&self.conn)
    }
}

impl Default for DbState {
    fn default() -> Self {
        Self::new()
    }
}

/// Borrow the live connection out of a locked handle
pub(crate) fn live(conn: &Option<Connection>) -> DomainResult<&Connection> {
    conn.as_ref()
        .ok_or_else(|| DomainError::Internal("Database not initialized".to_string()))
}

/// Open the database at `db_path` (`:memory:` is accepted) and run migrations
pub fn init_db(db_path: &Path) -> DomainResult<DbState> {
    let conn = Connection::open(db_path)?;
    run_migrations(&conn)?;
    info!("Database ready at {}", db_path.display());

    Ok(DbState {
        conn: Arc::new(Mutex::new(Some(conn))),
    })
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> DomainResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    // parent_id carries no foreign key: the catalog tolerates orphans
    conn.execute(
        "CREATE TABLE IF NOT EXISTS services (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            parent_id INTEGER,
            name TEXT NOT NULL,
            description TEXT,
            is_bookable INTEGER NOT NULL DEFAULT 0,
            price REAL,
            display_order INTEGER NOT NULL DEFAULT 0,
            is_featured INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    if !column_exists(conn, "services", "booking_config")? {
        conn.execute("ALTER TABLE services ADD COLUMN booking_config TEXT", [])
            .map_err(|e| DomainError::Internal(format!("Failed to add booking_config: {}", e)))?;
    }

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_services_parent ON services(parent_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS site_settings (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            data TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let state = init_db(Path::new(":memory:")).expect("init");
        let guard = state.conn.lock().await;
        let conn = live(&guard).expect("live connection");
        run_migrations(conn).expect("second run");
        assert!(column_exists(conn, "services", "booking_config").unwrap());
        assert!(!column_exists(conn, "services", "nope").unwrap());
    }

    #[tokio::test]
    async fn test_uninitialized_state_errors() {
        let state = DbState::new();
        let guard = state.conn.lock().await;
        assert!(matches!(live(&guard), Err(DomainError::Internal(_))));
    }
}
