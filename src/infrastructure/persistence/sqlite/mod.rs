mod assignment_repo;
mod group_repo;

pub use assignment_repo::SqliteAssignmentRepository;
pub use group_repo::SqliteGroupRepository;

use crate::domain::error::DomainError;
use crate::domain::model::RaffleStatus;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub type DbConnection = Arc<Mutex<Connection>>;

/// Initialize the SQLite database at `db_path`
pub fn init_database(db_path: &Path) -> anyhow::Result<DbConnection> {
    // Ensure directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!("Initializing database at {:?}", db_path);

    let conn = Connection::open(db_path)?;
    create_schema(&conn)?;

    tracing::info!("Database initialized successfully");

    Ok(Arc::new(Mutex::new(conn)))
}

/// Open a private in-memory database with the schema applied
pub fn init_in_memory() -> anyhow::Result<DbConnection> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS groups (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            admin_id TEXT NOT NULL,
            members TEXT NOT NULL,
            raffle_status TEXT NOT NULL DEFAULT 'pending',
            raffle_date TEXT,
            draw_id TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS assignments (
            id TEXT PRIMARY KEY,
            group_id TEXT NOT NULL,
            draw_id TEXT NOT NULL,
            receiver_id TEXT NOT NULL,
            secret_santa_id TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_assignments_draw_santa
            ON assignments (group_id, draw_id, secret_santa_id);

        CREATE UNIQUE INDEX IF NOT EXISTS idx_assignments_draw_receiver
            ON assignments (group_id, draw_id, receiver_id);",
    )
}

fn lock(conn: &DbConnection) -> Result<MutexGuard<'_, Connection>, DomainError> {
    conn.lock().map_err(|e| DomainError::Database(e.to_string()))
}

impl ToSql for RaffleStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for RaffleStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        RaffleStatus::parse(text)
            .ok_or_else(|| FromSqlError::Other(format!("unknown raffle status: {}", text).into()))
    }
}
