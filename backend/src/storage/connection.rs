use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::repositories::{
    PartyRepository, SignatureRepository, StoredSignatureRepository, WorkScheduleRepository,
};

/// DbConnection owns the SQLite pool and hands out repositories
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Open (creating if needed) the database at `url` and set up the schema
    pub async fn new(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        Self::setup_schema(&pool).await?;
        info!("Database ready at {}", url);

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Initialize a private in-memory database.
    ///
    /// An in-memory SQLite database lives as long as its connection, so the
    /// pool is pinned to a single connection that is never recycled.
    pub async fn init_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::setup_schema(&pool).await?;
        Ok(Self { pool: Arc::new(pool) })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn work_schedule_repository(&self) -> WorkScheduleRepository {
        WorkScheduleRepository::new(self.clone())
    }

    pub fn signature_repository(&self) -> SignatureRepository {
        SignatureRepository::new(self.clone())
    }

    pub fn stored_signature_repository(&self) -> StoredSignatureRepository {
        StoredSignatureRepository::new(self.clone())
    }

    pub fn party_repository(&self) -> PartyRepository {
        PartyRepository::new(self.clone())
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS clients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS managers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS consultants (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                client_id INTEGER REFERENCES clients (id),
                manager_id INTEGER REFERENCES managers (id),
                project_name TEXT,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        // period is '' for legacy full-day rows so the unique key stays total
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS work_schedules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                consultant_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                period TEXT NOT NULL DEFAULT '',
                work_type_id INTEGER,
                work_type_name TEXT,
                leave_type_id INTEGER,
                leave_type_name TEXT,
                type TEXT,
                absence_type TEXT,
                days_worked REAL NOT NULL DEFAULT 0,
                weekend_worked REAL NOT NULL DEFAULT 0,
                absence_days REAL NOT NULL DEFAULT 0,
                work_type_days REAL NOT NULL DEFAULT 0,
                month INTEGER,
                year INTEGER,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (consultant_id, date, period)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_work_schedules_month
            ON work_schedules (consultant_id, year, month);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS signature_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                consultant_id INTEGER NOT NULL,
                month INTEGER NOT NULL,
                year INTEGER NOT NULL,
                work_schedule_id INTEGER,
                client_id INTEGER,
                manager_id INTEGER,
                consultant_signature TEXT,
                consultant_signed_at TEXT,
                consultant_signer_id INTEGER,
                client_signature TEXT,
                client_signed_at TEXT,
                client_signer_id INTEGER,
                manager_signature TEXT,
                manager_signed_at TEXT,
                manager_signer_id INTEGER,
                completed_at TEXT,
                notification_status TEXT,
                notification_recipients TEXT,
                notification_detail TEXT,
                notified_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (consultant_id, month, year)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stored_signatures (
                id TEXT PRIMARY KEY,
                user_type TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                user_name TEXT,
                user_email TEXT,
                signature_data TEXT NOT NULL,
                signed_at TEXT NOT NULL,
                document_type TEXT,
                document_id INTEGER,
                consultant_id INTEGER,
                month INTEGER,
                year INTEGER
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_stored_signatures_user
            ON stored_signatures (user_type, user_id, signed_at DESC);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_stored_signatures_document
            ON stored_signatures (document_type, document_id);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}
