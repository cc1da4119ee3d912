//! Database layer for VoiceNotes
//!
//! Provides:
//! - SeaORM entity models
//! - Repository implementing `NoteStore` on Postgres
//! - Connection pool management
//! - Schema bootstrap

pub mod models;
mod repository;

pub use repository::Repository;

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// Table and index for notes. Summary text must be present exactly when fresh.
const NOTES_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS notes (
    id UUID PRIMARY KEY,
    title TEXT NOT NULL,
    transcript TEXT NOT NULL,
    summary TEXT NOT NULL DEFAULT '',
    summary_state TEXT NOT NULL DEFAULT 'no_summary'
        CHECK (summary_state IN ('no_summary', 'fresh', 'stale')),
    duration BIGINT NOT NULL DEFAULT 0 CHECK (duration >= 0),
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    CHECK ((summary_state = 'fresh') = (summary <> ''))
);
CREATE INDEX IF NOT EXISTS notes_created_at_idx ON notes (created_at DESC);
"#;

/// Database connection pool wrapper
#[cfg_attr(not(feature = "mock"), derive(Clone))]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database...");

        let mut opts = ConnectOptions::new(&config.url);
        opts
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .sqlx_logging(false);

        let conn = Database::connect(opts)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect: {}", e),
            })?;

        info!("Database connection established");

        Ok(Self { conn })
    }

    /// Wrap an existing connection
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Create the notes table if it does not exist yet
    pub async fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_unprepared(NOTES_SCHEMA).await?;
        info!("Database schema ready");
        Ok(())
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.conn
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Ping failed: {}", e),
            })?;

        Ok(())
    }
}
