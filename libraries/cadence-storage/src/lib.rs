//! Cadence Player Storage
//!
//! `SQLite` persistence for restorable player state.
//!
//! The playback engine only needs a string key/value store, so the schema is
//! a single `kv_store` table. [`SqliteStateStore`] exposes it through the
//! `StateStore` trait; [`MemoryStateStore`] is the non-durable alternative.
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_storage::{create_pool, run_migrations, SqliteStateStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://cadence.db").await?;
//! run_migrations(&pool).await?;
//!
//! let store = SqliteStateStore::new(pool);
//! # Ok(())
//! # }
//! ```

mod error;
mod store;

pub mod kv;

pub use error::{Result, StorageError};
pub use store::{MemoryStateStore, SqliteStateStore};

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;
use tracing::debug;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// Call once at startup, before the first read.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `sqlite://cadence.db`)
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    debug!(database_url, "Creating pool");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}
