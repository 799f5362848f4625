//! SQLite pool for the collection store.
//!
//! [`create_pool`] opens (or creates) the database file, applies the embedded
//! migrations for `collections`, `records` and `collection_records`, and checks
//! the pool answers before handing it to [`SqliteCollectionStore`].
//!
//! Membership rows reference both parents, so foreign keys are switched on for
//! every connection; deleting a collection drops its memberships with it.
//!
//! ```rust,ignore
//! let pool = create_pool(DatabaseConfig::new("collections.db")).await?;
//! let store = SqliteCollectionStore::new(pool);
//! ```
//!
//! [`SqliteCollectionStore`]: crate::SqliteCollectionStore

use crate::{LibraryError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where the store lives and how many connections may touch it
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `sqlite:<path>` or `sqlite::memory:`
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Recycle connections after this long; `None` keeps them forever
    pub max_lifetime: Option<Duration>,
    pub idle_timeout: Option<Duration>,
}

impl DatabaseConfig {
    /// File-backed store at `database_path`, created on first use
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        let path = database_path.into();
        Self {
            database_url: format!("sqlite:{}", path.display()),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            max_lifetime: Some(Duration::from_secs(1800)),
            idle_timeout: Some(Duration::from_secs(600)),
        }
    }

    /// In-memory store.
    ///
    /// The database only exists inside its connection, so the pool is pinned
    /// to one connection that is never recycled.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            max_lifetime: None,
            idle_timeout: None,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:")
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Open the store, apply migrations, and verify the pool
///
/// # Errors
///
/// Returns `LibraryError::Database` if the file cannot be opened or the pool
/// does not answer, and `LibraryError::Migration` if the schema cannot be
/// applied
pub async fn create_pool(config: DatabaseConfig) -> Result<Pool<Sqlite>> {
    info!(
        database_url = %config.database_url,
        max_connections = config.max_connections,
        "Opening collection store"
    );

    let mut connect_options = SqliteConnectOptions::from_str(&config.database_url)
        .map_err(LibraryError::Database)?
        .foreign_keys(true)
        .create_if_missing(true);

    // WAL needs a file; in-memory databases keep the default journal.
    if !config.is_in_memory() {
        connect_options = connect_options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
    }

    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .max_lifetime(config.max_lifetime)
        .idle_timeout(config.idle_timeout)
        .connect_with(connect_options)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to open collection store");
            LibraryError::Database(e)
        })?;

    run_migrations(&pool).await?;
    health_check(&pool).await?;

    debug!(connections = pool.size(), "Collection store ready");
    Ok(pool)
}

/// In-memory store with the schema applied
pub async fn create_test_pool() -> Result<Pool<Sqlite>> {
    create_pool(DatabaseConfig::in_memory()).await
}

async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Collection schema migration failed");
            LibraryError::Migration(e.to_string())
        })?;

    debug!("Collection schema up to date");
    Ok(())
}

pub async fn health_check(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Collection store health check failed");
            LibraryError::Database(e)
        })?;
    Ok(())
}
