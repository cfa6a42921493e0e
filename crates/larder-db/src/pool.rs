//! # Connection Pool
//!
//! Opens the SQLite file, applies pragmas and migrations, and hands out
//! repositories and transactions.
//!
//! ## Readers and the Writer
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SqlitePool (WAL)                                 │
//! │                                                                         │
//! │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────┐               │
//! │   │  conn 1  │  │  conn 2  │  │  conn 3  │  │  conn 4  │  ...          │
//! │   └────┬─────┘  └────┬─────┘  └────┬─────┘  └────┬─────┘               │
//! │        │             │             │             │                      │
//! │     report       delivery        sale          report                  │
//! │   (snapshot)   (write lock)   (busy wait)    (snapshot)                │
//! │                                                                         │
//! │   Readers see the last committed state and never wait.                 │
//! │   One ledger transaction holds the write lock; the others queue for    │
//! │   up to busy_timeout and then fail with DbError::Busy.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::{
    IngredientRepository, InventoryRepository, LocationRepository, MenuItemRepository,
    MovementRepository, RecipeRepository, StaffRepository,
};

// =============================================================================
// Configuration
// =============================================================================

/// Pool and pragma settings.
///
/// ```rust,ignore
/// let config = DbConfig::new("./data/larder.db")
///     .max_connections(8)
///     .busy_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first open. `:memory:` for a private database.
    pub database_path: PathBuf,

    /// Default: 5
    pub max_connections: u32,

    /// Default: 1
    pub min_connections: u32,

    /// How long to wait for a free pooled connection.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// How long a ledger transaction waits for another writer's lock.
    /// Default: 5 seconds
    pub busy_timeout: Duration,

    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// A private in-memory database, migrated and empty. Used by tests.
    ///
    /// Every connection to `:memory:` is a different database, so the pool
    /// is pinned to one connection.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the Larder database. Clones share one pool.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./larder.db")).await?;
/// let stock = db.inventory().list_for_location(location_id).await?;
///
/// let mut tx = db.begin().await?;
/// InventoryRepository::lock(&mut tx, location_id, &[ingredient_id]).await?;
/// // reads and writes through &mut tx
/// tx.commit().await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the database and runs pending migrations.
    ///
    /// Every connection gets WAL journaling, `synchronous = NORMAL`,
    /// enforced foreign keys and the configured busy timeout.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening database");

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // Off by default in SQLite.
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(
            max_connections = config.max_connections,
            busy_timeout_ms = config.busy_timeout.as_millis() as u64,
            "Pool ready"
        );

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// The raw pool, for queries no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Opens a deferred transaction on a pooled connection.
    ///
    /// Dropping the returned transaction without `commit()` rolls it back.
    pub async fn begin(&self) -> DbResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    pub fn locations(&self) -> LocationRepository {
        LocationRepository::new(self.pool.clone())
    }

    pub fn staff(&self) -> StaffRepository {
        StaffRepository::new(self.pool.clone())
    }

    pub fn ingredients(&self) -> IngredientRepository {
        IngredientRepository::new(self.pool.clone())
    }

    pub fn recipes(&self) -> RecipeRepository {
        RecipeRepository::new(self.pool.clone())
    }

    pub fn menu_items(&self) -> MenuItemRepository {
        MenuItemRepository::new(self.pool.clone())
    }

    pub fn inventory(&self) -> InventoryRepository {
        InventoryRepository::new(self.pool.clone())
    }

    /// Ledger reads and aggregates. Appends go through
    /// [`MovementRepository::insert`] inside a transaction.
    pub fn movements(&self) -> MovementRepository {
        MovementRepository::new(self.pool.clone())
    }

    /// Waits for checked-out connections and closes the pool.
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
