//! # Database Pool Management
//!
//! Connection pool creation and configuration.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  DbConfig::mysql(..) / DbConfig::sqlite(path) / DbConfig::in_memory()  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │        AnyPool (sqlx Any driver)        │                           │
//! │  │                                         │                           │
//! │  │   mysql://…   → MRBS production server  │                           │
//! │  │   sqlite://…  → local file              │                           │
//! │  │   sqlite::memory: → tests               │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UserRepository / RoomRepository / BookingRepository / DigicodeRepo   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every statement is written in the SQL subset shared by MySQL and SQLite
//! (`?` placeholders, integer times), so the same repositories serve both.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Once;
use std::time::Duration;

use sqlx::any::{AnyConnectOptions, AnyPoolOptions};
use sqlx::mysql::MySqlConnectOptions;
use sqlx::{AnyPool, ConnectOptions};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::booking::BookingRepository;
use crate::repository::digicode::DigicodeRepository;
use crate::repository::room::RoomRepository;
use crate::repository::user::UserRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Where the database lives.
#[derive(Clone, PartialEq, Eq)]
pub enum DbTarget {
    /// MRBS MySQL server.
    MySql {
        host: String,
        port: u16,
        database: String,
        username: String,
        password: String,
    },
    /// SQLite database file (created if missing).
    Sqlite(PathBuf),
    /// Private in-memory SQLite database.
    Memory,
}

impl DbTarget {
    /// Whether this target uses the MySQL dialect.
    pub fn is_mysql(&self) -> bool {
        matches!(self, DbTarget::MySql { .. })
    }

    /// Builds the connection URL. Credentials are percent-encoded.
    fn connect_url(&self) -> String {
        match self {
            DbTarget::MySql {
                host,
                port,
                database,
                username,
                password,
            } => MySqlConnectOptions::new()
                .host(host)
                .port(*port)
                .database(database)
                .username(username)
                .password(password)
                .to_url_lossy()
                .to_string(),
            DbTarget::Sqlite(path) => format!("sqlite://{}?mode=rwc", path.display()),
            DbTarget::Memory => "sqlite::memory:".to_string(),
        }
    }
}

impl fmt::Debug for DbTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbTarget::MySql {
                host,
                port,
                database,
                username,
                ..
            } => f
                .debug_struct("MySql")
                .field("host", host)
                .field("port", port)
                .field("database", database)
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            DbTarget::Sqlite(path) => f.debug_tuple("Sqlite").field(path).finish(),
            DbTarget::Memory => f.write_str("Memory"),
        }
    }
}

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::mysql("db.m2l.local", 3306, "mrbs", "mrbs", "secret")
///     .max_connections(5)
///     .run_migrations(false);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Server or file to connect to.
    pub target: DbTarget,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection acquire timeout.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection. `None` keeps connections
    /// forever (required for in-memory databases).
    /// Default: 10 minutes
    pub idle_timeout: Option<Duration>,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    fn with_target(target: DbTarget) -> Self {
        DbConfig {
            target,
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            run_migrations: true,
        }
    }

    /// Configuration for the MRBS MySQL server.
    pub fn mysql(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        DbConfig::with_target(DbTarget::MySql {
            host: host.into(),
            port,
            database: database.into(),
            username: username.into(),
            password: password.into(),
        })
    }

    /// Configuration for a SQLite file. Created if it doesn't exist.
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        DbConfig::with_target(DbTarget::Sqlite(path.into()))
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let db = Database::new(DbConfig::in_memory()).await?;
    /// // Database is isolated, perfect for tests
    /// ```
    pub fn in_memory() -> Self {
        DbConfig {
            target: DbTarget::Memory,
            max_connections: 1, // Each connection would get its own database
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: None,
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }
}

// =============================================================================
// Database
// =============================================================================

static INSTALL_DRIVERS: Once = Once::new();

/// Main database handle providing repository access.
///
/// Cloning is cheap: clones share the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: AnyPool,
    mysql: bool,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Registers the MySQL and SQLite drivers with the Any driver
    /// 2. Creates the connection pool
    /// 3. Runs migrations (if enabled)
    ///
    /// ## Returns
    /// * `Ok(Database)` - Ready-to-use database handle
    /// * `Err(DbError::ConnectionFailed)` - Server unreachable, bad credentials
    /// * `Err(DbError::MigrationFailed)` - Schema could not be applied
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(target_db = ?config.target, "Initializing database connection");

        INSTALL_DRIVERS.call_once(sqlx::any::install_default_drivers);

        let connect_options = AnyConnectOptions::from_str(&config.target.connect_url())
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!("Connection options configured");

        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.idle_timeout.map(|_| Duration::from_secs(30 * 60)))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database {
            pool,
            mysql: config.target.is_mysql(),
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs database migrations.
    ///
    /// Idempotent: already-applied migrations are skipped.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!(mysql = self.mysql, "Running database migrations");
        migrations::run_migrations(&self.pool, self.mysql).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns (total, applied) migration counts.
    pub async fn migration_status(&self) -> DbResult<(usize, usize)> {
        migrations::migration_status(&self.pool, self.mysql).await
    }

    /// Returns a reference to the connection pool.
    ///
    /// Prefer using repository methods when available.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Returns the user repository.
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone(), self.mysql)
    }

    /// Returns the room repository.
    pub fn rooms(&self) -> RoomRepository {
        RoomRepository::new(self.pool.clone())
    }

    /// Returns the booking repository.
    pub fn bookings(&self) -> BookingRepository {
        BookingRepository::new(self.pool.clone(), self.mysql)
    }

    /// Returns the digicode repository.
    pub fn digicodes(&self) -> DigicodeRepository {
        DigicodeRepository::new(self.pool.clone())
    }

    /// Closes the database connection pool.
    ///
    /// After calling close, all repository operations will fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);

        let (total, applied) = db.migration_status().await.unwrap();
        assert_eq!(total, applied);
        assert!(total > 0);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.run_migrations().await.unwrap();
        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_closed_pool_is_unhealthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.health_check().await);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::sqlite("/tmp/resa.db")
            .max_connections(10)
            .min_connections(2)
            .run_migrations(false);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert!(!config.run_migrations);
        assert!(!config.target.is_mysql());
    }

    #[test]
    fn test_mysql_url_encodes_credentials() {
        let target = DbTarget::MySql {
            host: "db.m2l.local".to_string(),
            port: 3306,
            database: "mrbs".to_string(),
            username: "mrbs".to_string(),
            password: "p@ss/word".to_string(),
        };

        let url = target.connect_url();
        assert!(url.starts_with("mysql://mrbs:"));
        assert!(url.contains("db.m2l.local:3306"));
        assert!(url.contains("/mrbs"));
        assert!(!url.contains("p@ss/word"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = DbConfig::mysql("localhost", 3306, "mrbs", "root", "hunter2");
        let printed = format!("{config:?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("<redacted>"));
    }
}
