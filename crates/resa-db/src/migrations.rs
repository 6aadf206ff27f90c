//! # Database Migrations
//!
//! Embedded SQL migrations for the MRBS tables this crate reads and writes.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Database::new()                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Pick dialect: migrations/mysql or migrations/sqlite                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Compare embedded migrations vs _sqlx_migrations                       │
//! │       │                                                                 │
//! │       ├── 001_mrbs_schema.sql           ✓ (already applied)             │
//! │       └── 002_widen_user_password.sql   ⬜ (MySQL only, needs to run)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Run pending migrations in order, record in _sqlx_migrations           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Schema changes go in BOTH `migrations/mysql/` and `migrations/sqlite/`;
//!    fixes for one dialect only (column widths, MySQL types) go in that
//!    directory alone. Each directory is numbered on its own.
//! 2. Name format: `NNN_description.sql`
//! 3. Use `IF NOT EXISTS`: production MRBS servers already have the tables
//! 4. **NEVER** modify applied migrations - always add new ones

use sqlx::migrate::Migrator;
use sqlx::AnyPool;
use tracing::info;

use crate::error::DbResult;

/// Migrations for the MySQL dialect (production MRBS server).
static MYSQL_MIGRATOR: Migrator = sqlx::migrate!("../../migrations/mysql");

/// Migrations for the SQLite dialect (development and tests).
static SQLITE_MIGRATOR: Migrator = sqlx::migrate!("../../migrations/sqlite");

fn migrator(mysql: bool) -> &'static Migrator {
    if mysql {
        &MYSQL_MIGRATOR
    } else {
        &SQLITE_MIGRATOR
    }
}

/// Runs all pending database migrations.
///
/// ## Safety
/// - Idempotent: safe to run multiple times
/// - Ordered: migrations run in filename order (001, 002, ...)
pub async fn run_migrations(pool: &AnyPool, mysql: bool) -> DbResult<()> {
    info!("Checking for pending migrations");

    migrator(mysql).run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns information about migrations.
///
/// ## Returns
/// Tuple of (total_migrations, applied_migrations). Applied is zero when
/// migrations never ran; any other query failure is an error.
pub async fn migration_status(pool: &AnyPool, mysql: bool) -> DbResult<(usize, usize)> {
    let total = migrator(mysql).migrations.len();

    let table_check = if mysql {
        "SELECT COUNT(*) FROM information_schema.tables \
         WHERE table_schema = DATABASE() AND table_name = '_sqlx_migrations'"
    } else {
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'"
    };
    let tables: i64 = sqlx::query_scalar(table_check).fetch_one(pool).await?;
    if tables == 0 {
        return Ok((total, 0));
    }

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    Ok((total, applied as usize))
}

// =============================================================================
// Unit Tests
// =============================================================================
