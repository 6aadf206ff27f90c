//! # Repository Module
//!
//! One repository per MRBS table group.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  ReservationStore                                                      │
//! │       │                                                                 │
//! │       │  db.bookings().upcoming("alice", now)                          │
//! │       ▼                                                                 │
//! │  BookingRepository                                                     │
//! │  ├── upcoming(&self, user, now)                                        │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── confirm(&self, id)                                                │
//! │  └── cancel(&self, id)                                                 │
//! │       │                                                                 │
//! │       │  SQL (shared MySQL / SQLite subset)                            │
//! │       ▼                                                                 │
//! │  mrbs_entry ⋈ mrbs_room ⋈ mrbs_entry_digicode                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`](user::UserRepository) - `mrbs_users` accounts and credentials
//! - [`RoomRepository`](room::RoomRepository) - rooms joined with their area
//! - [`BookingRepository`](booking::BookingRepository) - `mrbs_entry` reads and status changes
//! - [`DigicodeRepository`](digicode::DigicodeRepository) - door codes, backfill and checks

pub mod booking;
pub mod digicode;
pub mod room;
pub mod user;

use sqlx::any::AnyArguments;
use sqlx::query::Query;
use sqlx::{Any, AnyPool};

use crate::error::{DbError, DbResult};

/// Runs `insert` and reads back the key it generated.
///
/// The `Any` driver does not report SQLite rowids, so the key is read with
/// the dialect's own function on the same connection. Both statements share
/// a transaction: when the key can't be read, the row is rolled back.
pub(crate) async fn insert_returning_id<'q>(
    pool: &AnyPool,
    mysql: bool,
    insert: Query<'q, Any, AnyArguments<'q>>,
) -> DbResult<i64> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

    insert.execute(&mut *tx).await?;

    let last_id = if mysql {
        "SELECT CAST(LAST_INSERT_ID() AS SIGNED)"
    } else {
        "SELECT last_insert_rowid()"
    };
    let id: i64 = sqlx::query_scalar(last_id).fetch_one(&mut *tx).await?;

    tx.commit()
        .await
        .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

    Ok(id)
}
