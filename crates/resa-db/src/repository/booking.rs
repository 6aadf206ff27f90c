//! # Booking Repository
//!
//! Database operations for `mrbs_entry`.
//!
//! ## Read Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How a Booking Row Is Assembled                       │
//! │                                                                         │
//! │  mrbs_entry e                                                          │
//! │    │ INNER JOIN mrbs_room r           ON r.id = e.room_id              │
//! │    │ INNER JOIN mrbs_entry_digicode d ON d.id = e.id                   │
//! │    ▼                                                                    │
//! │  Booking { id, timestamp, start/end, room_id, room_name,               │
//! │            status, create_by, digicode }                               │
//! │                                                                         │
//! │  An entry without a digicode row is invisible to every read until      │
//! │  the backfill gives it one.                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status
//! `confirm` sets status 0. `cancel` deletes the entry and its digicode
//! in one transaction; there is no "cancelled" status.
//!
//! ## Creation Timestamp
//! MRBS declares `mrbs_entry.timestamp` as a MySQL `TIMESTAMP`. On MySQL it
//! is converted with `UNIX_TIMESTAMP` / `FROM_UNIXTIME`; SQLite stores the
//! Unix seconds directly.

use futures_util::stream::{BoxStream, StreamExt, TryStreamExt};
use sqlx::AnyPool;
use tracing::debug;

use super::insert_returning_id;
use crate::error::{DbError, DbResult};
use resa_core::{Booking, BookingStatus, NewBooking};

/// Expands to the booking SELECT, reading the creation time through
/// `$timestamp`, followed by `$tail`.
macro_rules! booking_select {
    ($timestamp:literal, $tail:literal) => {
        concat!(
            r#"
            SELECT
                e.id,
                "#,
            $timestamp,
            r#" AS timestamp,
                e.start_time,
                e.end_time,
                e.room_id,
                r.room_name,
                e.status,
                e.create_by,
                d.digicode
            FROM mrbs_entry e
            INNER JOIN mrbs_room r ON r.id = e.room_id
            INNER JOIN mrbs_entry_digicode d ON d.id = e.id
            "#,
            $tail
        )
    };
}

macro_rules! booking_statements {
    ($timestamp:literal, $insert_timestamp:literal) => {
        Statements {
            upcoming: booking_select!(
                $timestamp,
                "WHERE e.create_by = ? AND e.start_time > ? ORDER BY e.start_time, r.room_name"
            ),
            by_id: booking_select!($timestamp, "WHERE e.id = ?"),
            insert: concat!(
                "INSERT INTO mrbs_entry (timestamp, start_time, end_time, room_id, status, create_by) VALUES (",
                $insert_timestamp,
                ", ?, ?, ?, ?, ?)"
            ),
        }
    };
}

/// SQL that differs between dialects.
#[derive(Debug)]
struct Statements {
    upcoming: &'static str,
    by_id: &'static str,
    insert: &'static str,
}

static SQLITE: Statements = booking_statements!("e.timestamp", "?");

static MYSQL: Statements = booking_statements!("UNIX_TIMESTAMP(e.timestamp)", "FROM_UNIXTIME(?)");

/// Repository for bookings.
///
/// ## Usage
/// ```rust,ignore
/// let repo = BookingRepository::new(pool, false);
///
/// let mine = repo.upcoming("alice", Utc::now().timestamp()).await?;
/// repo.confirm(mine[0].id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: AnyPool,
    mysql: bool,
    sql: &'static Statements,
}

impl BookingRepository {
    /// Creates a new BookingRepository. `mysql` selects the SQL dialect.
    pub fn new(pool: AnyPool, mysql: bool) -> Self {
        BookingRepository {
            pool,
            mysql,
            sql: if mysql { &MYSQL } else { &SQLITE },
        }
    }

    /// Bookings created by `user` that start strictly after `now`,
    /// ordered by start time then room name.
    pub async fn upcoming(&self, user: &str, now: i64) -> DbResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(self.sql.upcoming)
            .bind(user)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;

        debug!(user = %user, count = bookings.len(), "Listed upcoming bookings");
        Ok(bookings)
    }

    /// Lazy variant of [`upcoming`](Self::upcoming). Rows are mapped as
    /// they are read; the stream holds a pooled connection until dropped.
    pub fn upcoming_stream<'a>(
        &'a self,
        user: &'a str,
        now: i64,
    ) -> BoxStream<'a, DbResult<Booking>> {
        sqlx::query_as::<_, Booking>(self.sql.upcoming)
            .bind(user)
            .bind(now)
            .fetch(&self.pool)
            .map_err(DbError::from)
            .boxed()
    }

    /// Gets a booking by ID, joined with its room and digicode.
    ///
    /// ## Returns
    /// * `Ok(Some(Booking))` - Booking found and has a digicode
    /// * `Ok(None)` - No such booking, or no digicode yet
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(self.sql.by_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    /// Whether an entry with this ID exists (with or without digicode).
    pub async fn exists(&self, id: i64) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM mrbs_entry WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Whether `user` created booking `id`.
    pub async fn is_creator(&self, user: &str, id: i64) -> DbResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM mrbs_entry WHERE id = ? AND create_by = ?")
                .bind(id)
                .bind(user)
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Whether `user` has a booking starting strictly after `now`.
    pub async fn has_future(&self, user: &str, now: i64) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM mrbs_entry WHERE create_by = ? AND start_time > ?",
        )
        .bind(user)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Number of entries, with or without digicode.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM mrbs_entry")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Inserts an entry without a digicode and returns its ID.
    ///
    /// `now` becomes the creation timestamp.
    pub async fn insert(&self, booking: &NewBooking, now: i64) -> DbResult<i64> {
        debug!(
            room_id = booking.room_id,
            start_time = booking.start_time,
            create_by = %booking.create_by,
            "Inserting booking"
        );

        let insert = sqlx::query(self.sql.insert)
            .bind(now)
            .bind(booking.start_time)
            .bind(booking.end_time)
            .bind(booking.room_id)
            .bind(booking.status.code())
            .bind(booking.create_by.as_str());

        let id = insert_returning_id(&self.pool, self.mysql, insert).await?;

        debug!(id, "Booking inserted");
        Ok(id)
    }

    /// Marks a booking as confirmed.
    ///
    /// ## Returns
    /// `true` when the entry exists. Confirming twice is harmless.
    pub async fn confirm(&self, id: i64) -> DbResult<bool> {
        debug!(id, "Confirming booking");

        let result = sqlx::query("UPDATE mrbs_entry SET status = ? WHERE id = ?")
            .bind(BookingStatus::Confirmed.code())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a booking and its digicode.
    ///
    /// ## Returns
    /// `true` when the entry existed.
    pub async fn cancel(&self, id: i64) -> DbResult<bool> {
        debug!(id, "Cancelling booking");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query("DELETE FROM mrbs_entry_digicode WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM mrbs_entry WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    const T: i64 = 1_700_000_000;

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for sql in [
            "INSERT INTO mrbs_area (id, area_name) VALUES (1, 'Nord')",
            "INSERT INTO mrbs_room (id, area_id, room_name, capacity) VALUES (1, 1, 'B200', 10)",
            "INSERT INTO mrbs_room (id, area_id, room_name, capacity) VALUES (2, 1, 'A101', 20)",
        ] {
            sqlx::query(sql).execute(db.pool()).await.unwrap();
        }
        db
    }

    async fn book(db: &Database, room: i64, start: i64, user: &str, code: &str) -> i64 {
        let id = db
            .bookings()
            .insert(&NewBooking::new(room, start, start + 3600, user), T - 86_400)
            .await
            .unwrap();
        sqlx::query("INSERT INTO mrbs_entry_digicode (id, digicode) VALUES (?, ?)")
            .bind(id)
            .bind(code)
            .execute(db.pool())
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn test_insert_returns_new_ids() {
        let db = setup().await;
        let repo = db.bookings();

        let first = repo
            .insert(&NewBooking::new(1, 100, 200, "alice"), T)
            .await
            .unwrap();
        let second = repo
            .insert(&NewBooking::new(2, 300, 400, "bob"), T)
            .await
            .unwrap();

        assert!(first > 0);
        assert!(second > first);
        assert_eq!(repo.count().await.unwrap(), 2);
        assert!(repo.exists(first).await.unwrap());
        assert!(repo.is_creator("bob", second).await.unwrap());
    }

    #[test]
    fn test_mysql_statements_convert_timestamp() {
        assert!(MYSQL.by_id.contains("UNIX_TIMESTAMP(e.timestamp) AS timestamp"));
        assert!(MYSQL.upcoming.contains("UNIX_TIMESTAMP(e.timestamp) AS timestamp"));
        assert!(MYSQL.insert.contains("VALUES (FROM_UNIXTIME(?), ?, ?, ?, ?, ?)"));

        assert!(SQLITE.by_id.contains("e.timestamp AS timestamp"));
        assert!(SQLITE.insert.contains("VALUES (?, ?, ?, ?, ?, ?)"));
        assert!(SQLITE.upcoming.ends_with("ORDER BY e.start_time, r.room_name"));
    }

    #[tokio::test]
    async fn test_upcoming_filters_and_orders() {
        let db = setup().await;
        let repo = db.bookings();

        let past = book(&db, 1, T - 10, "alice", "000001").await;
        let at_now = book(&db, 1, T, "alice", "000002").await;
        let later_b = book(&db, 1, T + 500, "alice", "000003").await;
        let later_a = book(&db, 2, T + 500, "alice", "000004").await;
        let first = book(&db, 1, T + 100, "alice", "000005").await;
        book(&db, 1, T + 100, "bob", "000006").await;

        let ids: Vec<_> = repo
            .upcoming("alice", T)
            .await
            .unwrap()
            .iter()
            .map(|b| b.id)
            .collect();

        assert_eq!(ids, vec![first, later_a, later_b]);
        assert!(!ids.contains(&past));
        assert!(!ids.contains(&at_now));
    }

    #[tokio::test]
    async fn test_upcoming_skips_entries_without_digicode() {
        let db = setup().await;
        let repo = db.bookings();

        repo.insert(&NewBooking::new(1, T + 60, T + 120, "alice"), T)
            .await
            .unwrap();

        assert!(repo.upcoming("alice", T).await.unwrap().is_empty());
        assert!(repo.has_future("alice", T).await.unwrap());
    }

    #[tokio::test]
    async fn test_upcoming_stream_matches_vec() {
        let db = setup().await;
        let repo = db.bookings();

        book(&db, 1, T + 100, "alice", "AAAAAA").await;
        book(&db, 2, T + 200, "alice", "BBBBBB").await;

        let streamed: Vec<_> = repo
            .upcoming_stream("alice", T)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(streamed, repo.upcoming("alice", T).await.unwrap());
        assert_eq!(streamed.len(), 2);
    }

    #[tokio::test]
    async fn test_get_by_id_joins_room_and_digicode() {
        let db = setup().await;
        let repo = db.bookings();
        let id = book(&db, 2, T, "alice", "AB12CD").await;

        let booking = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(booking.room_name, "A101");
        assert_eq!(booking.digicode.as_str(), "AB12CD");
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.timestamp, T - 86_400);

        assert!(repo.get_by_id(id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_exists_and_is_creator() {
        let db = setup().await;
        let repo = db.bookings();
        let id = book(&db, 1, T, "alice", "ABCDEF").await;

        assert!(repo.exists(id).await.unwrap());
        assert!(!repo.exists(id + 1).await.unwrap());
        assert!(repo.is_creator("alice", id).await.unwrap());
        assert!(!repo.is_creator("bob", id).await.unwrap());
    }

    #[tokio::test]
    async fn test_has_future_is_strict() {
        let db = setup().await;
        let repo = db.bookings();
        book(&db, 1, T, "alice", "ABCDEF").await;

        assert!(repo.has_future("alice", T - 1).await.unwrap());
        assert!(!repo.has_future("alice", T).await.unwrap());
        assert!(!repo.has_future("bob", T - 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_confirm() {
        let db = setup().await;
        let repo = db.bookings();
        let id = book(&db, 1, T, "alice", "ABCDEF").await;

        assert!(repo.confirm(id).await.unwrap());
        assert!(repo.confirm(id).await.unwrap());
        assert!(!repo.confirm(id + 1).await.unwrap());

        let booking = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_cancel_removes_entry_and_digicode() {
        let db = setup().await;
        let repo = db.bookings();
        let id = book(&db, 1, T, "alice", "ABCDEF").await;

        assert!(repo.cancel(id).await.unwrap());
        assert!(!repo.exists(id).await.unwrap());

        let codes: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM mrbs_entry_digicode WHERE id = ?")
                .bind(id)
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(codes, 0);

        assert!(!repo.cancel(id).await.unwrap());
    }
}
