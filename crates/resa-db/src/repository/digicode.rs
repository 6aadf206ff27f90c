//! # Digicode Repository
//!
//! Door codes in `mrbs_entry_digicode`, keyed by the entry ID.
//!
//! ## Backfill
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Missing Codes Are Filled                         │
//! │                                                                         │
//! │  1. SELECT entry IDs with no digicode row      (read fully first)      │
//! │  2. Generate one random code per ID                                    │
//! │  3. INSERT each (id, code)                                             │
//! │       ├── ok              → counted                                    │
//! │       └── duplicate id    → another backfill got there first, skipped  │
//! │                                                                         │
//! │  Not transactional. Re-running only touches rows still missing.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Validity Window
//! A code opens the door when `start - grace <= now <= end + grace`.
//! The comparison is rewritten as `start <= now + grace AND end >= now - grace`
//! so the indexes on `start_time` and `end_time` stay usable.

use rand::Rng;
use sqlx::AnyPool;
use tracing::{debug, info};

use crate::error::DbResult;
use resa_core::digicode::{generate_digicode, generate_digicode_with};
use resa_core::Digicode;

/// Repository for booking door codes.
#[derive(Debug, Clone)]
pub struct DigicodeRepository {
    pool: AnyPool,
}

impl DigicodeRepository {
    /// Creates a new DigicodeRepository.
    pub fn new(pool: AnyPool) -> Self {
        DigicodeRepository { pool }
    }

    /// IDs of entries that have no digicode yet, ascending.
    pub async fn missing_ids(&self) -> DbResult<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM mrbs_entry
            WHERE id NOT IN (SELECT id FROM mrbs_entry_digicode)
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Stores the code for entry `id`.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - the entry already has a code
    pub async fn insert(&self, id: i64, code: &Digicode) -> DbResult<()> {
        sqlx::query("INSERT INTO mrbs_entry_digicode (id, digicode) VALUES (?, ?)")
            .bind(id)
            .bind(code.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// The code of entry `id`, if it has one.
    pub async fn get_for_booking(&self, id: i64) -> DbResult<Option<Digicode>> {
        let code: Option<String> =
            sqlx::query_scalar("SELECT digicode FROM mrbs_entry_digicode WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(code.map(|c| Digicode::parse(&c)).transpose()?)
    }

    /// Gives every entry lacking a code a freshly generated one.
    ///
    /// ## Returns
    /// Number of codes inserted. Zero when nothing was missing.
    pub async fn backfill(&self) -> DbResult<u64> {
        let ids = self.missing_ids().await?;
        let codes: Vec<Digicode> = ids.iter().map(|_| generate_digicode()).collect();
        self.insert_all(ids, codes).await
    }

    /// [`backfill`](Self::backfill) with a caller-supplied RNG.
    pub async fn backfill_with<R: Rng + ?Sized>(&self, rng: &mut R) -> DbResult<u64> {
        let ids = self.missing_ids().await?;
        let codes: Vec<Digicode> = ids.iter().map(|_| generate_digicode_with(rng)).collect();
        self.insert_all(ids, codes).await
    }

    async fn insert_all(&self, ids: Vec<i64>, codes: Vec<Digicode>) -> DbResult<u64> {
        let mut inserted = 0;

        for (id, code) in ids.into_iter().zip(codes) {
            match self.insert(id, &code).await {
                Ok(()) => inserted += 1,
                Err(e) if e.is_unique_violation() => {
                    debug!(id, "Digicode already present, skipping");
                }
                Err(e) => return Err(e),
            }
        }

        if inserted > 0 {
            info!(inserted, "Backfilled missing digicodes");
        }
        Ok(inserted)
    }

    /// Whether `code` opens room `room_id` at `now`.
    pub async fn check_for_room(
        &self,
        room_id: i64,
        code: &Digicode,
        now: i64,
        grace_secs: i64,
    ) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM mrbs_entry e
            INNER JOIN mrbs_entry_digicode d ON d.id = e.id
            WHERE e.room_id = ?
              AND d.digicode = ?
              AND e.start_time <= ?
              AND e.end_time >= ?
            "#,
        )
        .bind(room_id)
        .bind(code.as_str())
        .bind(now.saturating_add(grace_secs))
        .bind(now.saturating_sub(grace_secs))
        .fetch_one(&self.pool)
        .await?;

        debug!(room_id, now, matched = count > 0, "Checked room digicode");
        Ok(count > 0)
    }

    /// Whether `code` opens the building (any room) at `now`.
    pub async fn check_for_building(
        &self,
        code: &Digicode,
        now: i64,
        grace_secs: i64,
    ) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM mrbs_entry e
            INNER JOIN mrbs_entry_digicode d ON d.id = e.id
            WHERE d.digicode = ?
              AND e.start_time <= ?
              AND e.end_time >= ?
            "#,
        )
        .bind(code.as_str())
        .bind(now.saturating_add(grace_secs))
        .bind(now.saturating_sub(grace_secs))
        .fetch_one(&self.pool)
        .await?;

        debug!(now, matched = count > 0, "Checked building digicode");
        Ok(count > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::pool::{Database, DbConfig};
    use resa_core::{Digicode, NewBooking};

    const T: i64 = 1_700_000_000;
    const GRACE: i64 = 3600;

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for sql in [
            "INSERT INTO mrbs_area (id, area_name) VALUES (1, 'Nord')",
            "INSERT INTO mrbs_room (id, area_id, room_name, capacity) VALUES (1, 1, 'A101', 20)",
            "INSERT INTO mrbs_room (id, area_id, room_name, capacity) VALUES (2, 1, 'B200', 10)",
        ] {
            sqlx::query(sql).execute(db.pool()).await.unwrap();
        }
        db
    }

    async fn entry(db: &Database, room: i64, start: i64, end: i64) -> i64 {
        db.bookings()
            .insert(&NewBooking::new(room, start, end, "alice"), T)
            .await
            .unwrap()
    }

    fn code(s: &str) -> Digicode {
        Digicode::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_backfill_fills_only_missing() {
        let db = setup().await;
        let repo = db.digicodes();

        let a = entry(&db, 1, T, T + 60).await;
        let b = entry(&db, 1, T + 100, T + 160).await;
        let c = entry(&db, 2, T + 200, T + 260).await;
        repo.insert(b, &code("BBBBBB")).await.unwrap();

        assert_eq!(repo.missing_ids().await.unwrap(), vec![a, c]);

        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(repo.backfill_with(&mut rng).await.unwrap(), 2);
        assert!(repo.missing_ids().await.unwrap().is_empty());

        // The pre-existing code is untouched
        assert_eq!(repo.get_for_booking(b).await.unwrap().unwrap(), code("BBBBBB"));
    }

    #[tokio::test]
    async fn test_backfill_is_idempotent() {
        let db = setup().await;
        let repo = db.digicodes();

        let a = entry(&db, 1, T, T + 60).await;
        assert_eq!(repo.backfill().await.unwrap(), 1);
        let first = repo.get_for_booking(a).await.unwrap().unwrap();

        assert_eq!(repo.backfill().await.unwrap(), 0);
        assert_eq!(repo.get_for_booking(a).await.unwrap().unwrap(), first);
    }

    #[tokio::test]
    async fn test_backfill_skips_rows_filled_meanwhile() {
        let db = setup().await;
        let repo = db.digicodes();

        let a = entry(&db, 1, T, T + 60).await;
        let b = entry(&db, 1, T + 100, T + 160).await;
        repo.insert(a, &code("AAAAAA")).await.unwrap();

        // Simulates a concurrent backfill that already claimed `a`
        let inserted = repo
            .insert_all(vec![a, b], vec![code("111111"), code("222222")])
            .await
            .unwrap();

        assert_eq!(inserted, 1);
        assert_eq!(repo.get_for_booking(a).await.unwrap().unwrap(), code("AAAAAA"));
        assert_eq!(repo.get_for_booking(b).await.unwrap().unwrap(), code("222222"));
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_unique_violation() {
        let db = setup().await;
        let repo = db.digicodes();
        let a = entry(&db, 1, T, T + 60).await;

        repo.insert(a, &code("AAAAAA")).await.unwrap();
        let err = repo.insert(a, &code("BBBBBB")).await.unwrap_err();
        assert!(err.is_unique_violation(), "got {err:?}");
    }

    #[tokio::test]
    async fn test_room_window_bounds() {
        let db = setup().await;
        let repo = db.digicodes();
        let id = entry(&db, 1, T, T + 3600).await;
        let ab = code("AB12CD");
        repo.insert(id, &ab).await.unwrap();

        for now in [T - GRACE, T, T + 1800, T + 3600, T + 3600 + GRACE] {
            assert!(repo.check_for_room(1, &ab, now, GRACE).await.unwrap(), "now={now}");
        }
        for now in [T - GRACE - 1, T + 3600 + GRACE + 1] {
            assert!(!repo.check_for_room(1, &ab, now, GRACE).await.unwrap(), "now={now}");
        }

        assert!(!repo.check_for_room(2, &ab, T, GRACE).await.unwrap());
        assert!(!repo.check_for_room(1, &code("AB12CE"), T, GRACE).await.unwrap());
    }

    #[tokio::test]
    async fn test_building_accepts_any_room() {
        let db = setup().await;
        let repo = db.digicodes();
        let id = entry(&db, 2, T, T + 3600).await;
        let c = code("0F0F0F");
        repo.insert(id, &c).await.unwrap();

        assert!(repo.check_for_building(&c, T - GRACE, GRACE).await.unwrap());
        assert!(!repo.check_for_building(&c, T - GRACE - 1, GRACE).await.unwrap());
        assert!(!repo.check_for_room(1, &c, T, GRACE).await.unwrap());
    }

    #[tokio::test]
    async fn test_zero_grace() {
        let db = setup().await;
        let repo = db.digicodes();
        let id = entry(&db, 1, T, T + 60).await;
        let c = code("ABCDEF");
        repo.insert(id, &c).await.unwrap();

        assert!(repo.check_for_room(1, &c, T, 0).await.unwrap());
        assert!(repo.check_for_room(1, &c, T + 60, 0).await.unwrap());
        assert!(!repo.check_for_room(1, &c, T - 1, 0).await.unwrap());
    }

    #[tokio::test]
    async fn test_extreme_grace_and_time_saturate() {
        let db = setup().await;
        let repo = db.digicodes();
        let id = entry(&db, 1, T, T + 60).await;
        let c = code("ABCDEF");
        repo.insert(id, &c).await.unwrap();

        assert!(repo.check_for_room(1, &c, T, i64::MAX).await.unwrap());
        assert!(repo.check_for_building(&c, 0, i64::MAX).await.unwrap());
        assert!(!repo.check_for_room(1, &c, i64::MAX, GRACE).await.unwrap());
        assert!(!repo.check_for_building(&c, i64::MIN, GRACE).await.unwrap());
    }
}
