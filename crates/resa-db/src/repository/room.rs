//! # Room Repository
//!
//! Read-only access to `mrbs_room`, joined with `mrbs_area`.
//! Rooms are managed by the MRBS admin pages, never by this crate.

use futures_util::stream::{BoxStream, StreamExt, TryStreamExt};
use sqlx::AnyPool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use resa_core::Room;

const LIST_ROOMS: &str = r#"
    SELECT r.id, r.room_name, r.capacity, a.area_name
    FROM mrbs_room r
    INNER JOIN mrbs_area a ON a.id = r.area_id
    ORDER BY a.area_name, r.room_name
"#;

/// Repository for rooms.
#[derive(Debug, Clone)]
pub struct RoomRepository {
    pool: AnyPool,
}

impl RoomRepository {
    /// Creates a new RoomRepository.
    pub fn new(pool: AnyPool) -> Self {
        RoomRepository { pool }
    }

    /// Lists every room, ordered by area name then room name.
    ///
    /// Rooms whose area is missing are left out by the inner join.
    pub async fn list(&self) -> DbResult<Vec<Room>> {
        let rooms = sqlx::query_as::<_, Room>(LIST_ROOMS)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rooms.len(), "Listed rooms");
        Ok(rooms)
    }

    /// Same rows as [`list`](Self::list), mapped one at a time as they
    /// arrive. The stream holds a pooled connection until dropped.
    pub fn stream(&self) -> BoxStream<'_, DbResult<Room>> {
        sqlx::query_as::<_, Room>(LIST_ROOMS)
            .fetch(&self.pool)
            .map_err(DbError::from)
            .boxed()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use futures_util::TryStreamExt;

    use crate::pool::{Database, DbConfig};

    async fn seed(db: &Database) {
        for sql in [
            "INSERT INTO mrbs_area (id, area_name) VALUES (1, 'Nord')",
            "INSERT INTO mrbs_area (id, area_name) VALUES (2, 'Est')",
            "INSERT INTO mrbs_room (area_id, room_name, capacity) VALUES (1, 'B2', 12)",
            "INSERT INTO mrbs_room (area_id, room_name, capacity) VALUES (1, 'A1', 30)",
            "INSERT INTO mrbs_room (area_id, room_name, capacity) VALUES (2, 'Z9', 4)",
            "INSERT INTO mrbs_room (area_id, room_name, capacity) VALUES (99, 'Orphan', 1)",
        ] {
            sqlx::query(sql).execute(db.pool()).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_list_orders_by_area_then_room() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed(&db).await;

        let rooms = db.rooms().list().await.unwrap();
        let names: Vec<_> = rooms
            .iter()
            .map(|r| (r.area_name.as_str(), r.name.as_str()))
            .collect();

        assert_eq!(names, vec![("Est", "Z9"), ("Nord", "A1"), ("Nord", "B2")]);
        assert_eq!(rooms[1].capacity, 30);
    }

    #[tokio::test]
    async fn test_stream_matches_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed(&db).await;

        let repo = db.rooms();
        let streamed: Vec<_> = repo.stream().try_collect().await.unwrap();
        assert_eq!(streamed, repo.list().await.unwrap());
    }

    #[tokio::test]
    async fn test_empty() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.rooms().list().await.unwrap().is_empty());
    }
}
