//! # User Repository
//!
//! Database operations for `mrbs_users`.
//!
//! Passwords arrive here already hashed; hashing and verification live in
//! `resa_core::password` and are driven by the store.

use sqlx::AnyPool;
use tracing::debug;

use super::insert_returning_id;
use crate::error::DbResult;
use resa_core::{User, UserLevel};

const USER_COLUMNS: &str = "id, level, name, password, email";

/// Repository for user accounts.
///
/// ## Usage
/// ```rust,ignore
/// let repo = UserRepository::new(pool, false);
///
/// if repo.exists("alice").await? {
///     let user = repo.get_by_name("alice").await?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: AnyPool,
    mysql: bool,
}

impl UserRepository {
    /// Creates a new UserRepository. `mysql` selects the SQL dialect.
    pub fn new(pool: AnyPool, mysql: bool) -> Self {
        UserRepository { pool, mysql }
    }

    /// Whether a user with this login name exists.
    pub async fn exists(&self, name: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM mrbs_users WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Gets a user by login name.
    ///
    /// ## Returns
    /// * `Ok(Some(User))` - User found
    /// * `Ok(None)` - No such user
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM mrbs_users WHERE name = ?");

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Gets the account a login attempt is checked against.
    ///
    /// Accounts at level 0 are disabled and never returned.
    pub async fn get_credentials(&self, name: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM mrbs_users WHERE name = ? AND level > 0");

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Inserts a user and returns the stored row.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - the name is taken
    pub async fn insert(
        &self,
        level: UserLevel,
        name: &str,
        password_hash: &str,
        email: &str,
    ) -> DbResult<User> {
        debug!(name = %name, level = ?level, "Inserting user");

        let insert = sqlx::query(
            "INSERT INTO mrbs_users (level, name, password, email) VALUES (?, ?, ?, ?)",
        )
        .bind(level.code())
        .bind(name)
        .bind(password_hash)
        .bind(email);

        let id = insert_returning_id(&self.pool, self.mysql, insert).await?;

        Ok(User {
            id,
            level,
            name: name.to_string(),
            password_hash: password_hash.to_string(),
            email: email.to_string(),
        })
    }

    /// Replaces the stored password hash.
    ///
    /// ## Returns
    /// `true` when a row was updated.
    pub async fn update_password(&self, name: &str, password_hash: &str) -> DbResult<bool> {
        debug!(name = %name, "Updating password hash");

        let result = sqlx::query("UPDATE mrbs_users SET password = ? WHERE name = ?")
            .bind(password_hash)
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a user. Their bookings are left in place.
    pub async fn delete(&self, name: &str) -> DbResult<bool> {
        debug!(name = %name, "Deleting user");

        let result = sqlx::query("DELETE FROM mrbs_users WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use resa_core::UserLevel;

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();

        let alice = users
            .insert(UserLevel::User, "alice", "hash", "alice@m2l.fr")
            .await
            .unwrap();
        assert!(alice.id > 0);

        let bob = users
            .insert(UserLevel::Admin, "bob", "hash", "bob@m2l.fr")
            .await
            .unwrap();
        assert!(bob.id > alice.id);

        let found = users.get_by_name("alice").await.unwrap().unwrap();
        assert_eq!(found, alice);
        assert!(users.exists("alice").await.unwrap());
        assert!(!users.exists("carol").await.unwrap());
        assert!(users.get_by_name("carol").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_is_unique_violation() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();

        users
            .insert(UserLevel::User, "alice", "h1", "a@m2l.fr")
            .await
            .unwrap();
        let err = users
            .insert(UserLevel::Admin, "alice", "h2", "b@m2l.fr")
            .await
            .unwrap_err();

        assert!(err.is_unique_violation(), "got {err:?}");
    }

    #[tokio::test]
    async fn test_disabled_account_has_no_credentials() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();

        users
            .insert(UserLevel::None, "ghost", "h", "g@m2l.fr")
            .await
            .unwrap();

        assert!(users.get_by_name("ghost").await.unwrap().is_some());
        assert!(users.get_credentials("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();

        users
            .insert(UserLevel::User, "alice", "old", "a@m2l.fr")
            .await
            .unwrap();

        assert!(users.update_password("alice", "new").await.unwrap());
        assert!(!users.update_password("nobody", "new").await.unwrap());
        let alice = users.get_by_name("alice").await.unwrap().unwrap();
        assert_eq!(alice.password_hash, "new");

        assert!(users.delete("alice").await.unwrap());
        assert!(!users.delete("alice").await.unwrap());
        assert!(!users.exists("alice").await.unwrap());
    }
}
