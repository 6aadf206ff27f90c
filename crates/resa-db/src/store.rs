//! # Reservation Store
//!
//! The facade the web application talks to. Each method is one short
//! round trip (or a fixed sequence of them) through the repositories.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ReservationStore                                   │
//! │                                                                         │
//! │  authenticate / create_user / reset_password / delete_user             │
//! │       │                        │                                        │
//! │       │   resa_core::password  │  resa_core::validation                 │
//! │       ▼                        ▼                                        │
//! │  UserRepository ─────────────────────────────► mrbs_users              │
//! │                                                                         │
//! │  list_rooms ──────────► RoomRepository ──────► mrbs_room ⋈ mrbs_area   │
//! │                                                                         │
//! │  list_upcoming_bookings / confirm / cancel                             │
//! │       └───────────────► BookingRepository ───► mrbs_entry ⋈ ...        │
//! │                                                                         │
//! │  backfill / check_digicode_*                                           │
//! │       └───────────────► DigicodeRepository ──► mrbs_entry_digicode     │
//! │                                                                         │
//! │  send_new_password ───► Arc<dyn Mailer>                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Time
//! Methods that depend on the current time read the system clock. Each has
//! an `_at` twin taking the instant (Unix seconds) explicitly.

use std::sync::Arc;

use chrono::Utc;
use futures_util::stream::BoxStream;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::{DbError, DbResult};
use crate::mail::{LettreMailer, MailError, Mailer};
use crate::pool::Database;
use crate::repository::booking::BookingRepository;
use crate::repository::digicode::DigicodeRepository;
use crate::repository::room::RoomRepository;
use crate::repository::user::UserRepository;
use resa_core::digicode::generate_digicode;
use resa_core::password::{hash_password, verify_password, Verification};
use resa_core::validation::{validate_new_user, validate_password};
use resa_core::{Booking, Digicode, NewBooking, NewUser, Room, User, UserLevel};

const NEW_PASSWORD_SUBJECT: &str = "Nouveau mot de passe";

/// Errors from store operations that reach beyond the database.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Data-access facade for the reservation application.
///
/// ## Usage
/// ```rust,ignore
/// let store = ReservationStore::connect(StoreConfig::load()?).await?;
///
/// match store.authenticate("alice", "s3cret").await? {
///     UserLevel::None => { /* reject */ }
///     level => { /* open session at `level` */ }
/// }
/// ```
#[derive(Clone)]
pub struct ReservationStore {
    db: Database,
    users: UserRepository,
    rooms: RoomRepository,
    bookings: BookingRepository,
    digicodes: DigicodeRepository,
    mailer: Arc<dyn Mailer>,
    grace_delay_secs: i64,
    mail_sender: String,
}

impl ReservationStore {
    /// Opens the database and the configured mail transport.
    pub async fn connect(config: StoreConfig) -> StoreResult<Self> {
        let mailer = Arc::new(LettreMailer::new(&config.mail)?);
        Self::connect_with_mailer(config, mailer).await
    }

    /// Opens the database, sending mail through `mailer`.
    pub async fn connect_with_mailer(
        config: StoreConfig,
        mailer: Arc<dyn Mailer>,
    ) -> StoreResult<Self> {
        let db = Database::new(config.db).await?;

        info!(
            grace_delay_secs = config.grace_delay_secs,
            "Reservation store ready"
        );

        Ok(Self::new(
            db,
            mailer,
            config.grace_delay_secs,
            config.mail_sender,
        ))
    }

    /// Wraps an already open database.
    pub fn new(
        db: Database,
        mailer: Arc<dyn Mailer>,
        grace_delay_secs: i64,
        mail_sender: impl Into<String>,
    ) -> Self {
        ReservationStore {
            users: db.users(),
            rooms: db.rooms(),
            bookings: db.bookings(),
            digicodes: db.digicodes(),
            db,
            mailer,
            grace_delay_secs,
            mail_sender: mail_sender.into(),
        }
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Grace delay applied to digicode windows, in seconds.
    pub fn grace_delay_secs(&self) -> i64 {
        self.grace_delay_secs
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Checks a login.
    ///
    /// ## Returns
    /// The account's level, or `UserLevel::None` when the name is unknown,
    /// the account is disabled, or the password is wrong.
    ///
    /// A password matching a legacy MD5 hash is accepted and the hash is
    /// rewritten as Argon2id.
    pub async fn authenticate(&self, name: &str, password: &str) -> DbResult<UserLevel> {
        let user = match self.users.get_credentials(name).await? {
            Some(user) => user,
            None => {
                debug!(name = %name, "Login for unknown or disabled account");
                return Ok(UserLevel::None);
            }
        };

        match verify_password(password, &user.password_hash) {
            Verification::Valid => Ok(user.level),
            Verification::ValidLegacy => {
                info!(name = %name, "Upgrading legacy password hash");
                let hash = hash_password(password)?;
                if let Err(e) = self.users.update_password(name, &hash).await {
                    warn!(name = %name, error = %e, "Could not upgrade legacy password hash");
                }
                Ok(user.level)
            }
            Verification::Invalid => {
                debug!(name = %name, "Wrong password");
                Ok(UserLevel::None)
            }
        }
    }

    /// Whether a user with this name exists.
    pub async fn user_exists(&self, name: &str) -> DbResult<bool> {
        self.users.exists(name).await
    }

    /// Gets a user by name.
    pub async fn get_user(&self, name: &str) -> DbResult<Option<User>> {
        self.users.get_by_name(name).await
    }

    /// Registers a user. The password is stored as a salted Argon2id hash.
    ///
    /// ## Errors
    /// * `DbError::Invalid` - a field fails validation
    /// * `DbError::UniqueViolation` - the name is taken
    pub async fn create_user(&self, user: &NewUser) -> DbResult<User> {
        validate_new_user(user)?;

        let hash = hash_password(&user.password)?;
        let created = self
            .users
            .insert(user.level, &user.name, &hash, user.email.trim())
            .await?;

        info!(name = %created.name, level = ?created.level, "User created");
        Ok(created)
    }

    /// Replaces a user's password.
    ///
    /// ## Returns
    /// `true` when the user exists.
    pub async fn reset_password(&self, name: &str, new_password: &str) -> DbResult<bool> {
        validate_password(new_password)?;

        let hash = hash_password(new_password)?;
        self.users.update_password(name, &hash).await
    }

    /// Deletes a user. Their bookings are kept.
    pub async fn delete_user(&self, name: &str) -> DbResult<bool> {
        let deleted = self.users.delete(name).await?;
        if deleted {
            info!(name = %name, "User deleted");
        }
        Ok(deleted)
    }

    /// Mails `new_password` to the user's address.
    ///
    /// ## Returns
    /// * `Ok(true)` - mail handed to the transport
    /// * `Ok(false)` - no such user
    /// * `Err(StoreError::Mail)` - delivery failed
    pub async fn send_new_password(&self, name: &str, new_password: &str) -> StoreResult<bool> {
        let user = match self.users.get_by_name(name).await? {
            Some(user) => user,
            None => return Ok(false),
        };

        let body = format!(
            "Votre mot de passe vient d'être modifié, votre nouveau mot de passe est : {new_password}"
        );

        if let Err(e) = self
            .mailer
            .send(&user.email, NEW_PASSWORD_SUBJECT, &body, &self.mail_sender)
            .await
        {
            warn!(name = %name, error = %e, "New password mail not sent");
            return Err(e.into());
        }

        Ok(true)
    }

    // =========================================================================
    // Rooms
    // =========================================================================

    /// All rooms, ordered by area name then room name.
    pub async fn list_rooms(&self) -> DbResult<Vec<Room>> {
        self.rooms.list().await
    }

    /// Lazy variant of [`list_rooms`](Self::list_rooms).
    pub fn rooms_stream(&self) -> BoxStream<'_, DbResult<Room>> {
        self.rooms.stream()
    }

    // =========================================================================
    // Bookings
    // =========================================================================

    /// The user's bookings that have not started yet, with their digicode,
    /// ordered by start time then room name.
    pub async fn list_upcoming_bookings(&self, user: &str) -> DbResult<Vec<Booking>> {
        self.list_upcoming_bookings_at(user, now()).await
    }

    /// [`list_upcoming_bookings`](Self::list_upcoming_bookings) at `now`.
    pub async fn list_upcoming_bookings_at(&self, user: &str, now: i64) -> DbResult<Vec<Booking>> {
        self.bookings.upcoming(user, now).await
    }

    /// Lazy variant of [`list_upcoming_bookings_at`](Self::list_upcoming_bookings_at).
    pub fn upcoming_bookings_stream<'a>(
        &'a self,
        user: &'a str,
        now: i64,
    ) -> BoxStream<'a, DbResult<Booking>> {
        self.bookings.upcoming_stream(user, now)
    }

    /// Gets a booking with its room name and digicode.
    pub async fn get_booking(&self, id: i64) -> DbResult<Option<Booking>> {
        self.bookings.get_by_id(id).await
    }

    /// Whether a booking with this ID exists.
    pub async fn booking_exists(&self, id: i64) -> DbResult<bool> {
        self.bookings.exists(id).await
    }

    /// Whether `user` created booking `id`.
    pub async fn is_creator(&self, user: &str, id: i64) -> DbResult<bool> {
        self.bookings.is_creator(user, id).await
    }

    /// Sets a booking's status to confirmed.
    pub async fn confirm_booking(&self, id: i64) -> DbResult<bool> {
        self.bookings.confirm(id).await
    }

    /// Deletes a booking and its digicode.
    pub async fn cancel_booking(&self, id: i64) -> DbResult<bool> {
        let cancelled = self.bookings.cancel(id).await?;
        if cancelled {
            info!(id, "Booking cancelled");
        }
        Ok(cancelled)
    }

    /// Whether the user has a booking that has not started yet.
    pub async fn has_future_bookings(&self, user: &str) -> DbResult<bool> {
        self.has_future_bookings_at(user, now()).await
    }

    /// [`has_future_bookings`](Self::has_future_bookings) at `now`.
    pub async fn has_future_bookings_at(&self, user: &str, now: i64) -> DbResult<bool> {
        self.bookings.has_future(user, now).await
    }

    /// Inserts a booking (without digicode) created now.
    pub async fn insert_booking(&self, booking: &NewBooking) -> DbResult<i64> {
        self.bookings.insert(booking, now()).await
    }

    // =========================================================================
    // Digicodes
    // =========================================================================

    /// A fresh random six-character code.
    pub fn generate_digicode() -> Digicode {
        generate_digicode()
    }

    /// Gives every booking lacking a digicode a new one.
    ///
    /// ## Returns
    /// Number of codes inserted.
    pub async fn backfill_missing_digicodes(&self) -> DbResult<u64> {
        self.digicodes.backfill().await
    }

    /// Whether `code` opens room `room_id` now.
    pub async fn check_digicode_for_room(&self, room_id: i64, code: &str) -> DbResult<bool> {
        self.check_digicode_for_room_at(room_id, code, now()).await
    }

    /// [`check_digicode_for_room`](Self::check_digicode_for_room) at `now`.
    ///
    /// A code that is not six hex characters is rejected without a query.
    pub async fn check_digicode_for_room_at(
        &self,
        room_id: i64,
        code: &str,
        now: i64,
    ) -> DbResult<bool> {
        let Ok(code) = Digicode::parse(code) else {
            debug!(room_id, "Malformed digicode rejected");
            return Ok(false);
        };

        self.digicodes
            .check_for_room(room_id, &code, now, self.grace_delay_secs)
            .await
    }

    /// Whether `code` opens the building now.
    pub async fn check_digicode_for_building(&self, code: &str) -> DbResult<bool> {
        self.check_digicode_for_building_at(code, now()).await
    }

    /// [`check_digicode_for_building`](Self::check_digicode_for_building) at `now`.
    pub async fn check_digicode_for_building_at(&self, code: &str, now: i64) -> DbResult<bool> {
        let Ok(code) = Digicode::parse(code) else {
            debug!("Malformed digicode rejected");
            return Ok(false);
        };

        self.digicodes
            .check_for_building(&code, now, self.grace_delay_secs)
            .await
    }
}

fn now() -> i64 {
    Utc::now().timestamp()
}

// =============================================================================
// Unit Tests
// =============================================================================
