//! # Domain Types
//!
//! Core domain types of the reservation store.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │      Room       │   │    Booking      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  level          │   │  name           │   │  start / end    │       │
//! │  │  name (unique)  │   │  capacity       │   │  room_id (FK)   │       │
//! │  │  password_hash  │   │  area_name      │   │  create_by ─────┼──► User.name
//! │  │  email          │   └─────────────────┘   │  digicode (1:1) │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │   UserLevel     │   │  BookingStatus  │                             │
//! │  │  None  = 0      │   │  Confirmed = 0  │                             │
//! │  │  User  = 1      │   │  Pending   = 1  │                             │
//! │  │  Admin = 2      │   └─────────────────┘                             │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Times
//! MRBS stores every instant as Unix seconds. The structs keep the raw
//! integers (they are the wire format) and expose `chrono` accessors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::digicode::Digicode;
use crate::error::CoreError;

// =============================================================================
// User Level
// =============================================================================

/// Privilege tier of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UserLevel {
    /// Unknown user, wrong password, or disabled account.
    None,
    /// Regular user: may book rooms and manage their own bookings.
    User,
    /// Administrator.
    Admin,
}

impl UserLevel {
    /// Returns the integer stored in `mrbs_users.level`.
    pub const fn code(self) -> i64 {
        match self {
            UserLevel::None => 0,
            UserLevel::User => 1,
            UserLevel::Admin => 2,
        }
    }
}

impl TryFrom<i64> for UserLevel {
    type Error = CoreError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(UserLevel::None),
            1 => Ok(UserLevel::User),
            2 => Ok(UserLevel::Admin),
            other => Err(CoreError::UnknownLevel(other)),
        }
    }
}

impl Default for UserLevel {
    fn default() -> Self {
        UserLevel::None
    }
}

// =============================================================================
// User
// =============================================================================

/// A user account as stored in `mrbs_users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: i64,

    #[cfg_attr(feature = "sqlx", sqlx(try_from = "i64"))]
    pub level: UserLevel,

    /// Login name (unique).
    pub name: String,

    /// PHC-format Argon2id hash, or a legacy 32-hex MD5 digest.
    #[serde(skip)]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "password"))]
    pub password_hash: String,

    pub email: String,
}

/// Data needed to register a user. The password is plaintext and is hashed
/// by the store before insertion.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub level: UserLevel,
    pub name: String,
    pub password: String,
    pub email: String,
}

impl NewUser {
    /// Creates a registration for a regular user.
    pub fn new(
        name: impl Into<String>,
        password: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        NewUser {
            level: UserLevel::User,
            name: name.into(),
            password: password.into(),
            email: email.into(),
        }
    }

    /// Sets the privilege level.
    pub fn level(mut self, level: UserLevel) -> Self {
        self.level = level;
        self
    }
}

// =============================================================================
// Room
// =============================================================================

/// A bookable room, joined with the name of its area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Room {
    pub id: i64,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "room_name"))]
    pub name: String,

    /// Number of seats.
    pub capacity: i64,

    pub area_name: String,
}

// =============================================================================
// Booking Status
// =============================================================================

/// Status flag of a booking (`mrbs_entry.status`).
///
/// Only two values exist; there is no transition table. Confirming sets
/// `Confirmed`, cancelling deletes the booking outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    Pending,
}

impl BookingStatus {
    /// Returns the integer stored in `mrbs_entry.status`.
    pub const fn code(self) -> i64 {
        match self {
            BookingStatus::Confirmed => 0,
            BookingStatus::Pending => 1,
        }
    }
}

impl TryFrom<i64> for BookingStatus {
    type Error = CoreError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(BookingStatus::Confirmed),
            1 => Ok(BookingStatus::Pending),
            other => Err(CoreError::UnknownStatus(other)),
        }
    }
}

impl Default for BookingStatus {
    fn default() -> Self {
        BookingStatus::Pending
    }
}

// =============================================================================
// Booking
// =============================================================================

/// A booking (`mrbs_entry`) joined with its room name and digicode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Booking {
    pub id: i64,

    /// Creation time (Unix seconds).
    pub timestamp: i64,

    /// Start of the booking (Unix seconds).
    pub start_time: i64,

    /// End of the booking (Unix seconds).
    pub end_time: i64,

    pub room_id: i64,

    pub room_name: String,

    #[cfg_attr(feature = "sqlx", sqlx(try_from = "i64"))]
    pub status: BookingStatus,

    /// Name of the user who made the booking.
    pub create_by: String,

    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub digicode: Digicode,
}

impl Booking {
    /// Start of the booking.
    pub fn start(&self) -> DateTime<Utc> {
        unix_to_datetime(self.start_time)
    }

    /// End of the booking.
    pub fn end(&self) -> DateTime<Utc> {
        unix_to_datetime(self.end_time)
    }

    /// When the booking was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        unix_to_datetime(self.timestamp)
    }

    /// Whether the booking starts strictly after `now`.
    pub fn is_upcoming(&self, now: i64) -> bool {
        self.start_time > now
    }

    /// Whether the digicode opens the door at `now`.
    ///
    /// The window is `[start - grace, end + grace]`, bounds included.
    /// The store runs the same comparison in SQL.
    pub fn digicode_valid_at(&self, now: i64, grace_secs: i64) -> bool {
        self.start_time.saturating_sub(grace_secs) <= now
            && now <= self.end_time.saturating_add(grace_secs)
    }
}

/// Data needed to insert a booking. Normally done by the MRBS booking flow;
/// used here by the seed binary and tests.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub room_id: i64,
    pub start_time: i64,
    pub end_time: i64,
    pub create_by: String,
    pub status: BookingStatus,
}

impl NewBooking {
    /// Creates a pending booking for `room_id` between two Unix instants.
    pub fn new(room_id: i64, start_time: i64, end_time: i64, create_by: impl Into<String>) -> Self {
        NewBooking {
            room_id,
            start_time,
            end_time,
            create_by: create_by.into(),
            status: BookingStatus::Pending,
        }
    }

    /// Sets the initial status.
    pub fn status(mut self, status: BookingStatus) -> Self {
        self.status = status;
        self
    }
}

fn unix_to_datetime(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(start: i64, end: i64) -> Booking {
        Booking {
            id: 42,
            timestamp: start - 86_400,
            start_time: start,
            end_time: end,
            room_id: 1,
            room_name: "A101".to_string(),
            status: BookingStatus::Confirmed,
            create_by: "alice".to_string(),
            digicode: Digicode::parse("AB12CD").unwrap(),
        }
    }

    #[test]
    fn test_user_level_codes() {
        for level in [UserLevel::None, UserLevel::User, UserLevel::Admin] {
            assert_eq!(UserLevel::try_from(level.code()).unwrap(), level);
        }
        assert!(UserLevel::try_from(3).is_err());
        assert!(UserLevel::try_from(-1).is_err());
    }

    #[test]
    fn test_booking_status_codes() {
        assert_eq!(BookingStatus::try_from(0).unwrap(), BookingStatus::Confirmed);
        assert_eq!(BookingStatus::try_from(1).unwrap(), BookingStatus::Pending);
        assert!(matches!(
            BookingStatus::try_from(4),
            Err(CoreError::UnknownStatus(4))
        ));
    }

    #[test]
    fn test_level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&UserLevel::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::to_string(&UserLevel::None).unwrap(), "\"none\"");
    }

    #[test]
    fn test_user_never_serializes_password_hash() {
        let user = User {
            id: 1,
            level: UserLevel::User,
            name: "alice".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            email: "alice@example.org".to_string(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("alice@example.org"));
    }

    #[test]
    fn test_digicode_window_bounds() {
        let t = 1_700_000_000;
        let grace = 600;
        let b = booking(t, t + 3600);

        assert!(b.digicode_valid_at(t - grace, grace));
        assert!(b.digicode_valid_at(t + 1800, grace));
        assert!(b.digicode_valid_at(t + 3600 + grace, grace));

        assert!(!b.digicode_valid_at(t - grace - 1, grace));
        assert!(!b.digicode_valid_at(t + 3600 + grace + 1, grace));
    }

    #[test]
    fn test_digicode_window_saturates() {
        let b = booking(1_700_000_000, 1_700_003_600);

        assert!(b.digicode_valid_at(0, i64::MAX));
        assert!(b.digicode_valid_at(i64::MAX, i64::MAX));
        assert!(!b.digicode_valid_at(i64::MIN, 600));
        assert!(!b.digicode_valid_at(i64::MAX, 600));
    }

    #[test]
    fn test_booking_datetimes() {
        let b = booking(1_700_000_000, 1_700_003_600);
        assert_eq!(b.start().timestamp(), 1_700_000_000);
        assert_eq!((b.end() - b.start()).num_seconds(), 3600);
        assert!(b.is_upcoming(1_699_999_999));
        assert!(!b.is_upcoming(1_700_000_000));
    }

    #[test]
    fn test_new_user_builder() {
        let user = NewUser::new("bob", "pw", "bob@example.org").level(UserLevel::Admin);
        assert_eq!(user.level, UserLevel::Admin);
        assert_eq!(user.name, "bob");
    }
}
