//! # resa-db: Data Access for the Room Reservation Application
//!
//! This crate provides database access for the M2L room reservation web
//! application. It talks to the MRBS MySQL schema in production and to
//! SQLite for development and tests, through sqlx's `Any` driver.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Reservation Data Flow                            │
//! │                                                                         │
//! │  Web page (login, my bookings, door terminal)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     resa-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────────┐   ┌───────────────┐   ┌──────────────┐   │   │
//! │  │   │ReservationStore│   │  Repositories │   │  Migrations  │   │   │
//! │  │   │  (store.rs)    │──►│ UserRepo      │   │  (embedded)  │   │   │
//! │  │   │                │   │ RoomRepo      │   │ mysql/       │   │   │
//! │  │   │  Mailer ───────┼─┐ │ BookingRepo   │   │ sqlite/      │   │   │
//! │  │   └────────────────┘ │ │ DigicodeRepo  │   └──────────────┘   │   │
//! │  │                      │ └───────┬───────┘                      │   │
//! │  │                      │         ▼                               │   │
//! │  │                      │   Database (pool.rs, AnyPool)          │   │
//! │  └──────────────────────┼─────────┼───────────────────────────────┘   │
//! │                         ▼         ▼                                     │
//! │                  SMTP / files   MySQL (mrbs) or SQLite                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - The `ReservationStore` facade
//! - [`config`] - Environment-driven `StoreConfig`
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`repository`] - Per-table repositories
//! - [`mail`] - Outgoing mail collaborator
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use resa_db::{ReservationStore, StoreConfig};
//!
//! let store = ReservationStore::connect(StoreConfig::load()?).await?;
//!
//! let level = store.authenticate("alice", "s3cret").await?;
//! let mine = store.list_upcoming_bookings("alice").await?;
//! let open = store.check_digicode_for_room(3, "AB12CD").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod mail;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, StoreConfig};
pub use error::{DbError, DbResult};
pub use mail::{LettreMailer, MailError, MailTransportConfig, Mailer};
pub use pool::{Database, DbConfig, DbTarget};
pub use store::{ReservationStore, StoreError, StoreResult};

// Repository re-exports for convenience
pub use repository::booking::BookingRepository;
pub use repository::digicode::DigicodeRepository;
pub use repository::room::RoomRepository;
pub use repository::user::UserRepository;
