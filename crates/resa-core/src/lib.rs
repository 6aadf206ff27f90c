//! # resa-core: Pure Domain Logic for the Reservation Store
//!
//! This crate holds the domain of the M2L room reservation application as
//! plain types and pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Reservation Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Web pages / door keypads                        │   │
//! │  │   login, my bookings, cancel, confirm, digicode check           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               resa-db: ReservationStore facade                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ resa-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ digicode  │  │ password  │  │ validation│  │   │
//! │  │   │  User     │  │ Digicode  │  │ Argon2id  │  │   rules   │  │   │
//! │  │   │  Booking  │  │ generate  │  │ legacy md5│  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (User, Room, Booking, ...)
//! - [`digicode`] - Six-character door access codes
//! - [`password`] - Password hashing and verification
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation
//!
//! ## Example Usage
//!
//! ```rust
//! use resa_core::digicode::{generate_digicode, Digicode};
//!
//! let code = generate_digicode();
//! assert_eq!(code.as_str().len(), 6);
//!
//! // Codes typed on a keypad are normalised to uppercase
//! let typed = Digicode::parse("ab12cd").unwrap();
//! assert_eq!(typed.as_str(), "AB12CD");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod digicode;
pub mod error;
pub mod password;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use digicode::Digicode;
pub use error::{CoreError, CoreResult, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Number of characters in a digicode.
pub const DIGICODE_LENGTH: usize = 6;

/// Symbols a digicode is drawn from.
pub const DIGICODE_ALPHABET: &[u8; 16] = b"0123456789ABCDEF";

/// Default grace delay around a booking window, in seconds.
///
/// A digicode opens the door this long before the booking starts and
/// keeps working this long after it ends.
pub const DEFAULT_GRACE_DELAY_SECS: i64 = 3600;
