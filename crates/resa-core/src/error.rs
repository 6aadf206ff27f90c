//! # Error Types
//!
//! Domain-specific error types for resa-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  resa-core errors (this file)                                          │
//! │  ├── CoreError        - Domain errors (codes, levels, hashing)         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  resa-db errors (separate crate)                                       │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── StoreError       - DbError or mail delivery failure               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → StoreError → web layer  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A stored privilege level is outside 0..=2.
    #[error("Unknown user level: {0}")]
    UnknownLevel(i64),

    /// A stored booking status is neither confirmed nor pending.
    #[error("Unknown booking status: {0}")]
    UnknownStatus(i64),

    /// A digicode is not six hexadecimal characters.
    #[error("Invalid digicode '{0}': expected 6 hexadecimal characters")]
    InvalidDigicode(String),

    /// Password hashing failed (salt generation or parameter error).
    ///
    /// ## When This Occurs
    /// - The OS random source is unavailable
    /// - A stored hash is not a valid PHC string
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before a statement is sent to the database.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., email without '@').
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
