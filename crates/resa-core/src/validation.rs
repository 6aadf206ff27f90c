//! # Validation Module
//!
//! Field checks run before a statement reaches the database.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web forms                                                    │
//! │  └── Basic format checks, immediate feedback                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: ReservationStore (Rust)                                      │
//! │  └── THIS MODULE: lengths and formats matching the MRBS columns        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database                                                     │
//! │  ├── NOT NULL constraints                                              │
//! │  └── UNIQUE (mrbs_users.name)                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::NewUser;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Width of `mrbs_users.name`.
pub const MAX_USER_NAME_LEN: usize = 30;

/// Width of `mrbs_users.email`.
pub const MAX_EMAIL_LEN: usize = 75;

/// Upper bound on plaintext passwords (Argon2 input).
pub const MAX_PASSWORD_LEN: usize = 128;

/// Validates a login name.
///
/// ## Rules
/// - Must not be empty
/// - At most 30 characters
/// - No whitespace
///
/// ## Example
/// ```rust
/// use resa_core::validation::validate_user_name;
///
/// assert!(validate_user_name("jdupont").is_ok());
/// assert!(validate_user_name("").is_err());
/// assert!(validate_user_name("j dupont").is_err());
/// ```
pub fn validate_user_name(name: &str) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_USER_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_USER_NAME_LEN,
        });
    }

    if name.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "name".to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// Only the shape is checked: one `@` with text on both sides.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    if email.chars().count() > MAX_EMAIL_LEN {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LEN,
        });
    }

    let mut parts = email.split('@');
    let well_formed = matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty()
    );

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "expected user@domain".to_string(),
        });
    }

    Ok(())
}

/// Validates a plaintext password.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.chars().count() > MAX_PASSWORD_LEN {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: MAX_PASSWORD_LEN,
        });
    }

    Ok(())
}

/// Validates every field of a registration.
pub fn validate_new_user(user: &NewUser) -> ValidationResult<()> {
    validate_user_name(&user.name)?;
    validate_password(&user.password)?;
    validate_email(&user.email)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
