//! # Digicodes
//!
//! Door access codes attached one-to-one to bookings.
//!
//! ## Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  A digicode is 6 symbols drawn uniformly, with replacement, from       │
//! │                                                                         │
//! │        0 1 2 3 4 5 6 7 8 9 A B C D E F                                 │
//! │                                                                         │
//! │  e.g.  "AB12CD"   "00F3E9"   "777777"                                  │
//! │                                                                         │
//! │  16^6 = 16,777,216 possible codes. Collisions between bookings are     │
//! │  accepted: a code is only checked together with its time window.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Generation uses a fast non-cryptographic RNG. A digicode only opens a
//! door during its booking window, so it is not treated as a secret.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::{DIGICODE_ALPHABET, DIGICODE_LENGTH};

/// A validated six-character uppercase hexadecimal access code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(try_from = "String", into = "String")]
#[ts(export)]
pub struct Digicode(String);

impl Digicode {
    /// Parses a code typed by a user.
    ///
    /// Surrounding whitespace is ignored and lowercase hex digits are
    /// accepted, so `" ab12cd "` parses to `AB12CD`.
    ///
    /// ## Example
    /// ```rust
    /// use resa_core::Digicode;
    ///
    /// assert!(Digicode::parse("AB12CD").is_ok());
    /// assert!(Digicode::parse("AB12C").is_err());
    /// assert!(Digicode::parse("GHIJKL").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let code = input.trim().to_ascii_uppercase();

        let well_formed = code.len() == DIGICODE_LENGTH
            && code.bytes().all(|b| DIGICODE_ALPHABET.contains(&b));

        if !well_formed {
            return Err(CoreError::InvalidDigicode(input.to_string()));
        }

        Ok(Digicode(code))
    }

    /// Returns the code as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digicode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Digicode {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Digicode::parse(&value)
    }
}

impl From<Digicode> for String {
    fn from(code: Digicode) -> Self {
        code.0
    }
}

/// Generates a random digicode using the thread-local RNG.
pub fn generate_digicode() -> Digicode {
    generate_digicode_with(&mut rand::thread_rng())
}

/// Generates a random digicode from the given RNG.
///
/// ## Usage
/// Tests pass a seeded `StdRng` to get reproducible codes.
pub fn generate_digicode_with<R: Rng + ?Sized>(rng: &mut R) -> Digicode {
    let code: String = (0..DIGICODE_LENGTH)
        .map(|_| DIGICODE_ALPHABET[rng.gen_range(0..DIGICODE_ALPHABET.len())] as char)
        .collect();

    Digicode(code)
}

// =============================================================================
// Unit Tests
// =============================================================================
