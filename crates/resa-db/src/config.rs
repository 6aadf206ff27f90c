//! # Store Configuration
//!
//! Everything the store needs at construction, loaded from `RESA_*`
//! environment variables with defaults.
//!
//! ## Environment Variables
//! ```text
//! ┌──────────────────────────────┬──────────────────────────────────────────┐
//! │  Variable                    │  Default / meaning                       │
//! ├──────────────────────────────┼──────────────────────────────────────────┤
//! │  RESA_DB_PATH                │  unset; when set, use this SQLite file   │
//! │  RESA_DB_HOST                │  localhost                               │
//! │  RESA_DB_PORT                │  3306                                    │
//! │  RESA_DB_NAME                │  mrbs                                    │
//! │  RESA_DB_USER                │  mrbs                                    │
//! │  RESA_DB_PASSWORD            │  (empty)                                 │
//! │  RESA_DB_MAX_CONNECTIONS     │  5                                       │
//! │  RESA_DIGICODE_GRACE_SECS    │  3600                                    │
//! │  RESA_MAIL_SENDER            │  reservations@localhost                  │
//! │  RESA_MAIL_DIR               │  unset; when set, write mails to files   │
//! │  RESA_SMTP_HOST              │  localhost                               │
//! │  RESA_SMTP_PORT              │  587                                     │
//! │  RESA_SMTP_USER              │  unset (no authentication)               │
//! │  RESA_SMTP_PASSWORD          │  unset                                   │
//! │  RESA_SMTP_TLS               │  true                                    │
//! └──────────────────────────────┴──────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::mail::MailTransportConfig;
use crate::pool::DbConfig;
use resa_core::DEFAULT_GRACE_DELAY_SECS;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("Invalid value for {var}: '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database connection.
    pub db: DbConfig,

    /// Seconds before start and after end during which a digicode still
    /// opens the door.
    /// Default: 3600
    pub grace_delay_secs: i64,

    /// `From:` address of outgoing mail.
    pub mail_sender: String,

    /// Outgoing mail transport.
    pub mail: MailTransportConfig,
}

impl StoreConfig {
    /// Configuration for tests: in-memory database, mail written to `mail_dir`.
    pub fn in_memory(mail_dir: impl Into<PathBuf>) -> Self {
        StoreConfig {
            db: DbConfig::in_memory(),
            grace_delay_secs: DEFAULT_GRACE_DELAY_SECS,
            mail_sender: "reservations@localhost".to_string(),
            mail: MailTransportConfig::File {
                dir: mail_dir.into(),
            },
        }
    }

    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let db = match lookup("RESA_DB_PATH") {
            Some(path) => DbConfig::sqlite(path),
            None => DbConfig::mysql(
                get("RESA_DB_HOST", "localhost"),
                parse(&lookup, "RESA_DB_PORT", 3306)?,
                get("RESA_DB_NAME", "mrbs"),
                get("RESA_DB_USER", "mrbs"),
                get("RESA_DB_PASSWORD", ""),
            ),
        }
        .max_connections(parse(&lookup, "RESA_DB_MAX_CONNECTIONS", 5)?);

        let mail = match lookup("RESA_MAIL_DIR") {
            Some(dir) => MailTransportConfig::File { dir: dir.into() },
            None => MailTransportConfig::Smtp {
                host: get("RESA_SMTP_HOST", "localhost"),
                port: parse(&lookup, "RESA_SMTP_PORT", 587)?,
                username: lookup("RESA_SMTP_USER"),
                password: lookup("RESA_SMTP_PASSWORD"),
                use_tls: parse(&lookup, "RESA_SMTP_TLS", true)?,
            },
        };

        let grace_delay_secs =
            parse(&lookup, "RESA_DIGICODE_GRACE_SECS", DEFAULT_GRACE_DELAY_SECS)?;
        if grace_delay_secs < 0 {
            return Err(ConfigError::Invalid {
                var: "RESA_DIGICODE_GRACE_SECS",
                value: grace_delay_secs.to_string(),
            });
        }

        Ok(StoreConfig {
            db,
            grace_delay_secs,
            mail_sender: get("RESA_MAIL_SENDER", "reservations@localhost"),
            mail,
        })
    }
}

fn parse<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
