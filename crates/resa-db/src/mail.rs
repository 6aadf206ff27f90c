//! # Mail
//!
//! The store's outgoing mail collaborator.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ReservationStore::send_new_password                                   │
//! │       │  Arc<dyn Mailer>                                               │
//! │       ▼                                                                 │
//! │  LettreMailer                                                          │
//! │  ├── Smtp  → MRBS relay (STARTTLS unless disabled)                     │
//! │  └── File  → one .eml per message in a directory (dev and tests)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::{debug, warn};

/// Mail delivery errors.
#[derive(Debug, Error)]
pub enum MailError {
    /// Sender or recipient is not a valid mailbox.
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// The message could not be assembled.
    #[error("Failed to build message: {0}")]
    Build(String),

    /// The transport refused or failed to deliver.
    #[error("Delivery failed: {0}")]
    Transport(String),

    /// The transport could not be created.
    #[error("Mail transport setup failed: {0}")]
    Setup(String),
}

/// Sends a plain-text mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str, from: &str)
        -> Result<(), MailError>;
}

/// How mail leaves the process.
#[derive(Clone, PartialEq, Eq)]
pub enum MailTransportConfig {
    Smtp {
        host: String,
        port: u16,
        username: Option<String>,
        password: Option<String>,
        use_tls: bool,
    },
    /// Write each message as a file in `dir`.
    File { dir: PathBuf },
}

impl std::fmt::Debug for MailTransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MailTransportConfig::Smtp {
                host,
                port,
                username,
                use_tls,
                ..
            } => f
                .debug_struct("Smtp")
                .field("host", host)
                .field("port", port)
                .field("username", username)
                .field("password", &"<redacted>")
                .field("use_tls", use_tls)
                .finish(),
            MailTransportConfig::File { dir } => {
                f.debug_struct("File").field("dir", dir).finish()
            }
        }
    }
}

enum Transport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

/// [`Mailer`] backed by lettre.
pub struct LettreMailer {
    transport: Transport,
}

impl LettreMailer {
    /// Builds the transport described by `config`.
    ///
    /// The file transport's directory is created if missing.
    pub fn new(config: &MailTransportConfig) -> Result<Self, MailError> {
        let transport = match config {
            MailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
                use_tls,
            } => {
                if !use_tls {
                    warn!("SMTP TLS is disabled");
                }

                let mut builder = if *use_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                        .map_err(|e| MailError::Setup(e.to_string()))?
                } else {
                    AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                }
                .port(*port);

                if let Some(user) = username {
                    builder = builder.credentials(Credentials::new(
                        user.clone(),
                        password.clone().unwrap_or_default(),
                    ));
                }

                Transport::Smtp(builder.build())
            }
            MailTransportConfig::File { dir } => {
                std::fs::create_dir_all(dir)
                    .map_err(|e| MailError::Setup(format!("create {}: {e}", dir.display())))?;
                Transport::File(AsyncFileTransport::<Tokio1Executor>::new(dir))
            }
        };

        Ok(LettreMailer { transport })
    }
}

fn mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| MailError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

#[async_trait]
impl Mailer for LettreMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        from: &str,
    ) -> Result<(), MailError> {
        let message = Message::builder()
            .from(mailbox(from)?)
            .to(mailbox(to)?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| MailError::Build(e.to_string()))?;

        match &self.transport {
            Transport::Smtp(smtp) => {
                smtp.send(message)
                    .await
                    .map_err(|e| MailError::Transport(e.to_string()))?;
            }
            Transport::File(file) => {
                file.send(message)
                    .await
                    .map_err(|e| MailError::Transport(e.to_string()))?;
            }
        }

        debug!(to = %to, subject = %subject, "Mail sent");
        Ok(())
    }
}


// =============================================================================
// Unit Tests
// =============================================================================
