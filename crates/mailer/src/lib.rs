//! # mailer
//!
//! SMTP client for sending verification reports and form exports.
//!
//! ## Sending Email
//!
//! ```no_run
//! use mailer::{Attachment, Email, Mailer, MailerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mailer::MailerError> {
//!     let config = MailerConfig::from_env()?;
//!     let client = Mailer::new(config)?;
//!
//!     let mut email = Email::new("adjuster@example.com", "Claim report", "See attached.");
//!     email.attach(Attachment::new("report.pdf", "application/pdf", b"%PDF-1.5".to_vec()));
//!     client.send(&email).await?;
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod types;

pub use client::Mailer;
pub use config::MailerConfig;
pub use error::MailerError;
pub use types::{Attachment, Email};
