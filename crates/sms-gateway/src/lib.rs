//! SMS gateway client library.
//!
//! This crate provides a client for a Twilio-compatible messaging REST API.
//! Messages are posted as form data with HTTP basic authentication using the
//! account SID and auth token.
//!
//! # Example
//!
//! ```no_run
//! use sms_gateway::{SmsClient, SmsConfig};
//!
//! # async fn example() -> Result<(), sms_gateway::SmsError> {
//! let config = SmsConfig::from_env()?;
//! let client = SmsClient::new(config)?;
//!
//! let sent = client.send_text("+15551234567", "Your verification call is ready").await?;
//! println!("Queued as {}", sent.sid);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::SmsClient;
pub use config::SmsConfig;
pub use error::SmsError;
pub use types::*;
