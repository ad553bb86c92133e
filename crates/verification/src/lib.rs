//! Claim verification workflow.
//!
//! [`VerificationService`] ties the entity store to the external channels
//! and exposes the workflow in stages:
//!
//! - **Session lifecycle** ([`lifecycle`]): create meetings with join links
//!   and tokens, invite the patient by SMS, and move meeting status.
//! - **Artifact linking** ([`linker`]): attach and upload recordings, accept
//!   recorder webhooks, keep the geolocation log and form submissions.
//! - **Status derivation** ([`summary`]): VERIFIED once a claim has a
//!   completed meeting and a recording.
//! - **Report assembly** ([`report`]): PDF, HTML and text renderings of one
//!   view model.
//! - **Dispatch** ([`dispatch`]): email a report (critical) and archive it
//!   (best effort).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use database::Database;
//! use verification::{MeetingRequest, VerificationConfig, VerificationService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite:claims.db?mode=rwc").await?;
//! db.migrate().await?;
//!
//! let service = VerificationService::new(db.pool().clone(), VerificationConfig::from_env()?)
//!     .with_sms(Arc::new(sms_gateway::SmsClient::new(sms_gateway::SmsConfig::from_env()?)?));
//!
//! let created = service
//!     .create_meeting(MeetingRequest {
//!         claim_ref: Some("CLM-001".to_string()),
//!         patient_name: Some("Jane Roe".to_string()),
//!         procedure: None,
//!     })
//!     .await?;
//! println!("patient joins at {}", created.patient_url);
//!
//! let summary = service.summarize(created.meeting.claim_id.unwrap_or_default()).await?;
//! println!("{}", summary.verification_status);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod linker;
pub mod notify;
pub mod pdf;
pub mod report;
pub mod service;
pub mod summary;
pub mod token;

#[cfg(test)]
mod testing;

pub use config::VerificationConfig;
pub use dispatch::ReportDelivery;
pub use error::{Result, VerificationError};
pub use lifecycle::{CreatedMeeting, IssuedToken, MeetingRequest, SmsOutcome, StatusChange};
pub use linker::{
    DeletedRecording, GeoCapture, GeolocationList, RecordingAttachment, RecordingUpload,
    RecordingWebhook, SessionForm, WebhookOutcome,
};
pub use notify::{ReportMailer, SmsNotifier};
pub use report::{build_report, PatientForm, Report, ReportInput};
pub use service::VerificationService;
pub use summary::{summarize, ClaimSummary, VerificationFlags, VerificationStatus};
pub use token::{JaasTokenIssuer, TokenConfig, TokenError, TokenIssuer};
