//! Report dispatch: email delivery and storage archiving.
//!
//! Email is on the critical path and its failures surface to the caller.
//! Archiving is best effort.

use artifact_store::clean_filename;
use chrono::Utc;
use database::validation::validate_email;
use database::form_submission;
use mailer::{Attachment, Email};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::{Result, VerificationError};
use crate::report::{build_report, submissions_pdf, PatientForm, Report, ReportInput};
use crate::service::VerificationService;
use crate::summary::{derive_flags, load_evidence, VerificationStatus};

const PDF_MIME: &str = "application/pdf";
const SUBMISSIONS_FILENAME: &str = "submissions.pdf";
const SUBMISSIONS_SUBJECT: &str = "Form Submissions Report";
const SUBMISSIONS_BODY: &str = "Please find the attached report.";

/// Outcome of [`VerificationService::generate_and_send_claim_report`].
#[derive(Debug, Clone, Serialize)]
pub struct ReportDelivery {
    pub claim_number: String,
    pub report_id: String,
    pub email_sent: bool,
    pub archive_url: Option<String>,
    pub recipient: String,
    pub verification_status: VerificationStatus,
}

/// Attachment name for a claim report.
pub fn report_filename(claim_number: &str) -> String {
    format!(
        "claim_verification_{}_{}.pdf",
        clean_filename(claim_number),
        Utc::now().format("%Y%m%d")
    )
}

impl VerificationService {
    /// Pick the explicit recipient or fall back to the mailer's default.
    fn resolve_recipient(&self, recipient: Option<&str>) -> Result<String> {
        let mailer = self.require_mailer()?;
        let recipient = recipient
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .or_else(|| mailer.default_recipient())
            .ok_or_else(|| VerificationError::Validation("no recipient given".to_string()))?;
        validate_email(recipient)?;
        Ok(recipient.to_string())
    }

    /// Email a report with its PDF attached.
    #[instrument(skip(self, report), fields(report_id = %report.report_id))]
    pub async fn send_report(&self, recipient: &str, report: &Report) -> Result<()> {
        let mailer = self.require_mailer()?;

        let mut email = Email::new(recipient, report.subject.clone(), report.text.clone());
        email.with_html(report.html.clone()).attach(Attachment::new(
            report_filename(&report.claim_number),
            PDF_MIME,
            report.document.clone(),
        ));

        self.bounded("email", mailer.send(&email)).await?;
        info!(recipient, "Report emailed");
        Ok(())
    }

    /// Upload a report PDF to storage. Returns its URL, or `None` when
    /// storage is missing or the upload fails.
    pub async fn archive_report(&self, report: &Report) -> Option<String> {
        let Some(store) = self.storage() else {
            warn!(report_id = %report.report_id, "Storage not configured, report not archived");
            return None;
        };

        let key = store.report_key(&report_filename(&report.claim_number));
        match self
            .bounded("storage", store.put(&key, report.document.clone(), PDF_MIME))
            .await
        {
            Ok(url) => {
                info!(report_id = %report.report_id, url = %url, "Report archived");
                Some(url)
            }
            Err(e) => {
                warn!(report_id = %report.report_id, error = %e, "Failed to archive report");
                None
            }
        }
    }

    /// Assemble a claim's report from its latest meeting and recording,
    /// email it, then archive it.
    ///
    /// Without explicit form data the claim's latest form submission, if
    /// any, fills the patient section.
    #[instrument(skip(self, form))]
    pub async fn generate_and_send_claim_report(
        &self,
        claim_id: i64,
        recipient: Option<&str>,
        form: Option<PatientForm>,
    ) -> Result<ReportDelivery> {
        let evidence = load_evidence(self.pool(), claim_id).await?;
        let latest_meeting = evidence.meetings.first().ok_or_else(|| {
            VerificationError::not_found("Meeting", format!("claim {}", evidence.claim.claim_number))
        })?;
        let recipient = self.resolve_recipient(recipient)?;

        let latest_recording = evidence
            .recordings
            .iter()
            .find(|r| r.meeting_id == Some(latest_meeting.id));
        let flags = derive_flags(&evidence.meetings, &evidence.recordings);
        let form = match form {
            Some(form) => Some(form),
            None => form_submission::latest_for_claim(self.pool(), claim_id)
                .await?
                .map(|submission| PatientForm::from(&submission)),
        };

        let input = ReportInput::new(&evidence.claim, latest_meeting, latest_recording, form.as_ref())
            .with_flags(flags);
        let report = build_report(&input);

        self.send_report(&recipient, &report).await?;
        let archive_url = self.archive_report(&report).await;

        info!(
            claim_id,
            report_id = %report.report_id,
            status = %report.status,
            archived = archive_url.is_some(),
            "Claim report delivered"
        );

        Ok(ReportDelivery {
            claim_number: report.claim_number,
            report_id: report.report_id,
            email_sent: true,
            archive_url,
            recipient,
            verification_status: report.status,
        })
    }

    /// PDF listing of every form submission.
    pub async fn submissions_document(&self) -> Result<Vec<u8>> {
        let submissions = form_submission::list_form_submissions(self.pool()).await?;
        submissions_pdf(&submissions).map_err(|e| VerificationError::Internal(e.to_string()))
    }

    /// Email the submissions listing. Returns the recipient used.
    pub async fn email_submissions(&self, recipient: Option<&str>) -> Result<String> {
        let recipient = self.resolve_recipient(recipient)?;
        let document = self.submissions_document().await?;
        let mailer = self.require_mailer()?;

        let mut email = Email::new(recipient.as_str(), SUBMISSIONS_SUBJECT, SUBMISSIONS_BODY);
        email.attach(Attachment::new(SUBMISSIONS_FILENAME, PDF_MIME, document));

        self.bounded("email", mailer.send(&email)).await?;
        info!(recipient = %recipient, "Submissions report emailed");
        Ok(recipient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VerificationConfig;
    use crate::lifecycle::MeetingRequest;
    use crate::linker::RecordingWebhook;
    use crate::testing::{db_with_claim, FakeMailer};
    use artifact_store::ArtifactStore;
    use database::NewFormSubmission;
    use std::sync::Arc;

    async fn claim_with_call(service: &VerificationService) {
        let created = service
            .create_meeting(MeetingRequest {
                claim_ref: Some("CLM-001".to_string()),
                patient_name: Some("Jane Roe".to_string()),
                procedure: Some("MRI".to_string()),
            })
            .await
            .unwrap();
        service
            .recording_webhook(RecordingWebhook {
                room_name: created.meeting.room_name,
                storage_key: "recordings/call.mp4".to_string(),
                duration_sec: Some(120),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    #[test]
    fn test_report_filename() {
        let name = report_filename("CLM 001");
        assert!(name.starts_with("claim_verification_CLM_001_"));
        assert!(name.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn test_generate_and_send_delivers_and_archives() {
        let (db, claim_id) = db_with_claim().await;
        let mailer = Arc::new(FakeMailer::default());
        let service = VerificationService::new(db.pool().clone(), VerificationConfig::default())
            .with_mailer(mailer.clone())
            .with_storage(ArtifactStore::in_memory());
        claim_with_call(&service).await;

        let delivery = service
            .generate_and_send_claim_report(claim_id, Some("adjuster@example.com"), None)
            .await
            .unwrap();

        assert!(delivery.email_sent);
        assert_eq!(delivery.claim_number, "CLM-001");
        assert_eq!(delivery.verification_status, VerificationStatus::Verified);
        assert!(delivery.archive_url.as_deref().unwrap().contains("reports/"));

        let emails = mailer.emails();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].to, vec!["adjuster@example.com".to_string()]);
        assert_eq!(emails[0].subject, "Claim Verification Report: CLM-001");
        assert!(emails[0].html_body.is_some());
        assert_eq!(emails[0].attachments[0].content_type, PDF_MIME);
        assert!(emails[0].attachments[0].data.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_report_falls_back_to_latest_form_submission() {
        let (db, claim_id) = db_with_claim().await;
        let mailer = Arc::new(FakeMailer::default());
        let service = VerificationService::new(db.pool().clone(), VerificationConfig::default())
            .with_mailer(mailer.clone());
        claim_with_call(&service).await;
        service
            .create_form(NewFormSubmission {
                full_name: "Maria Lopez".to_string(),
                email: "maria@example.com".to_string(),
                notes: Some("Knee brace fitted".to_string()),
                claim_id: Some(claim_id),
                ..Default::default()
            })
            .await
            .unwrap();

        service
            .generate_and_send_claim_report(claim_id, Some("adjuster@example.com"), None)
            .await
            .unwrap();
        service
            .generate_and_send_claim_report(
                claim_id,
                Some("adjuster@example.com"),
                Some(PatientForm {
                    full_name: Some("Explicit Name".to_string()),
                    ..Default::default()
                }),
            )
            .await
            .unwrap();

        let emails = mailer.emails();
        assert!(emails[0].body.contains("Patient Information"));
        assert!(emails[0].body.contains("Maria Lopez"));
        assert!(emails[0].body.contains("Knee brace fitted"));
        assert!(emails[1].body.contains("Explicit Name"));
        assert!(!emails[1].body.contains("Maria Lopez"));
    }

    #[tokio::test]
    async fn test_email_failure_is_surfaced() {
        let (db, claim_id) = db_with_claim().await;
        let service = VerificationService::new(db.pool().clone(), VerificationConfig::default())
            .with_mailer(Arc::new(FakeMailer::failing()));
        claim_with_call(&service).await;

        let result = service
            .generate_and_send_claim_report(claim_id, Some("adjuster@example.com"), None)
            .await;
        assert!(matches!(result, Err(VerificationError::ServiceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_unconfigured_email_is_unavailable() {
        let (db, claim_id) = db_with_claim().await;
        let service = VerificationService::new(db.pool().clone(), VerificationConfig::default());
        claim_with_call(&service).await;

        let result = service
            .generate_and_send_claim_report(claim_id, Some("adjuster@example.com"), None)
            .await;
        assert!(matches!(result, Err(VerificationError::ServiceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_archive_is_best_effort() {
        let (db, claim_id) = db_with_claim().await;
        let service = VerificationService::new(db.pool().clone(), VerificationConfig::default())
            .with_mailer(Arc::new(FakeMailer::with_default_recipient("ops@example.com")));
        claim_with_call(&service).await;

        let delivery = service
            .generate_and_send_claim_report(claim_id, None, Some(PatientForm::default()))
            .await
            .unwrap();
        assert!(delivery.email_sent);
        assert!(delivery.archive_url.is_none());
        assert_eq!(delivery.recipient, "ops@example.com");
    }

    #[tokio::test]
    async fn test_claim_without_meetings_or_unknown() {
        let (db, claim_id) = db_with_claim().await;
        let service = VerificationService::new(db.pool().clone(), VerificationConfig::default())
            .with_mailer(Arc::new(FakeMailer::default()));

        let no_meeting = service
            .generate_and_send_claim_report(claim_id, Some("adjuster@example.com"), None)
            .await;
        assert!(matches!(no_meeting, Err(VerificationError::NotFound { entity: "Meeting", .. })));

        let unknown = service
            .generate_and_send_claim_report(claim_id + 1, Some("adjuster@example.com"), None)
            .await;
        assert!(matches!(unknown, Err(VerificationError::NotFound { entity: "Claim", .. })));
    }

    #[tokio::test]
    async fn test_email_submissions() {
        let (db, _) = db_with_claim().await;
        let mailer = Arc::new(FakeMailer::with_default_recipient("ops@example.com"));
        let service = VerificationService::new(db.pool().clone(), VerificationConfig::default())
            .with_mailer(mailer.clone());
        service
            .create_form(NewFormSubmission {
                full_name: "Jane Roe".to_string(),
                email: "jane@example.com".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let recipient = service.email_submissions(None).await.unwrap();
        assert_eq!(recipient, "ops@example.com");

        let emails = mailer.emails();
        assert_eq!(emails[0].subject, SUBMISSIONS_SUBJECT);
        assert_eq!(emails[0].body, SUBMISSIONS_BODY);
        assert_eq!(emails[0].attachments[0].filename, SUBMISSIONS_FILENAME);

        let override_to = service.email_submissions(Some("audit@example.com")).await.unwrap();
        assert_eq!(override_to, "audit@example.com");
    }
}
