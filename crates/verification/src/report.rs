//! Report assembly.
//!
//! One view model feeds three renderings: the PDF attachment, the HTML
//! email body and the plain-text email body. Missing values render as
//! [`NOT_AVAILABLE`] and assembly never fails; a rendering error falls back
//! to a plainer output and is logged.

use askama::Template;
use chrono::{DateTime, Utc};
use database::{Claim, FormSubmission, Meeting, Recording};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::pdf::{truncate, PdfError, TextPdf};
use crate::summary::{derive_flags, VerificationFlags, VerificationStatus};

/// Placeholder for absent values.
pub const NOT_AVAILABLE: &str = "Not Available";

pub const REPORT_TITLE: &str = "Claim Verification Report";

const CONFIDENTIALITY_NOTICE: &str = "This report was generated automatically. All information is \
     confidential and should be handled according to HIPAA guidelines.";

const SUBMISSIONS_TITLE: &str = "Form Submissions Report";
const SUBMISSION_LINE_MAX: usize = 110;
const REPORT_LINE_MAX: usize = 95;

/// Patient details entered on the verification form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientForm {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, alias = "policyNumber")]
    pub policy_number: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl PatientForm {
    pub fn is_empty(&self) -> bool {
        [
            &self.full_name,
            &self.email,
            &self.phone,
            &self.policy_number,
            &self.message,
        ]
        .iter()
        .all(|v| v.as_deref().map_or(true, |s| s.trim().is_empty()))
    }
}

impl From<&FormSubmission> for PatientForm {
    fn from(submission: &FormSubmission) -> Self {
        Self {
            full_name: Some(submission.full_name.clone()),
            email: Some(submission.email.clone()),
            message: submission.notes.clone(),
            ..Default::default()
        }
    }
}

/// Records a report is assembled from.
#[derive(Debug, Clone)]
pub struct ReportInput<'a> {
    pub claim: &'a Claim,
    pub meeting: &'a Meeting,
    pub recording: Option<&'a Recording>,
    pub form: Option<&'a PatientForm>,
    pub flags: VerificationFlags,
}

impl<'a> ReportInput<'a> {
    /// Input whose flags are derived from this meeting and recording alone.
    pub fn new(
        claim: &'a Claim,
        meeting: &'a Meeting,
        recording: Option<&'a Recording>,
        form: Option<&'a PatientForm>,
    ) -> Self {
        let recordings: Vec<Recording> = recording.into_iter().cloned().collect();
        Self {
            claim,
            meeting,
            recording,
            form,
            flags: derive_flags(std::slice::from_ref(meeting), &recordings),
        }
    }

    /// Replace the flags, e.g. with a claim-wide summary.
    pub fn with_flags(mut self, flags: VerificationFlags) -> Self {
        self.flags = flags;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSection {
    pub title: String,
    pub rows: Vec<ReportRow>,
}

impl ReportSection {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            rows: Vec::new(),
        }
    }

    fn row(mut self, label: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        let value = if value.trim().is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            value
        };
        self.rows.push(ReportRow {
            label: label.to_string(),
            value,
        });
        self
    }
}

/// Everything the three renderings show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportView {
    pub title: String,
    pub report_id: String,
    pub generated_at: String,
    pub claim_number: String,
    pub status: VerificationStatus,
    pub recording_url: Option<String>,
    pub sections: Vec<ReportSection>,
    pub footer: String,
}

/// An assembled report.
#[derive(Debug, Clone)]
pub struct Report {
    pub report_id: String,
    pub claim_number: String,
    pub status: VerificationStatus,
    pub subject: String,
    /// PDF attachment.
    pub document: Vec<u8>,
    pub text: String,
    pub html: String,
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportHtml<'a> {
    view: &'a ReportView,
}

#[derive(Template)]
#[template(path = "report.txt")]
struct ReportText<'a> {
    view: &'a ReportView,
}

fn or_na<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// `RPT-{YYYYMMDDHHMMSS}-{random}`.
pub fn report_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("RPT-{}-{}", now.format("%Y%m%d%H%M%S"), suffix)
}

/// Build the view model for `input` as of `now`.
pub fn report_view(input: &ReportInput<'_>, now: DateTime<Utc>) -> ReportView {
    let status = input.flags.status();
    let claim = input.claim;
    let meeting = input.meeting;
    let recording = input.recording;
    let report_id = report_id(now);
    let generated_at = now.format("%Y-%m-%d %H:%M:%S UTC").to_string();

    let mut sections = vec![
        ReportSection::new("Report Information")
            .row("Report Generated", generated_at.clone())
            .row("Report ID", report_id.clone())
            .row("Verification Status", status.as_str()),
        ReportSection::new("Claim Information")
            .row("Claim Number", claim.claim_number.clone())
            .row("Patient Mobile", claim.patient_mobile.clone())
            .row(
                "Hospital Location",
                format!("{}, {}", claim.hospital_city, claim.hospital_state),
            )
            .row("Language", claim.language.clone())
            .row("Claim Status", claim.status.clone())
            .row("Created Date", claim.created_at.clone()),
        ReportSection::new("Video Verification Details")
            .row("Session ID", meeting.session_id.clone())
            .row("Room Name", meeting.room_name.clone())
            .row("Patient Name", or_na(meeting.patient_name.as_deref()))
            .row("Procedure", or_na(meeting.procedure.as_deref()))
            .row("Meeting Status", meeting.status.as_str())
            .row("Meeting Created", meeting.created_at.clone()),
        ReportSection::new("Recording Information")
            .row("Recording ID", or_na(recording.map(|r| r.id)))
            .row("Storage Key", or_na(recording.map(|r| r.storage_key.as_str())))
            .row(
                "Recording URL",
                or_na(recording.and_then(|r| r.storage_url.as_deref())),
            )
            .row(
                "Duration (seconds)",
                or_na(recording.and_then(|r| r.duration_sec)),
            )
            .row("File Type", or_na(recording.map(|r| r.mime_type.as_str())))
            .row("Recorded At", or_na(recording.map(|r| r.created_at.as_str()))),
    ];

    let geo = recording.map(|r| r.geo()).filter(|g| g.is_located());
    if let Some(geo) = geo {
        sections.push(
            ReportSection::new("Geolocation Information")
                .row("Latitude", or_na(geo.latitude))
                .row("Longitude", or_na(geo.longitude))
                .row("Accuracy (meters)", or_na(geo.accuracy_m))
                .row("Location Verified", "YES"),
        );
    }

    if let Some(form) = input.form.filter(|f| !f.is_empty()) {
        sections.push(
            ReportSection::new("Patient Information")
                .row("Full Name", or_na(form.full_name.as_deref()))
                .row("Email", or_na(form.email.as_deref()))
                .row("Phone", or_na(form.phone.as_deref()))
                .row("Policy Number", or_na(form.policy_number.as_deref()))
                .row("Additional Notes", or_na(form.message.as_deref())),
        );
    }

    sections.push(
        ReportSection::new("Verification Summary")
            .row("Status", status.as_str())
            .row(
                "Video Recording",
                if recording.is_some() { "Available" } else { NOT_AVAILABLE },
            )
            .row(
                "Geolocation",
                if geo.is_some() { "Captured" } else { "Not Captured" },
            )
            .row(
                "Compliance",
                match status {
                    VerificationStatus::Verified => "COMPLIANT",
                    VerificationStatus::Pending => "PENDING",
                },
            ),
    );

    ReportView {
        title: REPORT_TITLE.to_string(),
        report_id,
        generated_at,
        claim_number: claim.claim_number.clone(),
        status,
        recording_url: recording.and_then(|r| r.storage_url.clone()),
        sections,
        footer: CONFIDENTIALITY_NOTICE.to_string(),
    }
}

/// Assemble all three renderings as of now.
pub fn build_report(input: &ReportInput<'_>) -> Report {
    build_report_at(input, Utc::now())
}

/// Assemble all three renderings with a fixed clock.
pub fn build_report_at(input: &ReportInput<'_>, now: DateTime<Utc>) -> Report {
    let view = report_view(input, now);

    let text = ReportText { view: &view }.render().unwrap_or_else(|e| {
        error!(report_id = %view.report_id, error = %e, "Text template failed, using fallback");
        fallback_text(&view)
    });
    let html = ReportHtml { view: &view }.render().unwrap_or_else(|e| {
        error!(report_id = %view.report_id, error = %e, "HTML template failed, using fallback");
        format!("<pre>{}</pre>", escape_html(&fallback_text(&view)))
    });
    let document = render_pdf(&view).unwrap_or_else(|e| {
        error!(report_id = %view.report_id, error = %e, "PDF rendering failed, attaching text");
        text.clone().into_bytes()
    });

    Report {
        subject: format!("{}: {}", REPORT_TITLE, view.claim_number),
        report_id: view.report_id,
        claim_number: view.claim_number,
        status: view.status,
        document,
        text,
        html,
    }
}

fn fallback_text(view: &ReportView) -> String {
    let mut out = format!("{}\n\n", view.title);
    for section in &view.sections {
        out.push_str(&section.title);
        out.push('\n');
        for row in &section.rows {
            out.push_str(&format!("{}: {}\n", row.label, row.value));
        }
        out.push('\n');
    }
    out.push_str(&view.footer);
    out
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn render_pdf(view: &ReportView) -> Result<Vec<u8>, PdfError> {
    let mut pdf = TextPdf::new(800.0);
    pdf.line(&view.title, 16.0);
    pdf.advance(8.0);

    for section in &view.sections {
        pdf.line(&section.title, 12.0);
        for row in &section.rows {
            let line = format!("{}: {}", row.label, row.value);
            pdf.indented_line(12.0, &truncate(&line, REPORT_LINE_MAX), 10.0);
        }
        pdf.advance(8.0);
    }

    for chunk in wrap(&view.footer, REPORT_LINE_MAX) {
        pdf.line(&chunk, 8.0);
    }
    pdf.finish()
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn geo_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "n/a".to_string())
}

/// Listing of all form submissions, three lines each.
pub fn submissions_pdf(submissions: &[FormSubmission]) -> Result<Vec<u8>, PdfError> {
    let mut pdf = TextPdf::new(820.0);
    pdf.text_at(40.0, 840.0, 11.0, SUBMISSIONS_TITLE);

    for s in submissions {
        let lines = [
            format!("#{} | {} | {}", s.id, s.full_name, s.email),
            format!("Notes: {}", s.notes.as_deref().unwrap_or("").replace('\n', " / ")),
            format!(
                "Geo: lat={} lon={} acc={}m at {}",
                geo_value(s.latitude),
                geo_value(s.longitude),
                geo_value(s.geo_accuracy_m),
                s.captured_at
            ),
            " ".to_string(),
        ];
        for line in &lines {
            pdf.line(&truncate(line, SUBMISSION_LINE_MAX), 9.0);
        }
    }

    pdf.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use database::MeetingStatus;

    fn claim() -> Claim {
        Claim {
            id: 1,
            claim_number: "CLM-001".to_string(),
            patient_mobile: "+15551234567".to_string(),
            hospital_city: "Springfield".to_string(),
            hospital_state: "IL".to_string(),
            language: "en".to_string(),
            status: "open".to_string(),
            user_id: 1,
            created_at: "2025-03-01 09:00:00.000".to_string(),
        }
    }

    fn meeting(status: MeetingStatus) -> Meeting {
        Meeting {
            id: 1,
            room_name: "claim-clm-001-abc".to_string(),
            session_id: "sess-1".to_string(),
            claim_id: Some(1),
            patient_name: Some("Jane Roe".to_string()),
            procedure: None,
            moderator_url: None,
            patient_url: None,
            status,
            created_at: "2025-03-01 10:00:00.000".to_string(),
        }
    }

    fn recording() -> Recording {
        Recording {
            id: 9,
            meeting_id: Some(1),
            storage_key: "recordings/2025/03/01/100500-call.mp4".to_string(),
            storage_url: Some("https://bucket.s3.amazonaws.com/call.mp4".to_string()),
            mime_type: "video/mp4".to_string(),
            duration_sec: Some(120),
            latitude: Some(41.88),
            longitude: Some(-87.63),
            geo_accuracy_m: Some(12.0),
            created_at: "2025-03-01 10:05:00.000".to_string(),
        }
    }

    fn frozen() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn section<'v>(view: &'v ReportView, title: &str) -> Option<&'v ReportSection> {
        view.sections.iter().find(|s| s.title == title)
    }

    #[test]
    fn test_missing_recording_uses_placeholder() {
        let claim = claim();
        let meeting = meeting(MeetingStatus::Completed);
        let input = ReportInput::new(&claim, &meeting, None, None);

        let report = build_report_at(&input, frozen());

        assert_eq!(report.status, VerificationStatus::Pending);
        assert!(report.text.contains("Recording ID: Not Available"));
        assert!(report.text.contains("Procedure: Not Available"));
        assert!(report.text.contains("Video Recording: Not Available"));
        assert!(report.html.contains(NOT_AVAILABLE));
        assert!(report.document.starts_with(b"%PDF"));
        assert!(!report.text.contains("Geolocation Information"));
    }

    #[test]
    fn test_full_report_sections() {
        let claim = claim();
        let meeting = meeting(MeetingStatus::Completed);
        let recording = recording();
        let form = PatientForm {
            full_name: Some("Jane Roe".to_string()),
            policy_number: Some("POL-9".to_string()),
            ..Default::default()
        };
        let input = ReportInput::new(&claim, &meeting, Some(&recording), Some(&form));

        let view = report_view(&input, frozen());
        assert_eq!(view.status, VerificationStatus::Verified);
        assert!(view.report_id.starts_with("RPT-20250301120000-"));
        assert_eq!(view.generated_at, "2025-03-01 12:00:00 UTC");

        let geo = section(&view, "Geolocation Information").unwrap();
        assert_eq!(geo.rows[0].value, "41.88");
        let patient = section(&view, "Patient Information").unwrap();
        assert_eq!(patient.rows[3].value, "POL-9");
        assert_eq!(patient.rows[1].value, NOT_AVAILABLE);
        let location = &section(&view, "Claim Information").unwrap().rows[2];
        assert_eq!(location.value, "Springfield, IL");
    }

    #[test]
    fn test_renderings_agree() {
        let claim = claim();
        let meeting = meeting(MeetingStatus::Completed);
        let recording = recording();
        let input = ReportInput::new(&claim, &meeting, Some(&recording), None);

        let report = build_report_at(&input, frozen());
        assert_eq!(report.subject, "Claim Verification Report: CLM-001");
        for needle in ["CLM-001", "Springfield, IL", "VERIFIED", "COMPLIANT", "Captured"] {
            assert!(report.text.contains(needle), "text missing {}", needle);
            assert!(report.html.contains(needle), "html missing {}", needle);
        }
        assert!(report.html.contains("View Recording"));
        assert!(report.text.contains("https://bucket.s3.amazonaws.com/call.mp4"));
        assert!(report.text.contains(&report.report_id));
    }

    #[test]
    fn test_html_escapes_values() {
        let mut claim = claim();
        claim.hospital_city = "<script>".to_string();
        let meeting = meeting(MeetingStatus::Pending);
        let input = ReportInput::new(&claim, &meeting, None, None);

        let report = build_report_at(&input, frozen());
        assert!(!report.html.contains("<script>"));
        assert!(report.text.contains("<script>"));
    }

    #[test]
    fn test_claim_wide_flags_override() {
        let claim = claim();
        let meeting = meeting(MeetingStatus::Active);
        let flags = VerificationFlags {
            has_completed_meeting: true,
            has_recording: true,
            has_geolocation: false,
        };
        let input = ReportInput::new(&claim, &meeting, None, None).with_flags(flags);
        assert_eq!(report_view(&input, frozen()).status, VerificationStatus::Verified);
    }

    #[test]
    fn test_patient_form_accepts_camel_case_policy() {
        let form: PatientForm =
            serde_json::from_str(r#"{"full_name":"Jane","policyNumber":"POL-1"}"#).unwrap();
        assert_eq!(form.policy_number.as_deref(), Some("POL-1"));
        assert!(!form.is_empty());
        assert!(PatientForm::default().is_empty());
    }

    #[test]
    fn test_submissions_listing() {
        let submissions: Vec<FormSubmission> = (1..=30)
            .map(|id| FormSubmission {
                id,
                full_name: "Jane Roe".to_string(),
                email: "jane@example.com".to_string(),
                notes: Some("Phone: +1555\nPolicy: \nMessage: ".to_string()),
                latitude: None,
                longitude: Some(-87.63),
                geo_accuracy_m: None,
                claim_id: None,
                captured_at: "2025-03-01 10:00:00.000".to_string(),
            })
            .collect();

        let bytes = submissions_pdf(&submissions).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        // 120 lines at 48 per page.
        assert_eq!(doc.get_pages().len(), 3);

        let empty = lopdf::Document::load_mem(&submissions_pdf(&[]).unwrap()).unwrap();
        assert_eq!(empty.get_pages().len(), 1);
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("aa bb cc", 5), vec!["aa bb", "cc"]);
        assert!(wrap("", 5).is_empty());
    }
}
