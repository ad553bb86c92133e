/// An email message to send.
#[derive(Debug, Clone)]
pub struct Email {
    /// Recipients
    pub to: Vec<String>,
    /// Email subject
    pub subject: String,
    /// Plain text body
    pub body: String,
    /// Optional HTML body
    pub html_body: Option<String>,
    /// File attachments
    pub attachments: Vec<Attachment>,
}

impl Email {
    /// Create a new email with a single recipient.
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: vec![to.into()],
            subject: subject.into(),
            body: body.into(),
            html_body: None,
            attachments: Vec::new(),
        }
    }

    /// Create a new email with multiple recipients.
    pub fn new_multi(
        to: impl IntoIterator<Item = impl Into<String>>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into_iter().map(Into::into).collect(),
            subject: subject.into(),
            body: body.into(),
            html_body: None,
            attachments: Vec::new(),
        }
    }

    /// Set the HTML body (creates multipart alternative with text fallback).
    pub fn with_html(&mut self, html: impl Into<String>) -> &mut Self {
        self.html_body = Some(html.into());
        self
    }

    /// Add an attachment.
    pub fn attach(&mut self, attachment: Attachment) -> &mut Self {
        self.attachments.push(attachment);
        self
    }
}

/// A file attachment for an email.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Filename to display
    pub filename: String,
    /// MIME content type (e.g., "application/pdf")
    pub content_type: String,
    /// Raw file data
    pub data: Vec<u8>,
}

impl Attachment {
    /// Create an attachment from raw data.
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data,
        }
    }

    /// Create an attachment from bytes with auto-detected MIME type.
    pub fn from_bytes(filename: impl Into<String>, data: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .to_string();

        Self::new(filename, content_type, data)
    }
}
