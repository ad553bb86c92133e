use lettre::{
    message::{header::ContentType, Attachment as LettreAttachment, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, info, instrument};

use crate::{Email, MailerConfig, MailerError};

/// SMTP client for outbound report mail.
///
/// Uses connection pooling for efficient batch sending.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    default_recipient: Option<String>,
}

impl Mailer {
    /// Create a new client with the given configuration.
    ///
    /// Port 465 uses implicit TLS, loopback hosts skip TLS, everything else
    /// negotiates STARTTLS.
    pub fn new(config: MailerConfig) -> Result<Self, MailerError> {
        let mut builder = if is_loopback(&config.smtp_host) {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        } else if config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
                .map_err(|e| MailerError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .map_err(|e| MailerError::Transport(e.to_string()))?
        }
        .port(config.smtp_port);

        if let Some((user, password)) = config.credentials() {
            builder = builder.credentials(Credentials::new(user, password));
        }

        let transport = builder.build();

        info!(
            host = %config.smtp_host,
            port = config.smtp_port,
            from = %config.from_address,
            "Created SMTP client"
        );

        Ok(Self {
            transport,
            from_address: config.from_address,
            default_recipient: config.default_recipient,
        })
    }

    /// Sender address used on every message.
    pub fn from_address(&self) -> &str {
        &self.from_address
    }

    /// Recipient configured through `EMAIL_TO`, if any.
    pub fn default_recipient(&self) -> Option<&str> {
        self.default_recipient.as_deref()
    }

    /// Send an email.
    #[instrument(skip(self, email), fields(to = ?email.to, subject = %email.subject))]
    pub async fn send(&self, email: &Email) -> Result<(), MailerError> {
        let message = build_message(&self.from_address, email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailerError::Send(e.to_string()))?;

        info!(to = ?email.to, subject = %email.subject, "Email sent successfully");
        Ok(())
    }
}

fn is_loopback(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "::1")
}

/// Build a lettre Message from our Email type.
pub(crate) fn build_message(from_address: &str, email: &Email) -> Result<Message, MailerError> {
    if email.to.is_empty() {
        return Err(MailerError::InvalidAddress("no recipients".to_string()));
    }

    let from = from_address
        .parse()
        .map_err(|e| MailerError::InvalidAddress(format!("From: {}", e)))?;

    let mut builder = Message::builder().from(from).subject(&email.subject);

    for to in &email.to {
        let addr = to
            .parse()
            .map_err(|e| MailerError::InvalidAddress(format!("To '{}': {}", to, e)))?;
        builder = builder.to(addr);
    }

    let body_part = match &email.html_body {
        Some(html) => MultiPart::alternative()
            .singlepart(SinglePart::plain(email.body.clone()))
            .singlepart(SinglePart::html(html.clone())),
        None => MultiPart::alternative().singlepart(SinglePart::plain(email.body.clone())),
    };

    let message = if email.attachments.is_empty() {
        if email.html_body.is_some() {
            builder
                .multipart(body_part)
                .map_err(|e| MailerError::BuildEmail(e.to_string()))?
        } else {
            builder
                .body(email.body.clone())
                .map_err(|e| MailerError::BuildEmail(e.to_string()))?
        }
    } else {
        let mut multipart = MultiPart::mixed().multipart(body_part);

        for attachment in &email.attachments {
            debug!(filename = %attachment.filename, content_type = %attachment.content_type, "Adding attachment");

            let content_type: ContentType = attachment
                .content_type
                .parse()
                .map_err(|e| MailerError::Attachment(format!("Invalid content type: {}", e)))?;

            let lettre_attachment = LettreAttachment::new(attachment.filename.clone())
                .body(attachment.data.clone(), content_type);

            multipart = multipart.singlepart(lettre_attachment);
        }

        builder
            .multipart(multipart)
            .map_err(|e| MailerError::BuildEmail(e.to_string()))?
    };

    Ok(message)
}
