//! In-process fakes for the external channels.

use std::sync::Mutex;

use async_trait::async_trait;
use database::models::NewClaim;
use database::{claim, user, Database};
use mailer::{Email, MailerError};
use sms_gateway::SmsError;

use crate::notify::{ReportMailer, SmsNotifier};
use crate::token::{TokenError, TokenIssuer};

pub async fn test_db() -> Database {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    db
}

pub fn sample_claim(number: &str) -> NewClaim {
    NewClaim {
        claim_number: number.to_string(),
        patient_mobile: "+15551234567".to_string(),
        hospital_city: "Springfield".to_string(),
        hospital_state: "IL".to_string(),
        language: "en".to_string(),
    }
}

/// Database with one owner and claim `CLM-001`. Returns the claim id.
pub async fn db_with_claim() -> (Database, i64) {
    let db = test_db().await;
    let owner = user::create_user(db.pool(), "ops@example.com", "hunter22")
        .await
        .unwrap();
    let claim = claim::create_claim(db.pool(), owner.id, &sample_claim("CLM-001"))
        .await
        .unwrap();
    (db, claim.id)
}

#[derive(Default)]
pub struct FakeSms {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl FakeSms {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SmsNotifier for FakeSms {
    async fn send_text(&self, to: &str, body: &str) -> Result<String, SmsError> {
        if self.fail {
            return Err(SmsError::SendFailed("gateway down".to_string()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((to.to_string(), body.to_string()));
        Ok(format!("SM{}", sent.len()))
    }
}

#[derive(Default)]
pub struct FakeMailer {
    pub sent: Mutex<Vec<Email>>,
    pub fail: bool,
    pub default_recipient: Option<String>,
}

impl FakeMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn with_default_recipient(recipient: &str) -> Self {
        Self {
            default_recipient: Some(recipient.to_string()),
            ..Default::default()
        }
    }

    pub fn emails(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportMailer for FakeMailer {
    async fn send(&self, email: &Email) -> Result<(), MailerError> {
        if self.fail {
            return Err(MailerError::Send("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }

    fn default_recipient(&self) -> Option<&str> {
        self.default_recipient.as_deref()
    }
}

/// Issues `{room}:{name}:{moderator}` strings, or fails.
pub struct FakeTokens {
    pub fail: bool,
}

impl TokenIssuer for FakeTokens {
    fn issue_token(
        &self,
        room: &str,
        participant_name: &str,
        is_moderator: bool,
    ) -> Result<String, TokenError> {
        if self.fail {
            return Err(TokenError::Config("no key".to_string()));
        }
        Ok(format!("{}:{}:{}", room, participant_name, is_moderator))
    }

    fn app_id(&self) -> &str {
        "test-app"
    }
}
