//! The verification service and its collaborators.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use artifact_store::ArtifactStore;
use sqlx::SqlitePool;
use tracing::warn;

use crate::config::VerificationConfig;
use crate::error::{Result, VerificationError};
use crate::notify::{ReportMailer, SmsNotifier};
use crate::token::TokenIssuer;

/// Entry point for every verification operation.
///
/// Holds the entity store plus whichever external channels are configured.
/// Missing channels are `None`; each operation decides whether that is an
/// error (critical path) or a logged skip (best effort).
#[derive(Clone)]
pub struct VerificationService {
    pool: SqlitePool,
    config: VerificationConfig,
    tokens: Option<Arc<dyn TokenIssuer>>,
    sms: Option<Arc<dyn SmsNotifier>>,
    mailer: Option<Arc<dyn ReportMailer>>,
    storage: Option<ArtifactStore>,
}

impl VerificationService {
    /// Create a service with no external channels.
    pub fn new(pool: SqlitePool, config: VerificationConfig) -> Self {
        Self {
            pool,
            config,
            tokens: None,
            sms: None,
            mailer: None,
            storage: None,
        }
    }

    /// Builder method to set the token issuer.
    pub fn with_token_issuer(mut self, issuer: Arc<dyn TokenIssuer>) -> Self {
        self.tokens = Some(issuer);
        self
    }

    /// Builder method to set the SMS channel.
    pub fn with_sms(mut self, sms: Arc<dyn SmsNotifier>) -> Self {
        self.sms = Some(sms);
        self
    }

    /// Builder method to set the email channel.
    pub fn with_mailer(mut self, mailer: Arc<dyn ReportMailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Builder method to set object storage.
    pub fn with_storage(mut self, storage: ArtifactStore) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    pub fn token_issuer(&self) -> Option<&Arc<dyn TokenIssuer>> {
        self.tokens.as_ref()
    }

    pub fn sms(&self) -> Option<&Arc<dyn SmsNotifier>> {
        self.sms.as_ref()
    }

    pub fn mailer(&self) -> Option<&Arc<dyn ReportMailer>> {
        self.mailer.as_ref()
    }

    pub fn storage(&self) -> Option<&ArtifactStore> {
        self.storage.as_ref()
    }

    /// Storage for a critical-path operation.
    pub(crate) fn require_storage(&self) -> Result<&ArtifactStore> {
        self.storage
            .as_ref()
            .ok_or_else(|| VerificationError::ServiceUnavailable("storage not configured".to_string()))
    }

    /// Mailer for a critical-path operation.
    pub(crate) fn require_mailer(&self) -> Result<&Arc<dyn ReportMailer>> {
        self.mailer
            .as_ref()
            .ok_or_else(|| VerificationError::ServiceUnavailable("email not configured".to_string()))
    }

    /// Run an external call under the transport timeout.
    ///
    /// Both a timeout and a transport error become `ServiceUnavailable`.
    pub(crate) async fn bounded<T, E, F>(&self, channel: &str, call: F) -> Result<T>
    where
        E: Display,
        F: Future<Output = std::result::Result<T, E>>,
    {
        let timeout = self.config.transport_timeout;
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(VerificationError::ServiceUnavailable(format!(
                "{} failed: {}",
                channel, e
            ))),
            Err(_) => {
                warn!(channel, timeout_secs = timeout.as_secs(), "Transport call timed out");
                Err(VerificationError::ServiceUnavailable(format!(
                    "{} timed out after {}s",
                    channel,
                    timeout.as_secs()
                )))
            }
        }
    }
}

impl std::fmt::Debug for VerificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationService")
            .field("config", &self.config)
            .field("tokens", &self.tokens.is_some())
            .field("sms", &self.sms.is_some())
            .field("mailer", &self.mailer.is_some())
            .field("storage", &self.storage)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_db;
    use std::time::Duration;

    #[tokio::test]
    async fn test_missing_channels_are_unavailable() {
        let db = test_db().await;
        let service = VerificationService::new(db.pool().clone(), VerificationConfig::default());

        assert!(matches!(
            service.require_storage(),
            Err(VerificationError::ServiceUnavailable(_))
        ));
        assert!(matches!(
            service.require_mailer(),
            Err(VerificationError::ServiceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_bounded_maps_timeout_and_errors() {
        let db = test_db().await;
        let config = VerificationConfig::default().with_transport_timeout(Duration::from_millis(20));
        let service = VerificationService::new(db.pool().clone(), config);

        let slow = service
            .bounded("sms", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, String>(())
            })
            .await;
        assert!(matches!(slow, Err(VerificationError::ServiceUnavailable(m)) if m.contains("timed out")));

        let failed = service
            .bounded("email", async { Err::<(), _>("refused") })
            .await;
        assert!(matches!(failed, Err(VerificationError::ServiceUnavailable(m)) if m == "email failed: refused"));

        let ok = service.bounded("storage", async { Ok::<_, String>(7) }).await;
        assert_eq!(ok.unwrap(), 7);
    }
}
