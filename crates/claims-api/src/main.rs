//! Claims API server.
//!
//! Serves the claim verification workflow over HTTP. SMTP, SMS, object
//! storage and room tokens are each optional; a missing channel is logged
//! at startup and the operations that need it answer 503.

use std::sync::Arc;

use artifact_store::{ArtifactStore, StorageConfig, StorageError};
use claims_api::{app, AppState, Config};
use database::Database;
use mailer::{Mailer, MailerConfig, MailerError};
use sms_gateway::{SmsClient, SmsConfig, SmsError};
use tracing::{info, warn};
use verification::{
    JaasTokenIssuer, TokenConfig, TokenError, VerificationConfig, VerificationService,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting claims API");

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let mut service = VerificationService::new(db.pool().clone(), VerificationConfig::from_env()?);
    if let Some(mailer) = mailer_from_env() {
        service = service.with_mailer(Arc::new(mailer));
    }
    if let Some(sms) = sms_from_env() {
        service = service.with_sms(Arc::new(sms));
    }
    if let Some(store) = storage_from_env() {
        service = service.with_storage(store);
    }
    if let Some(issuer) = tokens_from_env() {
        service = service.with_token_issuer(Arc::new(issuer));
    }

    let state = AppState::new(db, service, config.default_claim_owner_id);
    let app = app(state, &config.cors_origins);

    info!(addr = %config.addr, "Claims API listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn mailer_from_env() -> Option<Mailer> {
    match MailerConfig::from_env().and_then(Mailer::new) {
        Ok(mailer) => Some(mailer),
        Err(MailerError::MissingEnvVar(var)) => {
            warn!(%var, "Email not configured; report delivery disabled");
            None
        }
        Err(e) => {
            warn!(error = %e, "Invalid email configuration; report delivery disabled");
            None
        }
    }
}

fn sms_from_env() -> Option<SmsClient> {
    match SmsConfig::from_env().and_then(SmsClient::new) {
        Ok(client) => Some(client),
        Err(SmsError::MissingEnvVar(var)) => {
            warn!(%var, "SMS not configured; invitations disabled");
            None
        }
        Err(e) => {
            warn!(error = %e, "Invalid SMS configuration; invitations disabled");
            None
        }
    }
}

fn storage_from_env() -> Option<ArtifactStore> {
    match StorageConfig::from_env().and_then(ArtifactStore::new) {
        Ok(store) => Some(store),
        Err(StorageError::MissingEnvVar(var)) => {
            warn!(%var, "Object storage not configured; uploads and archiving disabled");
            None
        }
        Err(e) => {
            warn!(error = %e, "Invalid storage configuration; uploads and archiving disabled");
            None
        }
    }
}

fn tokens_from_env() -> Option<JaasTokenIssuer> {
    match TokenConfig::from_env().and_then(JaasTokenIssuer::new) {
        Ok(issuer) => Some(issuer),
        Err(TokenError::MissingEnvVar(var)) => {
            warn!(%var, "Room tokens not configured; join links carry no token");
            None
        }
        Err(e) => {
            warn!(error = %e, "Invalid token configuration; join links carry no token");
            None
        }
    }
}
