//! Video conference token issuance.
//!
//! Tokens follow the JaaS shape: audience `jitsi`, issuer `chat`, subject the
//! app id, the room name, and a `context.user` block carrying the display
//! name and moderator flag.

use std::env;
use std::time::Duration;

use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Default token lifetime.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

const MIN_TOKEN_TTL: Duration = Duration::from_secs(3600);
const MAX_TOKEN_TTL: Duration = Duration::from_secs(7200);

/// Errors raised while configuring or signing tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token configuration error: {0}")]
    Config(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Issues signed room tokens.
pub trait TokenIssuer: Send + Sync {
    /// Sign a token granting `participant_name` access to `room`.
    fn issue_token(
        &self,
        room: &str,
        participant_name: &str,
        is_moderator: bool,
    ) -> Result<String, TokenError>;

    /// Application id embedded as the token subject.
    fn app_id(&self) -> &str;
}

/// How tokens are signed.
#[derive(Debug, Clone)]
pub enum SigningKey {
    /// RS256 with a PEM private key (raw or base64 encoded) and its key id.
    Rsa { pem: SecretString, key_id: String },
    /// HS256 with a shared secret.
    Hmac { secret: SecretString },
}

/// Token issuer configuration.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub app_id: String,
    pub signing: SigningKey,
    pub ttl: Duration,
}

impl TokenConfig {
    /// Load configuration from environment variables.
    ///
    /// - `JAAS_APP_ID` (required)
    /// - `JAAS_PRIVATE_KEY` + `JAAS_API_KEY_ID` for RS256, otherwise
    ///   `JAAS_SECRET` for HS256
    /// - `JAAS_TOKEN_TTL_SECS` (default 3600, between 3600 and 7200)
    pub fn from_env() -> Result<Self, TokenError> {
        let app_id = non_empty("JAAS_APP_ID")
            .ok_or_else(|| TokenError::MissingEnvVar("JAAS_APP_ID".to_string()))?;

        let signing = match (non_empty("JAAS_PRIVATE_KEY"), non_empty("JAAS_SECRET")) {
            (Some(pem), _) => SigningKey::Rsa {
                pem: SecretString::from(pem),
                key_id: non_empty("JAAS_API_KEY_ID")
                    .ok_or_else(|| TokenError::MissingEnvVar("JAAS_API_KEY_ID".to_string()))?,
            },
            (None, Some(secret)) => SigningKey::Hmac {
                secret: SecretString::from(secret),
            },
            (None, None) => {
                return Err(TokenError::MissingEnvVar(
                    "JAAS_PRIVATE_KEY or JAAS_SECRET".to_string(),
                ))
            }
        };

        let ttl = match env::var("JAAS_TOKEN_TTL_SECS") {
            Ok(v) => Duration::from_secs(v.trim().parse::<u64>().map_err(|e| {
                TokenError::Config(format!("Invalid JAAS_TOKEN_TTL_SECS: {}", e))
            })?),
            Err(_) => DEFAULT_TOKEN_TTL,
        };

        Ok(Self {
            app_id,
            signing,
            ttl,
        })
    }

    /// HS256 configuration with the default lifetime.
    pub fn hmac(app_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            signing: SigningKey::Hmac {
                secret: SecretString::from(secret.into()),
            },
            ttl: DEFAULT_TOKEN_TTL,
        }
    }

    /// RS256 configuration with the default lifetime.
    pub fn rsa(app_id: impl Into<String>, key_id: impl Into<String>, pem: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            signing: SigningKey::Rsa {
                pem: SecretString::from(pem.into()),
                key_id: key_id.into(),
            },
            ttl: DEFAULT_TOKEN_TTL,
        }
    }
}

fn non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

/// Claims carried by a room token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomClaims {
    pub aud: String,
    pub iss: String,
    pub sub: String,
    pub room: String,
    pub exp: i64,
    pub nbf: i64,
    pub context: RoomContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomContext {
    pub user: RoomUser,
    pub features: RoomFeatures,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomUser {
    pub id: String,
    pub name: String,
    pub moderator: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomFeatures {
    pub recording: bool,
    pub transcription: bool,
}

/// JaaS-compatible JWT issuer.
pub struct JaasTokenIssuer {
    app_id: String,
    key: EncodingKey,
    header: Header,
    ttl: Duration,
}

impl JaasTokenIssuer {
    /// Build an issuer, parsing the signing key up front.
    pub fn new(config: TokenConfig) -> Result<Self, TokenError> {
        if config.ttl < MIN_TOKEN_TTL || config.ttl > MAX_TOKEN_TTL {
            return Err(TokenError::Config(format!(
                "token lifetime must be between {} and {} seconds, got {}",
                MIN_TOKEN_TTL.as_secs(),
                MAX_TOKEN_TTL.as_secs(),
                config.ttl.as_secs()
            )));
        }

        let (key, header) = match &config.signing {
            SigningKey::Rsa { pem, key_id } => {
                let pem = decode_pem(pem.expose_secret())?;
                let key = EncodingKey::from_rsa_pem(&pem)
                    .map_err(|e| TokenError::Config(format!("invalid RSA key: {}", e)))?;
                let mut header = Header::new(Algorithm::RS256);
                header.kid = Some(key_id.clone());
                (key, header)
            }
            SigningKey::Hmac { secret } => (
                EncodingKey::from_secret(secret.expose_secret().as_bytes()),
                Header::new(Algorithm::HS256),
            ),
        };

        Ok(Self {
            app_id: config.app_id,
            key,
            header,
            ttl: config.ttl,
        })
    }

    fn claims(&self, room: &str, participant_name: &str, is_moderator: bool) -> RoomClaims {
        let now = Utc::now().timestamp();
        RoomClaims {
            aud: "jitsi".to_string(),
            iss: "chat".to_string(),
            sub: self.app_id.clone(),
            room: room.to_string(),
            exp: now + self.ttl.as_secs() as i64,
            nbf: now - 10,
            context: RoomContext {
                user: RoomUser {
                    id: Uuid::new_v4().to_string(),
                    name: participant_name.to_string(),
                    moderator: is_moderator,
                },
                features: RoomFeatures {
                    recording: is_moderator,
                    transcription: is_moderator,
                },
            },
        }
    }
}

impl TokenIssuer for JaasTokenIssuer {
    fn issue_token(
        &self,
        room: &str,
        participant_name: &str,
        is_moderator: bool,
    ) -> Result<String, TokenError> {
        let claims = self.claims(room, participant_name, is_moderator);
        Ok(encode(&self.header, &claims, &self.key)?)
    }

    fn app_id(&self) -> &str {
        &self.app_id
    }
}

impl std::fmt::Debug for JaasTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JaasTokenIssuer")
            .field("app_id", &self.app_id)
            .field("alg", &self.header.alg)
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Accept a PEM either verbatim, with escaped newlines, or base64 encoded.
fn decode_pem(value: &str) -> Result<Vec<u8>, TokenError> {
    let trimmed = value.trim();
    if trimmed.starts_with("-----BEGIN") {
        return Ok(trimmed.replace("\\n", "\n").into_bytes());
    }
    base64::engine::general_purpose::STANDARD
        .decode(trimmed)
        .map_err(|e| TokenError::Config(format!("private key is neither PEM nor base64: {}", e)))
}
