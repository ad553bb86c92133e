//! Workflow configuration.

use std::env;
use std::time::Duration;

use crate::error::VerificationError;

/// Default video conferencing host.
pub const DEFAULT_MEETING_DOMAIN: &str = "meet.jit.si";

/// Default bound on each external transport call.
pub const DEFAULT_TRANSPORT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for the verification workflow.
#[derive(Debug, Clone)]
pub struct VerificationConfig {
    /// Claim references that skip the claim lookup on meeting creation.
    pub demo_claim_refs: Vec<String>,
    /// Video conferencing host used in join links.
    pub meeting_domain: String,
    /// Bound on each SMS, email and storage call.
    pub transport_timeout: Duration,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            demo_claim_refs: Vec::new(),
            meeting_domain: DEFAULT_MEETING_DOMAIN.to_string(),
            transport_timeout: DEFAULT_TRANSPORT_TIMEOUT,
        }
    }
}

impl VerificationConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `DEMO_CLAIM_REFS` | Comma separated claim references that bypass lookup | (empty) |
    /// | `MEETING_DOMAIN` | Video conferencing host | `meet.jit.si` |
    /// | `TRANSPORT_TIMEOUT_SECS` | Timeout for each external call | `30` |
    pub fn from_env() -> Result<Self, VerificationError> {
        let demo_claim_refs = env::var("DEMO_CLAIM_REFS")
            .map(|v| parse_list(&v))
            .unwrap_or_default();

        let meeting_domain = env::var("MEETING_DOMAIN")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MEETING_DOMAIN.to_string());

        let transport_timeout = match env::var("TRANSPORT_TIMEOUT_SECS") {
            Ok(v) => Duration::from_secs(v.trim().parse::<u64>().map_err(|e| {
                VerificationError::Validation(format!("Invalid TRANSPORT_TIMEOUT_SECS: {}", e))
            })?),
            Err(_) => DEFAULT_TRANSPORT_TIMEOUT,
        };

        Ok(Self {
            demo_claim_refs,
            meeting_domain,
            transport_timeout,
        })
    }

    /// Whether `claim_ref` is on the bypass list.
    pub fn is_demo_claim(&self, claim_ref: &str) -> bool {
        self.demo_claim_refs.iter().any(|r| r == claim_ref.trim())
    }

    /// `https://domain` for public hosts, `http://` for loopback development hosts.
    pub fn meeting_base_url(&self) -> String {
        let host = self
            .meeting_domain
            .split(':')
            .next()
            .unwrap_or(&self.meeting_domain);
        let scheme = if host == "localhost" || host == "127.0.0.1" {
            "http"
        } else {
            "https"
        };
        format!("{}://{}", scheme, self.meeting_domain.trim_end_matches('/'))
    }

    /// Builder method to set the bypass list.
    pub fn with_demo_claim_refs(mut self, refs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.demo_claim_refs = refs.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set the meeting domain.
    pub fn with_meeting_domain(mut self, domain: impl Into<String>) -> Self {
        self.meeting_domain = domain.into();
        self
    }

    /// Builder method to set the transport timeout.
    pub fn with_transport_timeout(mut self, timeout: Duration) -> Self {
        self.transport_timeout = timeout;
        self
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
