//! Controller and client configuration.

use std::time::Duration;

use crate::reconciler::retry::RetryPolicy;

/// Lifecycle controller settings.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Region for networks created without an explicit region.
    pub default_region: String,
    /// Retry policy for enabling private networking on an instance.
    pub enable_retry: RetryPolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            default_region: "EU".to_string(),
            enable_retry: RetryPolicy::default(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API, without trailing slash.
    pub endpoint: String,
    /// Pre-issued access token, sent as `Authorization: Bearer`.
    pub bearer_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            bearer_token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("https://api.contabo.com")
    }
}
