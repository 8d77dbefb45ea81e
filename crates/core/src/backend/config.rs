// crates/core/src/backend/config.rs
//! Connection settings for the BI backend's REST API.

use std::time::Duration;

/// Default TCP connect timeout for the backend HTTP client.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where and how to reach the BI backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL, e.g. `http://localhost:8088`.
    pub base_url: String,
    /// Bearer token, if the deployment requires one.
    pub api_token: Option<String>,
    /// TCP connect timeout for the underlying HTTP client. Distinct from the
    /// per-query deadline, which is passed per call.
    pub connect_timeout: Duration,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Read configuration from the environment.
    ///
    /// `QUERYDECK_BACKEND_URL` is required; `QUERYDECK_BACKEND_TOKEN` is
    /// optional. Returns `None` when the URL is unset.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("QUERYDECK_BACKEND_URL").ok()?;
        let mut config = Self::new(base_url);
        config.api_token = std::env::var("QUERYDECK_BACKEND_TOKEN").ok();
        Some(config)
    }
}
