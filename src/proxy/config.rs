//! Configuration for the stream proxy.

use std::time::Duration;

use url::Url;

use crate::proxy::error::{ProxyError, ProxyResult};

/// Environment variable holding the server-side credential.
pub const API_KEY_ENV: &str = "NEAR_AI_API_KEY";
/// Environment variable overriding the model.
pub const MODEL_ENV: &str = "NEAR_AI_MODEL";
/// Environment variable overriding the upstream base URL.
pub const UPSTREAM_URL_ENV: &str = "UNDOX_UPSTREAM_URL";

/// Default model name.
pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-V3.1";
/// Default OpenAI-compatible upstream.
pub const DEFAULT_UPSTREAM_URL: &str = "https://cloud-api.near.ai/v1";

/// Configuration for the stream proxy.
#[derive(Clone, Debug)]
pub struct ProxyConfig {
    /// Credential configured on the server process, if any.
    pub server_credential: Option<String>,
    /// Model requested from the upstream.
    pub model: String,
    /// Base URL of the OpenAI-compatible upstream (without `/chat/completions`).
    pub upstream_url: String,
    /// Connection timeout towards the upstream.
    pub connect_timeout: Duration,
    /// Upper bound on a whole streamed completion.
    pub request_timeout: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            server_credential: None,
            model: DEFAULT_MODEL.to_string(),
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
        }
    }
}

impl ProxyConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the config from the process environment.
    ///
    /// Empty variables count as unset.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.server_credential = non_empty_env(API_KEY_ENV);
        if let Some(model) = non_empty_env(MODEL_ENV) {
            config.model = model;
        }
        if let Some(url) = non_empty_env(UPSTREAM_URL_ENV) {
            config.upstream_url = url;
        }
        config
    }

    /// Set the server credential.
    #[must_use]
    pub fn with_server_credential(mut self, credential: impl Into<String>) -> Self {
        self.server_credential = Some(credential.into());
        self
    }

    /// Set the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the upstream base URL.
    #[must_use]
    pub fn with_upstream_url(mut self, url: impl Into<String>) -> Self {
        self.upstream_url = url.into();
        self
    }

    /// Whether a server-side credential is configured.
    #[must_use]
    pub fn has_server_credential(&self) -> bool {
        self.server_credential.is_some()
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if the model is empty or the upstream URL does not parse.
    pub fn validate(&self) -> ProxyResult<()> {
        if self.model.trim().is_empty() {
            return Err(ProxyError::Config("model must not be empty".to_string()));
        }
        Url::parse(&self.upstream_url)
            .map_err(|err| ProxyError::Config(format!("invalid upstream url: {err}")))?;
        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProxyConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(!config.has_server_credential());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ProxyConfig::new()
            .with_server_credential("sk")
            .with_model("glm")
            .with_upstream_url("http://localhost:9999/v1");
        assert!(config.has_server_credential());
        assert_eq!(config.model, "glm");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_upstream_url() {
        let config = ProxyConfig::new().with_upstream_url("not a url");
        assert!(matches!(config.validate(), Err(ProxyError::Config(_))));
    }
}
