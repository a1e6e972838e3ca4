//! Locally cached credential and the startup credential check.

use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use crate::protocol::ConfigResponse;
use crate::store::{CREDENTIAL_KEY, RecordStore, StoreResult};

/// Credential the user entered directly, kept in its own record.
#[derive(Clone)]
pub struct CredentialCache {
    records: Arc<dyn RecordStore>,
}

impl CredentialCache {
    /// Wrap a record store.
    #[must_use]
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    /// Cached credential, if any. Read failures count as absent.
    #[must_use]
    pub fn get(&self) -> Option<String> {
        match self.records.get(CREDENTIAL_KEY) {
            Ok(value) => value.filter(|key| !key.trim().is_empty()),
            Err(err) => {
                warn!(error = %err, "Could not read cached credential");
                None
            }
        }
    }

    /// Remember a user-supplied credential.
    ///
    /// # Errors
    /// Returns an error if storage rejects the write.
    pub fn store(&self, credential: &str) -> StoreResult<()> {
        self.records.put(CREDENTIAL_KEY, credential.trim())
    }

    /// Forget the cached credential.
    pub fn clear(&self) {
        if let Err(err) = self.records.remove(CREDENTIAL_KEY) {
            warn!(error = %err, "Could not clear cached credential");
        }
    }
}

/// Where the credential for the next request comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialSource {
    /// The server holds its own credential; the client sends none.
    Server,
    /// The client sends its cached credential.
    Local(String),
    /// Nothing is available; the user has to enroll one.
    EnrollmentRequired,
}

impl CredentialSource {
    /// Credential to attach to a chat request.
    #[must_use]
    pub fn credential(&self) -> Option<&str> {
        match self {
            Self::Local(credential) => Some(credential),
            Self::Server | Self::EnrollmentRequired => None,
        }
    }

    /// Whether the user has to provide a credential.
    #[must_use]
    pub const fn needs_enrollment(&self) -> bool {
        matches!(self, Self::EnrollmentRequired)
    }
}

/// Fetch `GET /api/config`.
///
/// # Errors
/// Returns an error if the request fails or the body is not a config response.
pub async fn fetch_config(
    client: &reqwest::Client,
    config_url: Url,
) -> Result<ConfigResponse, reqwest::Error> {
    client
        .get(config_url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

/// Decide the credential source at startup.
///
/// The server's own credential wins. An unreachable config endpoint falls
/// through to the local cache.
pub async fn bootstrap(
    client: &reqwest::Client,
    config_url: Url,
    cache: &CredentialCache,
) -> CredentialSource {
    match fetch_config(client, config_url).await {
        Ok(config) if config.has_server_key => return CredentialSource::Server,
        Ok(_) => {}
        Err(err) => debug!(error = %err, "Config endpoint unavailable, checking local credential"),
    }
    cache
        .get()
        .map_or(CredentialSource::EnrollmentRequired, CredentialSource::Local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteRecordStore;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cache() -> CredentialCache {
        CredentialCache::new(Arc::new(SqliteRecordStore::in_memory().unwrap()))
    }

    async fn config_server(has_server_key: bool) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/config"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hasServerKey": has_server_key,
                "defaultModel": "deepseek-ai/DeepSeek-V3.1"
            })))
            .mount(&server)
            .await;
        server
    }

    fn config_url(server: &MockServer) -> Url {
        Url::parse(&format!("{}/api/config", server.uri())).unwrap()
    }

    #[test]
    fn test_cache_round_trip() {
        let cache = cache();
        assert_eq!(cache.get(), None);
        cache.store("  key-123 ").unwrap();
        assert_eq!(cache.get().as_deref(), Some("key-123"));
        cache.clear();
        assert_eq!(cache.get(), None);
    }

    #[tokio::test]
    async fn test_server_key_wins() {
        let server = config_server(true).await;
        let cache = cache();
        cache.store("local").unwrap();
        let source = bootstrap(&reqwest::Client::new(), config_url(&server), &cache).await;
        assert_eq!(source, CredentialSource::Server);
        assert_eq!(source.credential(), None);
    }

    #[tokio::test]
    async fn test_local_key_when_server_has_none() {
        let server = config_server(false).await;
        let cache = cache();
        cache.store("local").unwrap();
        let source = bootstrap(&reqwest::Client::new(), config_url(&server), &cache).await;
        assert_eq!(source, CredentialSource::Local("local".to_string()));
        assert_eq!(source.credential(), Some("local"));
    }

    #[tokio::test]
    async fn test_unreachable_config_falls_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let source = bootstrap(&reqwest::Client::new(), config_url(&server), &cache()).await;
        assert!(source.needs_enrollment());
    }
}
