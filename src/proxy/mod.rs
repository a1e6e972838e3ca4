//! Stateless stream proxy between chat clients and the upstream model.
//!
//! Each call resolves a credential, prepends the category's system prompt and
//! relays upstream token deltas 1:1 as [`StreamFrame`]s, closing with
//! [`StreamFrame::Done`]. Nothing is shared between calls except the
//! immutable configuration.

pub mod config;
pub mod error;
pub mod upstream;

pub use config::ProxyConfig;
pub use error::{ProxyError, ProxyResult};
pub use upstream::{DeltaStream, UpstreamClient, UpstreamMessage};

use std::pin::Pin;

use futures::{Stream, StreamExt};

use crate::chat::Category;
use crate::protocol::{ChatRequest, StreamFrame};

/// Boxed stream of frames ready to be written to the client.
pub type FrameStream = Pin<Box<dyn Stream<Item = ProxyResult<StreamFrame>> + Send>>;

/// Stateless proxy that turns a chat request into a frame stream.
#[derive(Clone)]
pub struct StreamProxy {
    upstream: UpstreamClient,
    server_credential: Option<String>,
}

impl StreamProxy {
    /// Build a proxy from configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &ProxyConfig) -> ProxyResult<Self> {
        config.validate()?;
        Ok(Self {
            upstream: UpstreamClient::new(config)?,
            server_credential: config.server_credential.clone(),
        })
    }

    /// Whether the server process holds a credential.
    #[must_use]
    pub const fn has_server_credential(&self) -> bool {
        self.server_credential.is_some()
    }

    /// Model requested upstream.
    #[must_use]
    pub fn model(&self) -> &str {
        self.upstream.model()
    }

    /// Pick the credential for one call: caller first, then server.
    ///
    /// Blank strings count as absent.
    #[must_use]
    pub fn resolve_credential<'a>(&'a self, supplied: Option<&'a str>) -> Option<&'a str> {
        supplied
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .or(self.server_credential.as_deref())
    }

    /// Open a stream for `request`.
    ///
    /// The credential is checked first, so a caller without one always gets
    /// [`ProxyError::NoCredential`] whatever else is wrong with the request.
    ///
    /// # Errors
    /// - [`ProxyError::NoCredential`] when no credential can be resolved.
    /// - [`ProxyError::UnknownCategory`] when the category is not recognised.
    /// - Upstream errors raised before the first byte of the response.
    pub async fn open(&self, request: ChatRequest) -> ProxyResult<FrameStream> {
        let credential = self
            .resolve_credential(request.credential.as_deref())
            .ok_or(ProxyError::NoCredential)?;
        let category: Category = request.category.parse()?;

        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(UpstreamMessage {
            role: "system",
            content: category.system_prompt(),
        });
        messages.extend(request.messages.iter().map(|message| UpstreamMessage {
            role: message.role.as_str(),
            content: &message.content,
        }));

        tracing::debug!(
            %category,
            turns = request.messages.len(),
            "opening upstream stream"
        );
        let deltas = self.upstream.stream_completion(credential, &messages).await?;
        Ok(Box::pin(into_frames(deltas)))
    }
}

/// Map upstream deltas to frames: drop empty deltas, append the terminal frame.
///
/// An upstream error ends the stream without a terminal frame.
fn into_frames(mut deltas: DeltaStream) -> impl Stream<Item = ProxyResult<StreamFrame>> + Send {
    async_stream::stream! {
        while let Some(delta) = deltas.next().await {
            match delta {
                Ok(text) if text.is_empty() => {}
                Ok(text) => yield Ok(StreamFrame::Content(text)),
                Err(err) => {
                    tracing::warn!(%err, "upstream stream failed mid-response");
                    yield Err(err);
                    return;
                }
            }
        }
        yield Ok(StreamFrame::Done);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Role;
    use crate::protocol::WireMessage;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(category: &str, credential: Option<&str>) -> ChatRequest {
        ChatRequest {
            messages: vec![
                WireMessage::new(Role::User, "first"),
                WireMessage::new(Role::Assistant, "reply"),
                WireMessage::new(Role::User, "second"),
            ],
            category: category.to_string(),
            credential: credential.map(str::to_string),
        }
    }

    fn proxy(upstream: &str, server_key: Option<&str>) -> StreamProxy {
        let mut config = ProxyConfig::new().with_upstream_url(upstream);
        config.server_credential = server_key.map(str::to_string);
        StreamProxy::new(&config).unwrap()
    }

    #[test]
    fn test_credential_resolution_order() {
        let with_server = proxy("http://localhost:1", Some("server"));
        assert_eq!(with_server.resolve_credential(Some("caller")), Some("caller"));
        assert_eq!(with_server.resolve_credential(Some("  ")), Some("server"));
        assert_eq!(with_server.resolve_credential(None), Some("server"));

        let without = proxy("http://localhost:1", None);
        assert_eq!(without.resolve_credential(Some("caller")), Some("caller"));
        assert_eq!(without.resolve_credential(None), None);
    }

    #[tokio::test]
    async fn test_no_credential_is_distinguished() {
        let proxy = proxy("http://localhost:1", None);
        let result = proxy.open(request("general", None)).await;
        assert!(matches!(result, Err(ProxyError::NoCredential)));
    }

    #[tokio::test]
    async fn test_missing_credential_wins_over_unknown_category() {
        let proxy = proxy("http://localhost:1", None);
        let result = proxy.open(request("astrology", None)).await;
        assert!(matches!(result, Err(ProxyError::NoCredential)));
    }

    #[tokio::test]
    async fn test_unknown_category_is_rejected() {
        let proxy = proxy("http://localhost:1", Some("server"));
        let result = proxy.open(request("astrology", None)).await;
        assert!(matches!(result, Err(ProxyError::UnknownCategory(_))));
    }

    #[tokio::test]
    async fn test_frames_follow_deltas() {
        let server = MockServer::start().await;
        let body = [
            r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#,
            r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#,
            r#"data: {"choices":[{"delta":{"content":""}}]}"#,
            r#"data: {"choices":[{"delta":{"content":" there"}}]}"#,
            "data: [DONE]",
        ]
        .join("\n\n");
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer caller-key"))
            .and(body_partial_json(serde_json::json!({
                "messages": [
                    {"role": "system", "content": Category::Health.system_prompt()},
                    {"role": "user", "content": "first"},
                    {"role": "assistant", "content": "reply"},
                    {"role": "user", "content": "second"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let proxy = proxy(&server.uri(), Some("server-key"));
        let stream = proxy
            .open(request("health", Some("caller-key")))
            .await
            .unwrap();
        let frames: Vec<StreamFrame> = stream.map(Result::unwrap).collect().await;
        assert_eq!(
            frames,
            vec![
                StreamFrame::Content("Hi".to_string()),
                StreamFrame::Content(" there".to_string()),
                StreamFrame::Done,
            ]
        );
    }
}
