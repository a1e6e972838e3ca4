//! Streaming client for the OpenAI-compatible upstream model.

use std::pin::Pin;

use futures::{Stream, StreamExt};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::protocol::LineBuffer;
use crate::proxy::config::ProxyConfig;
use crate::proxy::error::{ProxyError, ProxyResult};

/// Boxed stream of upstream text deltas.
pub type DeltaStream = Pin<Box<dyn Stream<Item = ProxyResult<String>> + Send>>;

/// One message as sent upstream, including the system role.
#[derive(Clone, Debug, Serialize)]
pub struct UpstreamMessage<'a> {
    /// `system`, `user` or `assistant`.
    pub role: &'a str,
    /// Message text.
    pub content: &'a str,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [UpstreamMessage<'a>],
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct UpstreamErrorBody {
    error: UpstreamErrorDetail,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UpstreamErrorDetail {
    Object { message: String },
    Text(String),
}

/// HTTP client for `POST {base}/chat/completions` with `stream: true`.
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl UpstreamClient {
    /// Build a client from the proxy configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ProxyConfig) -> ProxyResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;
        let endpoint = format!("{}/chat/completions", config.upstream_url.trim_end_matches('/'));
        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
        })
    }

    /// Model requested upstream.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Open a streaming completion and return its text deltas.
    ///
    /// Failures before the response headers arrive are returned directly.
    /// Failures afterwards surface as an `Err` item that ends the stream.
    ///
    /// # Errors
    /// Returns an error if the request fails or the upstream answers with a
    /// non-success status.
    pub async fn stream_completion(
        &self,
        credential: &str,
        messages: &[UpstreamMessage<'_>],
    ) -> ProxyResult<DeltaStream> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            stream: true,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ProxyError::InvalidCredential);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProxyError::UpstreamStatus {
                status: status.as_u16(),
                message: upstream_error_message(&body),
            });
        }

        let mut bytes = response.bytes_stream();
        let deltas = async_stream::try_stream! {
            let mut lines = LineBuffer::new();
            'read: while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(ProxyError::from)?;
                for line in lines.push(&chunk) {
                    match parse_upstream_line(&line) {
                        UpstreamLine::Delta(text) => yield text,
                        UpstreamLine::Done => break 'read,
                        UpstreamLine::Skip => {}
                    }
                }
            }
            if let Some(UpstreamLine::Delta(text)) = lines.finish().map(|line| parse_upstream_line(&line)) {
                yield text;
            }
        };

        Ok(Box::pin(deltas))
    }
}

#[derive(Debug, PartialEq, Eq)]
enum UpstreamLine {
    Delta(String),
    Done,
    Skip,
}

fn parse_upstream_line(line: &str) -> UpstreamLine {
    let Some(data) = line.strip_prefix("data:") else {
        return UpstreamLine::Skip;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return UpstreamLine::Done;
    }
    match serde_json::from_str::<CompletionChunk>(data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .map_or(UpstreamLine::Skip, UpstreamLine::Delta),
        Err(err) => {
            tracing::debug!(%err, "skipping undecodable upstream chunk");
            UpstreamLine::Skip
        }
    }
}

fn upstream_error_message(body: &str) -> String {
    match serde_json::from_str::<UpstreamErrorBody>(body) {
        Ok(UpstreamErrorBody {
            error: UpstreamErrorDetail::Object { message } | UpstreamErrorDetail::Text(message),
        }) => message,
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sse(chunks: &[&str]) -> String {
        let mut body = String::new();
        for chunk in chunks {
            body.push_str(&format!(
                "data: {}\n\n",
                serde_json::json!({"choices": [{"delta": {"content": chunk}}]})
            ));
        }
        body.push_str("data: [DONE]\n\n");
        body
    }

    fn client_for(server: &MockServer) -> UpstreamClient {
        let config = ProxyConfig::new()
            .with_upstream_url(format!("{}/v1", server.uri()))
            .with_model("test-model");
        UpstreamClient::new(&config).unwrap()
    }

    #[test]
    fn test_parse_upstream_line() {
        assert_eq!(
            parse_upstream_line(r#"data: {"choices":[{"delta":{"content":"hi"}}]}"#),
            UpstreamLine::Delta("hi".to_string())
        );
        assert_eq!(
            parse_upstream_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#),
            UpstreamLine::Skip
        );
        assert_eq!(parse_upstream_line("data: [DONE]"), UpstreamLine::Done);
        assert_eq!(parse_upstream_line(": ping"), UpstreamLine::Skip);
        assert_eq!(parse_upstream_line("data: {broken"), UpstreamLine::Skip);
    }

    #[test]
    fn test_upstream_error_message() {
        assert_eq!(upstream_error_message(r#"{"error":{"message":"quota"}}"#), "quota");
        assert_eq!(upstream_error_message(r#"{"error":"plain"}"#), "plain");
        assert_eq!(upstream_error_message("gateway down"), "gateway down");
    }

    #[tokio::test]
    async fn test_stream_completion_yields_deltas() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({"model": "test-model", "stream": true})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(sse(&["Hel", "", "lo"]), "text/event-stream"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let messages = [UpstreamMessage {
            role: "user",
            content: "hi",
        }];
        let stream = client.stream_completion("sk-test", &messages).await.unwrap();
        let deltas: Vec<String> = stream.map(Result::unwrap).collect().await;
        assert_eq!(deltas, vec!["Hel", "", "lo"]);
    }

    #[tokio::test]
    async fn test_rejected_credential() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.stream_completion("bad", &[]).await;
        assert!(matches!(result, Err(ProxyError::InvalidCredential)));
    }

    #[tokio::test]
    async fn test_upstream_failure_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(503)
                    .set_body_json(serde_json::json!({"error": {"message": "overloaded"}})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        match client.stream_completion("sk", &[]).await {
            Err(ProxyError::UpstreamStatus { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "overloaded");
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected failure"),
        }
    }
}
