//! Client side of the stream protocol.
//!
//! Posts a [`ChatRequest`] to the proxy and reassembles the reply from the
//! frame stream. Reads may split frames anywhere; the [`FrameDecoder`] only
//! hands out complete lines. Cancellation is cooperative: the token is
//! checked while waiting for each read and before applying each frame, and
//! a cancelled turn returns what arrived so far as a success.

use futures::StreamExt;
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::client::credential::CredentialCache;
use crate::client::error::ConsumeError;
use crate::protocol::{ChatRequest, ErrorBody, FrameDecoder, MalformedFrame, StreamFrame};

/// How a streamed turn ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The stream ran to its end.
    Completed(String),
    /// The caller cancelled; carries the partial reply.
    Cancelled(String),
}

impl StreamOutcome {
    /// Accumulated reply text.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Completed(text) | Self::Cancelled(text) => text,
        }
    }

    /// Whether the turn was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

enum Step {
    Continue,
    Done,
}

/// Opens proxy streams and folds their frames into text.
#[derive(Clone)]
pub struct StreamConsumer {
    client: reqwest::Client,
    endpoint: Url,
    credentials: CredentialCache,
}

impl StreamConsumer {
    /// Create a consumer posting to `endpoint` (the proxy's `/api/chat`).
    #[must_use]
    pub const fn new(client: reqwest::Client, endpoint: Url, credentials: CredentialCache) -> Self {
        Self {
            client,
            endpoint,
            credentials,
        }
    }

    /// Stream one reply.
    ///
    /// `on_update` receives the accumulated text after every content frame,
    /// in arrival order.
    ///
    /// # Errors
    /// Returns [`ConsumeError::NoCredential`] (after clearing the cached
    /// credential) when the proxy reports a missing or rejected credential,
    /// [`ConsumeError::Upstream`] with the server's message for other error
    /// responses, and [`ConsumeError::Transport`] when the connection fails.
    pub async fn consume<F>(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
        mut on_update: F,
    ) -> Result<StreamOutcome, ConsumeError>
    where
        F: FnMut(&str),
    {
        let send = self.client.post(self.endpoint.clone()).json(request).send();
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(StreamOutcome::Cancelled(String::new())),
            response = send => response?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(self.error_from_response(status, response).await);
        }

        let mut body = response.bytes_stream();
        let mut decoder = FrameDecoder::new();
        let mut text = String::new();

        loop {
            let chunk = tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(StreamOutcome::Cancelled(text)),
                chunk = body.next() => chunk,
            };
            let Some(chunk) = chunk else { break };
            let chunk = chunk?;

            for frame in decoder.push(&chunk) {
                if cancel.is_cancelled() {
                    return Ok(StreamOutcome::Cancelled(text));
                }
                if let Step::Done = apply(frame, &mut text, &mut on_update) {
                    return Ok(StreamOutcome::Completed(text));
                }
            }
        }

        if let Some(frame) = decoder.finish() {
            apply(frame, &mut text, &mut on_update);
        }
        Ok(StreamOutcome::Completed(text))
    }

    async fn error_from_response(
        &self,
        status: StatusCode,
        response: reqwest::Response,
    ) -> ConsumeError {
        let raw = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<ErrorBody>(&raw).ok();

        if status == StatusCode::UNAUTHORIZED || body.as_ref().is_some_and(ErrorBody::is_credential_error) {
            warn!(%status, "Proxy rejected the credential, clearing the cached one");
            self.credentials.clear();
            return ConsumeError::NoCredential;
        }

        let message = match body {
            Some(body) => body.error,
            None if !raw.trim().is_empty() => raw,
            None => format!("Request failed with status {status}"),
        };
        ConsumeError::Upstream(message)
    }
}

fn apply<F: FnMut(&str)>(
    frame: Result<StreamFrame, MalformedFrame>,
    text: &mut String,
    on_update: &mut F,
) -> Step {
    match frame {
        Ok(StreamFrame::Content(delta)) => {
            text.push_str(&delta);
            on_update(text.as_str());
            Step::Continue
        }
        Ok(StreamFrame::Done) => Step::Done,
        Err(err) => {
            debug!(error = %err, "Skipping malformed frame");
            Step::Continue
        }
    }
}
