//! HTTP route handlers for the undox API.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;

use crate::protocol::{ChatRequest, ConfigResponse, ErrorBody};
use crate::proxy::ProxyError;
use crate::wallet::{Chain, WalletQuery, settle};

use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat_stream))
        .route("/api/config", get(client_config))
        .route("/api/wallet", get(wallet_lookup))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "undox",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Stream a reply as `data:` frames.
///
/// Errors raised before the upstream answers, including an unreadable
/// request body, become JSON error responses.
/// An error after that point aborts the body, which closes the connection.
async fn chat_stream(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ProxyError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return Ok(bad_request(&rejection.body_text())),
    };
    let frames = state.proxy.open(request).await?;
    let body = Body::from_stream(frames.map(|frame| frame.map(|frame| frame.encode())));
    Ok((
        [
            (CONTENT_TYPE, "text/event-stream"),
            (CACHE_CONTROL, "no-cache"),
            (CONNECTION, "keep-alive"),
        ],
        body,
    )
        .into_response())
}

/// Tell clients whether they need to supply a credential.
async fn client_config(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        has_server_key: state.proxy.has_server_credential(),
        default_model: state.proxy.model().to_string(),
    })
}

/// Look up one wallet. RPC failures are reported inside a 200 result.
async fn wallet_lookup(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let param = |name: &str| params.get(name).filter(|value| !value.is_empty());
    let (Some(address), Some(chain)) = (param("address"), param("chain")) else {
        return bad_request("Missing address or chain");
    };
    let Ok(chain) = chain.parse::<Chain>() else {
        return bad_request("Unsupported chain");
    };

    let query = WalletQuery::new(address.as_str(), chain);
    let result = settle(state.wallets.as_ref(), &query, state.wallet_timeout).await;
    Json(result).into_response()
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorBody::new(message))).into_response()
}
