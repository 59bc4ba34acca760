//! HTTP routes
//!
//! Thin adapters between the `/api/v2/tunnel/*` surface and [`Relay`].
//! Every response carries permissive CORS headers, and any `OPTIONS`
//! request is answered with `200` before routing.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, Request, State},
    http::{header, Method, StatusCode},
    middleware::{self, Next},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::{Stream, StreamExt};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::pubsub::Relay;
use crate::registry::{normalize_subchannel, ChannelKey, RelayError};
use crate::session::SubscriberStream;

use super::error::{ApiError, ApiResult};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// Relay shared by every handler
    pub relay: Arc<Relay>,
    /// Cancelled when the server shuts down; ends open streams
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Create handler state
    pub fn new(relay: Arc<Relay>, shutdown: CancellationToken) -> Self {
        Self { relay, shutdown }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/api/v2/tunnel/create", post(create_tunnel))
        .route("/api/v2/tunnel/checkRoomExists", get(check_room_exists))
        .route("/api/v2/tunnel/stream", get(stream_tunnel))
        .route("/api/v2/tunnel/send", post(send_to_tunnel))
        .route("/api/v2/tunnel/messages", get(get_messages))
        .route("/api/v2/tunnel/content", get(get_content))
        .layer(middleware::from_fn(answer_options))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn answer_options(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}

#[derive(Debug, Deserialize)]
struct CreateRequest {
    #[serde(default)]
    id: String,
}

#[derive(Debug, Serialize)]
struct CreateResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SendRequest {
    #[serde(default)]
    id: String,
    #[serde(default)]
    content: String,
    #[serde(default, rename = "subChannel")]
    sub_channel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelQuery {
    id: Option<String>,
    #[serde(rename = "subChannel")]
    sub_channel: Option<String>,
}

impl ChannelQuery {
    fn key(self) -> ApiResult<ChannelKey> {
        let subchannel = normalize_subchannel(self.sub_channel.as_deref()).to_string();
        Ok(ChannelKey::new(required_id(self.id)?, subchannel))
    }
}

#[derive(Debug, Serialize)]
struct ExistsResponse {
    exists: bool,
}

fn required_id(id: Option<String>) -> ApiResult<String> {
    match id {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(RelayError::InvalidArgument("tunnel id").into()),
    }
}

/// Request bodies are parsed regardless of `Content-Type`.
fn parse_json<T: DeserializeOwned>(body: &Bytes) -> ApiResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Failed to parse JSON: {}", e)))
}

/// SSE cannot carry bare carriage returns
fn sse_event(content: &str) -> Event {
    if content.contains('\r') {
        Event::default().data(content.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Event::default().data(content)
    }
}

async fn home() -> &'static str {
    "Welcome to the TXTTunnel homepage!"
}

async fn create_tunnel(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<CreateResponse>> {
    let request: CreateRequest = parse_json(&body)?;
    let id = state.relay.create(&request.id)?;
    Ok(Json(CreateResponse { id }))
}

async fn check_room_exists(
    State(state): State<AppState>,
    query: Result<Query<ChannelQuery>, QueryRejection>,
) -> ApiResult<Json<ExistsResponse>> {
    let Query(query) = query?;
    let id = required_id(query.id)?;
    Ok(Json(ExistsResponse {
        exists: state.relay.exists(&id),
    }))
}

async fn stream_tunnel(
    State(state): State<AppState>,
    query: Result<Query<ChannelQuery>, QueryRejection>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let Query(query) = query?;
    let key = query.key()?;

    let stream = SubscriberStream::open(
        Arc::clone(&state.relay),
        &key,
        state.shutdown.child_token(),
    )?;
    tracing::info!(channel = %stream.key(), "Stream opened");

    let events = stream
        .into_stream()
        .map(|content| Ok(sse_event(&content)));
    Ok(Sse::new(events))
}

async fn send_to_tunnel(State(state): State<AppState>, body: Bytes) -> ApiResult<String> {
    let request: SendRequest = parse_json(&body)?;
    let subchannel = normalize_subchannel(request.sub_channel.as_deref()).to_string();
    let key = ChannelKey::new(request.id.clone(), subchannel);

    state.relay.send(&key, &request.content)?;

    Ok(format!("Tunnel {} has been updated.", request.id))
}

async fn get_messages(
    State(state): State<AppState>,
    query: Result<Query<ChannelQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let id = required_id(query.id)?;

    let messages = state.relay.messages(&id)?;
    let body = serde_json::to_string(&messages).map_err(RelayError::from)?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

async fn get_content(
    State(state): State<AppState>,
    query: Result<Query<ChannelQuery>, QueryRejection>,
) -> ApiResult<String> {
    let Query(query) = query?;
    let key = query.key()?;

    state
        .relay
        .content(&key)?
        .ok_or_else(|| ApiError::not_found("Nothing has been published to this subchannel."))
}
