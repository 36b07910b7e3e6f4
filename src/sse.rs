// src/sse.rs

//! HTTP + Server-Sent Events transport.
//!
//! `GET /sse` opens a session and announces its message endpoint,
//! `POST /messages?sessionId=..` feeds JSON-RPC messages into that session and
//! replies travel back over the session's event stream. Every session runs its
//! own MCP server runtime with the same handler the stdio transport uses, fed
//! through a pair of in-memory pipes. Sessions live exactly as long as their
//! event stream.

use std::convert::Infallible;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
    routing::{get, post},
    Router,
};
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use rust_mcp_sdk::mcp_server::{server_runtime, ServerRuntime};
use rust_mcp_sdk::{McpServer, SseTransport, TransportOptions};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{duplex, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::handler::RazorpayServerHandler;
use crate::razorpay::RazorpayService;
use crate::server_details;

pub const DEFAULT_PORT: u16 = 3001;
pub const MESSAGES_PATH: &str = "/messages";
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);
const DUPLEX_BUFFER_SIZE: usize = 8192;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseOptions {
    pub host: String,
    pub port: u16,
}

impl Default for SseOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Writing half of a session's inbound pipe. Each line written is one
/// JSON-RPC message for that session's server runtime.
pub type SessionInbox = Arc<Mutex<DuplexStream>>;

/// Open SSE sessions, keyed by session id.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, SessionInbox>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh session delivering into `inbox`. It stays registered
    /// until the returned guard is dropped.
    pub fn open(&self, inbox: DuplexStream) -> SessionGuard {
        let id = Uuid::new_v4().to_string();
        self.sessions.insert(id.clone(), Arc::new(Mutex::new(inbox)));
        SessionGuard {
            id,
            registry: self.clone(),
        }
    }

    pub fn inbox(&self, session_id: &str) -> Option<SessionInbox> {
        self.sessions
            .get(session_id)
            .map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Removes its session from the registry when the event stream goes away.
/// Dropping the inbox ends the session's server runtime.
pub struct SessionGuard {
    id: String,
    registry: SessionRegistry,
}

impl SessionGuard {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.sessions.remove(&self.id);
        info!(session_id = %self.id, "Connection closed for session");
    }
}

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    service: RazorpayService,
    sessions: SessionRegistry,
    started_at: Instant,
}

impl AppState {
    pub fn new(service: RazorpayService) -> Self {
        Self {
            service,
            sessions: SessionRegistry::new(),
            started_at: Instant::now(),
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }
}

/// Create the Axum router for the SSE transport
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/sse", get(sse_handler))
        .route(MESSAGES_PATH, post(message_handler))
        .method_not_allowed_fallback(not_found_handler)
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "connections": state.sessions.len(),
        "uptime": state.started_at.elapsed().as_secs_f64(),
    }))
}

/// SSE endpoint - opens a session, starts its server and streams its replies
async fn sse_handler(State(state): State<AppState>) -> Response {
    // Client -> server messages
    let (inbox, read_rx) = duplex(DUPLEX_BUFFER_SIZE);
    // Server -> client messages
    let (write_tx, outbox) = duplex(DUPLEX_BUFFER_SIZE);

    let options = Arc::new(TransportOptions::default());
    let transport = match SseTransport::new(read_rx, write_tx, options) {
        Ok(transport) => transport,
        Err(e) => {
            error!("Failed to create session transport: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to open session" })),
            )
                .into_response();
        }
    };

    let guard = state.sessions.open(inbox);
    let session_id = guard.id().to_string();
    info!(%session_id, "New SSE connection established");

    let handler = RazorpayServerHandler::new(state.service.clone());
    let server: ServerRuntime = server_runtime::create_server(server_details(), transport, handler);
    let server_session = session_id.clone();
    tokio::spawn(async move {
        match server.start().await {
            Ok(()) => info!(session_id = %server_session, "Session server stopped"),
            Err(e) => warn!(session_id = %server_session, "Session server stopped: {}", e),
        }
    });

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("{MESSAGES_PATH}?sessionId={session_id}"));

    // The guard rides along with the stream so the session ends with it.
    let replies = stream::unfold(
        (BufReader::new(outbox), guard),
        |(mut outbox, guard)| async move {
            let mut line = String::new();
            match outbox.read_line(&mut line).await {
                Ok(0) | Err(_) => None,
                Ok(_) => {
                    let event = Event::default()
                        .event("message")
                        .data(line.trim_end_matches(['\r', '\n']));
                    Some((Ok::<_, Infallible>(event), (outbox, guard)))
                }
            }
        },
    );

    let stream = stream::once(async move { Ok(endpoint) }).chain(replies);
    Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
        .into_response()
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// Message endpoint - clients POST MCP requests here
async fn message_handler(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> Response {
    let Some(session_id) = query.session_id.filter(|id| !id.is_empty()) else {
        error!("Missing sessionId parameter");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing sessionId parameter" })),
        )
            .into_response();
    };

    info!(%session_id, "Processing message for session");

    let Some(inbox) = state.sessions.inbox(&session_id) else {
        warn!(%session_id, "No transport found for session");
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "No active connection found for this sessionId",
                "message": "Your connection may have timed out. Please reconnect to /sse endpoint."
            })),
        )
            .into_response();
    };

    let message: Value = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => {
            error!(%session_id, "Error processing message: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Error processing message",
                    "message": e.to_string()
                })),
            )
                .into_response();
        }
    };

    // Re-serialized compactly: the session reads one message per line.
    let line = format!("{message}\n");
    let mut inbox = inbox.lock().await;
    let delivered = match inbox.write_all(line.as_bytes()).await {
        Ok(()) => inbox.flush().await,
        Err(e) => Err(e),
    };
    if let Err(e) = delivered {
        error!(%session_id, "Error processing message: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Error processing message",
                "message": e.to_string()
            })),
        )
            .into_response();
    }

    (StatusCode::ACCEPTED, "Accepted").into_response()
}

async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Binds the listener and serves until a termination signal arrives. Open
/// sessions are dropped, not drained.
pub async fn serve(service: RazorpayService, options: &SseOptions) -> std::io::Result<()> {
    let listener = TcpListener::bind((options.host.as_str(), options.port)).await?;
    let addr = listener.local_addr()?;
    let app = router(AppState::new(service));

    info!("✅ Razorpay MCP SSE Server running on http://{}", addr);
    info!("Connect to SSE endpoint at http://{}/sse", addr);

    tokio::select! {
        result = axum::serve(listener, app).into_future() => result,
        _ = shutdown_signal() => {
            info!("Shutting down server...");
            Ok(())
        }
    }
}
