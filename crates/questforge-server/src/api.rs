//! HTTP API for the QuestForge backend.
//!
//! Thin JSON handlers over the chat service: a session context is created
//! per request scope, handed through the service, and discarded when the
//! response goes out. Client-held history travels inside the chat request
//! body, so the handlers themselves stay stateless.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use questforge_core::core_types::{AdventureInfo, ChatRequest, ChatResult};
use questforge_core::errors::EngineError;
use questforge_core::{ChatService, SessionContext, UserService};

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub users: Arc<UserService>,
}

type HandlerResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: chrono::DateTime<chrono::Utc>,
    version: String,
}

#[derive(Deserialize)]
struct CredentialsBody {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct ChatBody {
    adventure: AdventureInfo,
    request: ChatRequest,
}

#[derive(Deserialize)]
struct StartChatBody {
    adventure: AdventureInfo,
    username: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/chat", post(chat_handler))
        .route("/chat/start", post(start_chat_handler))
        .route("/world-builder/start", post(start_world_builder_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .with_state(state)
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> HandlerResult {
    log::info!("registration request for {}", body.username);
    match state.users.register(&body.username, &body.password).await {
        Ok(()) => Ok(Json(json!({
            "status": "success",
            "username": body.username.to_lowercase(),
            "timestamp": chrono::Utc::now()
        }))),
        Err(e) => Err(error_response(e)),
    }
}

async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> HandlerResult {
    match state.users.login(&body.username, &body.password).await {
        Ok(success) => {
            log::info!(
                "login for {}: {}",
                body.username,
                if success { "accepted" } else { "rejected" }
            );
            Ok(Json(json!({
                "success": success,
                "timestamp": chrono::Utc::now()
            })))
        }
        Err(e) => Err(error_response(e)),
    }
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(body): Json<ChatBody>,
) -> HandlerResult {
    let mut context = SessionContext::new();
    let cancel = CancellationToken::new();

    match state
        .chat
        .chat(&body.adventure, body.request, &mut context, &cancel)
        .await
    {
        Ok(result) => Ok(chat_result_json(result)),
        Err(e) => Err(error_response(e)),
    }
}

async fn start_chat_handler(
    State(state): State<AppState>,
    Json(body): Json<StartChatBody>,
) -> HandlerResult {
    let mut context = SessionContext::new();
    let cancel = CancellationToken::new();

    match state
        .chat
        .start_chat(&body.adventure, &body.username, &mut context, &cancel)
        .await
    {
        Ok(result) => Ok(chat_result_json(result)),
        Err(e) => Err(error_response(e)),
    }
}

async fn start_world_builder_handler(
    State(state): State<AppState>,
    Json(body): Json<StartChatBody>,
) -> HandlerResult {
    let mut context = SessionContext::new();
    let cancel = CancellationToken::new();

    match state
        .chat
        .start_world_builder_chat(&body.adventure, &body.username, &mut context, &cancel)
        .await
    {
        Ok(result) => Ok(chat_result_json(result)),
        Err(e) => Err(error_response(e)),
    }
}

fn chat_result_json(result: ChatResult) -> Json<Value> {
    Json(serde_json::to_value(result).unwrap_or_else(|_| json!({"error": "serialization failed"})))
}

fn error_response(error: EngineError) -> (StatusCode, Json<Value>) {
    let status = match &error {
        EngineError::Validation(_)
        | EngineError::PayloadMismatch { .. }
        | EngineError::Parsing(_) => StatusCode::BAD_REQUEST,
        EngineError::Config(_) | EngineError::NotInitialized(_) | EngineError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        EngineError::Endpoint(_)
        | EngineError::ContentModeration(_)
        | EngineError::ToolLoopExceeded { .. }
        | EngineError::Tool { .. } => StatusCode::BAD_GATEWAY,
        EngineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::Cancelled => StatusCode::REQUEST_TIMEOUT,
    };

    log::error!("request failed: {}", error);
    (
        status,
        Json(json!({
            "error": error.to_string(),
            "timestamp": chrono::Utc::now()
        })),
    )
}
