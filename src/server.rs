//! Local HTTP API consumed by the desktop front end.
//!
//! The server owns one [`SessionState`] and exposes folder ingestion and
//! chat over JSON. Every endpoint that accepts a folder path applies the
//! same sandbox check before touching the filesystem.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version) |
//! | `POST`   | `/api/path` | Validate and scan a folder, make it the active folder |
//! | `POST`   | `/api/source/device` | Same as `/api/path`, also accepts a browser picker selection |
//! | `POST`   | `/api/chat` | Submit a message to the answering service |
//! | `GET`    | `/api/chat/history` | Full conversation log |
//! | `DELETE` | `/api/chat/history` | Reset the conversation |
//! | `GET`    | `/api/folder` | Active folder record, or `null` |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "Invalid request: Path is required" } }
//! ```
//!
//! Error codes: `bad_request` (400) for validation, directory failures, and
//! request bodies that are not the expected JSON,
//! `remote_*` (502) for answering-service failures, one code per category.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted; the desktop shell loads
//! the front end from a different origin than this server.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use accobot_core::answering::AnsweringService;
use accobot_core::models::{ConversationMessage, FolderRecord};

use crate::client::HttpAnsweringService;
use crate::config::Config;
use crate::error::{SubmitError, ValidationError};
use crate::ingest;
use crate::picker::FolderSelection;
use crate::sandbox::Sandbox;
use crate::session::SessionState;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionState>,
    pub answering: Arc<dyn AnsweringService>,
    pub sandbox: Arc<Sandbox>,
}

impl AppState {
    pub fn new(config: &Config, answering: Arc<dyn AnsweringService>) -> Self {
        Self {
            session: Arc::new(SessionState::from_config(config)),
            answering,
            sandbox: Arc::new(Sandbox::new(&config.sandbox.root)),
        }
    }
}

/// Starts the server on `[server].bind` with the HTTP answering client.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let answering = Arc::new(HttpAnsweringService::from_config(config)?);
    info!(remote = %answering.url(), "answering service configured");
    let state = AppState::new(config, answering);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(
        bind = %config.server.bind,
        sandbox = %state.sandbox.root().display(),
        "accobot server listening"
    );
    axum::serve(listener, router(state)).await?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/path", post(handle_folder_path))
        .route("/api/source/device", post(handle_device_source))
        .route("/api/chat", post(handle_chat))
        .route(
            "/api/chat/history",
            get(handle_history).delete(handle_reset),
        )
        .route("/api/folder", get(handle_folder))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        bad_request(format!("Invalid request: {}", err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(format!("Invalid request: {}", rejection.body_text()))
    }
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Validation(e) => e.into(),
            SubmitError::Remote(e) => {
                let kind = e.kind();
                AppError {
                    status: StatusCode::BAD_GATEWAY,
                    code: kind.code().to_string(),
                    message: kind.user_message().to_string(),
                }
            }
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/path, /api/source/device ============

#[derive(Deserialize)]
struct PathRequest {
    #[serde(default)]
    path: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PathResponse {
    success: bool,
    message: String,
    folder_path: String,
    xml_files_count: usize,
    valid_count: usize,
    invalid_count: usize,
}

async fn handle_folder_path(
    State(state): State<AppState>,
    payload: Result<Json<PathRequest>, JsonRejection>,
) -> Result<Json<PathResponse>, AppError> {
    let Json(req) = payload?;
    accept_folder(&state, &req.path).await.map(Json)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceRequest {
    #[serde(default)]
    path: Option<String>,
    /// Relative file paths from a browser directory input.
    #[serde(default)]
    relative_paths: Vec<String>,
}

impl DeviceRequest {
    fn selection(self) -> FolderSelection {
        match self.path.filter(|p| !p.trim().is_empty()) {
            Some(path) => FolderSelection::Native(Some(path.into())),
            None => FolderSelection::Browser(self.relative_paths),
        }
    }
}

async fn handle_device_source(
    State(state): State<AppState>,
    payload: Result<Json<DeviceRequest>, JsonRejection>,
) -> Result<Json<PathResponse>, AppError> {
    let Json(req) = payload?;
    let raw = req.selection().resolve().unwrap_or_default();
    accept_folder(&state, &raw).await.map(Json)
}

/// Sandbox check, directory check, scan, and store as the active folder.
async fn accept_folder(state: &AppState, raw: &str) -> Result<PathResponse, AppError> {
    let path = state.sandbox.check(raw)?;
    ingest::check_directory(&path)
        .await
        .map_err(|e| bad_request(e.to_string()))?;

    let record = ingest::scan_folder(&path).await;
    let response = PathResponse {
        success: true,
        message: format!(
            "Folder path accepted. Found {} XML files.",
            record.files().len()
        ),
        folder_path: record.path().to_string(),
        xml_files_count: record.files().len(),
        valid_count: record.valid_count(),
        invalid_count: record.invalid_count(),
    };
    state.session.record_scan(record);

    Ok(response)
}

// ============ POST /api/chat ============

#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatResponse {
    success: bool,
    user_message: ConversationMessage,
    bot_response: ConversationMessage,
}

async fn handle_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(req) = payload?;
    let turn = state
        .session
        .submit(state.answering.as_ref(), &req.message)
        .await?;
    Ok(Json(ChatResponse {
        success: true,
        user_message: turn.user,
        bot_response: turn.assistant,
    }))
}

// ============ /api/chat/history ============

#[derive(Serialize)]
struct HistoryResponse {
    success: bool,
    messages: Vec<ConversationMessage>,
}

async fn handle_history(State(state): State<AppState>) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        success: true,
        messages: state.session.messages(),
    })
}

async fn handle_reset(State(state): State<AppState>) -> Json<HistoryResponse> {
    state.session.reset();
    handle_history(State(state)).await
}

// ============ GET /api/folder ============

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FolderResponse {
    success: bool,
    folder_info: Option<FolderRecord>,
}

async fn handle_folder(State(state): State<AppState>) -> Json<FolderResponse> {
    Json(FolderResponse {
        success: true,
        folder_info: state.session.folder(),
    })
}
