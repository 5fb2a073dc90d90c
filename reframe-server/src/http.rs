//! HTTP surface for the experiment server.
//!
//! Thin axum handlers delegating to the orchestrator. Endpoints:
//! - GET  /                 — redirect to the chat page
//! - GET  /chat.html        — embedded chat page
//! - GET  /start-chat       — create a session from survey-platform params
//! - GET  /get-instructions — arm-specific opening question
//! - POST /send-message     — one conversation exchange

use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use reframe_core::config::ServiceConfig;
use reframe_core::error::ReframeError;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::orchestrator::Orchestrator;

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// Build the axum router with all endpoints
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/chat.html", get(chat_page_handler))
        .route("/start-chat", get(start_chat_handler))
        .route("/get-instructions", get(get_instructions_handler))
        .route("/send-message", post(send_message_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    state: Arc<AppState>,
    service: &ServiceConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", service.host, service.port);

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Reframe experiment server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request / Response DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartChatParams {
    pub respondent: Option<String>,
    #[serde(rename = "beliefLevel")]
    pub belief_level: Option<String>,
    #[serde(rename = "conspiracyTheory")]
    pub conspiracy_theory: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RespondentParams {
    pub respondent: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub respondent: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub message: String,
    pub finished: bool,
}

/// Standard HTTP error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

/// Map the error taxonomy onto status codes: missing parameter → 400,
/// unknown session → 404, everything else (upstream included) → 500.
pub fn error_response(err: &ReframeError) -> Response {
    let status = match err {
        ReframeError::MissingParameter(_) => StatusCode::BAD_REQUEST,
        ReframeError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse::new(err.to_string()))).into_response()
}

// ============================================================================
// Handlers
// ============================================================================

async fn root_handler() -> Redirect {
    Redirect::to("/chat.html")
}

async fn chat_page_handler() -> Html<&'static str> {
    Html(include_str!("../assets/chat.html"))
}

/// Entry point for the survey platform: creates (or resets) the session and
/// forwards the respondent to the chat page.
async fn start_chat_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StartChatParams>,
) -> Response {
    let result = state
        .orchestrator
        .start(
            params.respondent.as_deref().unwrap_or(""),
            params.belief_level.as_deref().unwrap_or(""),
            params.conspiracy_theory.as_deref().unwrap_or(""),
        )
        .await;

    match result {
        Ok(session) => {
            let encoded: String =
                url::form_urlencoded::byte_serialize(session.respondent_id.as_bytes()).collect();
            Redirect::to(&format!("/chat.html?respondent={encoded}")).into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn get_instructions_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RespondentParams>,
) -> Response {
    let result = state
        .orchestrator
        .instructions(params.respondent.as_deref().unwrap_or(""))
        .await;

    match result {
        Ok(instructions) => {
            (StatusCode::OK, Json(serde_json::json!({ "instructions": instructions })))
                .into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn send_message_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendMessageRequest>,
) -> Response {
    let result = state
        .orchestrator
        .send_message(
            req.respondent.as_deref().unwrap_or(""),
            req.message.as_deref().unwrap_or(""),
        )
        .await;

    match result {
        Ok(outcome) => (
            StatusCode::OK,
            Json(SendMessageResponse {
                message: outcome.message,
                finished: outcome.finished,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "send-message failed");
            error_response(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_status_mapping() {
        let resp = error_response(&ReframeError::MissingParameter("respondent"));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = error_response(&ReframeError::SessionNotFound("r1".to_string()));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = error_response(&ReframeError::Upstream(
            reframe_core::chat::ChatError::EmptyCompletion,
        ));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_response_body_shape() {
        let body = serde_json::to_value(ErrorResponse::new("boom")).unwrap();
        assert_eq!(body, serde_json::json!({"error": "boom"}));
    }
}
