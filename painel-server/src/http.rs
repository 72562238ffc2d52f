//! Painel HTTP REST API
//!
//! Each endpoint has a thin axum handler that builds a `PainelRequest`, reads
//! the actor from the gateway header and delegates to an inner function. The
//! inner functions are directly testable without axum dispatch.
//!
//! Endpoints:
//! - GET    /health      storage status
//! - GET    /version     server version info
//! - POST   /import      CSV import into a company collection
//! - POST   /chat        send a chat message (opens a session when none given)
//! - GET    /chat/:id    chat transcript
//! - DELETE /chat/:id    end a chat session
//! - POST   /companies   register a company
//! - GET    /projects    list projects (`status`, `search` query params)
//! - POST   /projects    create a project
//! - GET    /dashboard   dashboard totals

use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use painel_core::api::{ErrorKind, PainelRequest, PainelResponse};
use painel_core::models::{
    CompanyRegistration, CsvFile, ProjectRecord, ProjectStatus, RecordKind,
};
use painel_core::SessionContext;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::state::AppState;

/// Header carrying the authenticated uid, set by the identity gateway.
pub const ACTOR_HEADER: &str = "x-painel-actor";

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/import", post(import_handler))
        .route("/chat", post(chat_handler))
        .route("/chat/:id", get(transcript_handler).delete(end_chat_handler))
        .route("/companies", post(register_company_handler))
        .route("/projects", get(list_projects_handler).post(create_project_handler))
        .route("/dashboard", get(dashboard_handler))
        .with_state(state)
}

/// Start the HTTP server on `addr`.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    state: Arc<AppState>,
    addr: String,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Painel HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub kind: RecordKind,
    pub company_id: Option<String>,
    pub file: Option<CsvFile>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<Uuid>,
    #[serde(default)]
    pub message: String,
}

/// Query params of `GET /projects`. Empty values mean "no filter".
#[derive(Debug, Default, Deserialize)]
pub struct ProjectsParams {
    pub status: Option<String>,
    pub search: Option<String>,
}

// ============================================================================
// Inner (directly testable) functions
// ============================================================================

pub fn session_from_headers(headers: &HeaderMap) -> SessionContext {
    SessionContext::from_forwarded_uid(headers.get(ACTOR_HEADER).and_then(|v| v.to_str().ok()))
}

/// Malformed bodies, path ids and query strings answer with the validation
/// envelope instead of axum's plain-text rejection.
pub fn rejection_inner(message: impl Into<String>) -> (StatusCode, serde_json::Value) {
    response_to_http(PainelResponse::err_kind(ErrorKind::Validation, message))
}

/// Health maps any failure to 503 rather than the generic upstream status.
pub async fn health_inner(state: &AppState) -> (StatusCode, serde_json::Value) {
    let response =
        crate::router::handle_request(PainelRequest::Health, &SessionContext::anonymous(), state)
            .await;
    let (status, body) = response_to_http(response);
    if status.is_success() {
        (status, body)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, body)
    }
}

pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "painel/1",
    })
}

pub async fn dispatch_inner(
    state: &AppState,
    ctx: &SessionContext,
    request: PainelRequest,
) -> (StatusCode, serde_json::Value) {
    response_to_http(crate::router::handle_request(request, ctx, state).await)
}

pub async fn list_projects_inner(
    state: &AppState,
    ctx: &SessionContext,
    params: ProjectsParams,
) -> (StatusCode, serde_json::Value) {
    let status = match params.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match raw.to_lowercase().as_str() {
            "active" => Some(ProjectStatus::Active),
            "completed" => Some(ProjectStatus::Completed),
            _ => {
                return response_to_http(PainelResponse::err_kind(
                    ErrorKind::Validation,
                    format!("unknown project status '{}'", raw),
                ))
            }
        },
    };

    let request = PainelRequest::ListProjects {
        status,
        search: params.search,
    };
    dispatch_inner(state, ctx, request).await
}

// ============================================================================
// Axum handler wrappers (thin, delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn import_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(e) => return reject(e.body_text()),
    };
    let request = PainelRequest::Import {
        kind: req.kind,
        company_id: req.company_id,
        file: req.file,
    };
    let (status, body) = dispatch_inner(&state, &session_from_headers(&headers), request).await;
    (status, Json(body))
}

pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(e) => return reject(e.body_text()),
    };
    let request = PainelRequest::Chat {
        session_id: req.session_id,
        message: req.message,
    };
    let (status, body) = dispatch_inner(&state, &session_from_headers(&headers), request).await;
    (status, Json(body))
}

pub async fn transcript_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    id: Result<Path<Uuid>, PathRejection>,
) -> impl IntoResponse {
    let Path(session_id) = match id {
        Ok(p) => p,
        Err(e) => return reject(e.body_text()),
    };
    let request = PainelRequest::Transcript { session_id };
    let (status, body) = dispatch_inner(&state, &session_from_headers(&headers), request).await;
    (status, Json(body))
}

pub async fn end_chat_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    id: Result<Path<Uuid>, PathRejection>,
) -> impl IntoResponse {
    let Path(session_id) = match id {
        Ok(p) => p,
        Err(e) => return reject(e.body_text()),
    };
    let request = PainelRequest::EndChat { session_id };
    let (status, body) = dispatch_inner(&state, &session_from_headers(&headers), request).await;
    (status, Json(body))
}

pub async fn register_company_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<CompanyRegistration>, JsonRejection>,
) -> impl IntoResponse {
    let Json(company) = match payload {
        Ok(p) => p,
        Err(e) => return reject(e.body_text()),
    };
    let request = PainelRequest::RegisterCompany { company };
    let (status, body) = dispatch_inner(&state, &session_from_headers(&headers), request).await;
    (status, Json(body))
}

pub async fn list_projects_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<ProjectsParams>, QueryRejection>,
) -> impl IntoResponse {
    let Query(params) = match query {
        Ok(q) => q,
        Err(e) => return reject(e.body_text()),
    };
    let ctx = session_from_headers(&headers);
    let (status, body) = list_projects_inner(&state, &ctx, params).await;
    (status, Json(body))
}

pub async fn create_project_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ProjectRecord>, JsonRejection>,
) -> impl IntoResponse {
    let Json(project) = match payload {
        Ok(p) => p,
        Err(e) => return reject(e.body_text()),
    };
    let request = PainelRequest::CreateProject { project };
    let (status, body) = dispatch_inner(&state, &session_from_headers(&headers), request).await;
    (status, Json(body))
}

pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let (status, body) =
        dispatch_inner(&state, &session_from_headers(&headers), PainelRequest::Dashboard).await;
    (status, Json(body))
}

// ============================================================================
// Helpers
// ============================================================================

fn reject(message: String) -> (StatusCode, Json<serde_json::Value>) {
    let (status, body) = rejection_inner(message);
    (status, Json(body))
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert a `PainelResponse` into a status code plus the JSON envelope.
pub fn response_to_http(response: PainelResponse) -> (StatusCode, serde_json::Value) {
    let status = if response.is_ok() {
        StatusCode::OK
    } else {
        status_for(response.error_kind.unwrap_or(ErrorKind::Internal))
    };

    let body = serde_json::to_value(&response).unwrap_or_else(|e| {
        serde_json::json!({
            "status": "error",
            "data": null,
            "error": format!("failed to encode response: {}", e),
            "version": env!("CARGO_PKG_VERSION"),
        })
    });
    (status, body)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use painel_core::{
        CalendarBackend, CalendarError, CalendarEventRequest, LanguageModel, LlmError,
        MemoryDocumentStore,
    };

    use crate::subsystems::chat::ChatRouter;
    use crate::subsystems::intent::KeywordClassifier;

    struct DownLlm;

    #[async_trait]
    impl LanguageModel for DownLlm {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            Err(LlmError::MissingReply)
        }

        fn name(&self) -> &str {
            "down"
        }
    }

    struct DownCalendar;

    #[async_trait]
    impl CalendarBackend for DownCalendar {
        async fn schedule(&self, _event: &CalendarEventRequest) -> Result<String, CalendarError> {
            Err(CalendarError::MissingToken)
        }

        fn name(&self) -> &str {
            "down"
        }
    }

    fn state() -> AppState {
        let chat = ChatRouter::new(
            Arc::new(KeywordClassifier::new().unwrap()),
            Arc::new(DownCalendar),
            Arc::new(DownLlm),
        );
        AppState::new(Arc::new(MemoryDocumentStore::new()), chat, "default")
    }

    #[test]
    fn test_version_inner_pure() {
        let v = version_inner();
        assert!(v["version"].is_string());
        assert_eq!(v["protocol"], "painel/1");
    }

    #[test]
    fn test_response_to_http_ok() {
        let (status, body) = response_to_http(PainelResponse::ok(serde_json::json!({"count": 0})));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["data"]["count"], 0);
    }

    #[test]
    fn test_response_to_http_maps_error_kinds() {
        let cases = [
            (ErrorKind::Validation, StatusCode::BAD_REQUEST),
            (ErrorKind::Unauthenticated, StatusCode::UNAUTHORIZED),
            (ErrorKind::NotFound, StatusCode::NOT_FOUND),
            (ErrorKind::Upstream, StatusCode::BAD_GATEWAY),
            (ErrorKind::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (kind, expected) in cases {
            let (status, body) = response_to_http(PainelResponse::err_kind(kind, "x"));
            assert_eq!(status, expected);
            assert_eq!(body["error"], "x");
        }
    }

    #[test]
    fn test_error_without_kind_is_internal() {
        let mut resp = PainelResponse::err("x");
        resp.error_kind = None;
        let (status, _) = response_to_http(resp);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_session_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(session_from_headers(&headers).actor.is_none());

        headers.insert(ACTOR_HEADER, HeaderValue::from_static("uid-7"));
        assert_eq!(session_from_headers(&headers).actor.unwrap().uid, "uid-7");
    }

    #[test]
    fn test_rejection_inner_uses_validation_envelope() {
        let (status, body) = rejection_inner("Failed to parse the request body as JSON");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "Failed to parse the request body as JSON");
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_health_inner_memory_store() {
        let (status, body) = health_inner(&state()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "healthy");
    }

    #[tokio::test]
    async fn test_list_projects_rejects_unknown_status() {
        let state = state();
        let ctx = SessionContext::authenticated("u1");

        let (status, _) = list_projects_inner(
            &state,
            &ctx,
            ProjectsParams {
                status: Some("archived".to_string()),
                search: None,
            },
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = list_projects_inner(
            &state,
            &ctx,
            ProjectsParams {
                status: Some(String::new()),
                search: Some(String::new()),
            },
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["count"], 0);
    }

    #[tokio::test]
    async fn test_collaborator_failure_is_still_a_chat_reply() {
        let state = state();
        let ctx = SessionContext::anonymous();

        let (status, body) = dispatch_inner(
            &state,
            &ctx,
            PainelRequest::Chat {
                session_id: None,
                message: "agendar reunião".to_string(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"]["reply"]["content"],
            crate::subsystems::chat::CALENDAR_FAILURE_REPLY
        );
    }
}
