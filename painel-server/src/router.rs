use painel_core::api::{ErrorKind, PainelRequest, PainelResponse};
use painel_core::models::{CsvFile, RecordKind};
use painel_core::{PainelError, SessionContext};
use painel_ingest::ImportError;
use uuid::Uuid;

use crate::state::AppState;
use crate::subsystems::{companies, dashboard, import, projects};

/// Dispatch one request against the shared state.
pub async fn handle_request(
    request: PainelRequest,
    ctx: &SessionContext,
    state: &AppState,
) -> PainelResponse {
    match request {
        PainelRequest::Ping => PainelResponse::pong(),
        PainelRequest::Health => match state.store.health().await {
            Ok(detail) => PainelResponse::ok(serde_json::json!({
                "status": "healthy",
                "storage": state.store.name(),
                "detail": detail,
                "chat_sessions": state.sessions.count().await,
            })),
            Err(e) => {
                tracing::error!(
                    backend = state.store.name(),
                    error = %e,
                    "Storage health check failed"
                );
                PainelResponse::err_kind(
                    ErrorKind::Upstream,
                    format!("Storage health check failed: {}", e),
                )
            }
        },
        PainelRequest::Import {
            kind,
            company_id,
            file,
        } => handle_import(kind, company_id, file, ctx, state).await,
        PainelRequest::Chat {
            session_id,
            message,
        } => handle_chat(session_id, message, state).await,
        PainelRequest::Transcript { session_id } => match state.sessions.get(&session_id).await {
            Some(transcript) => PainelResponse::ok(serde_json::json!({
                "session_id": session_id,
                "messages": transcript.snapshot().await,
            })),
            None => unknown_session(session_id),
        },
        PainelRequest::EndChat { session_id } => {
            if state.sessions.end(&session_id).await {
                PainelResponse::ok(serde_json::json!({"session_id": session_id, "ended": true}))
            } else {
                unknown_session(session_id)
            }
        }
        PainelRequest::RegisterCompany { company } => {
            match companies::register_company(ctx, state.store.as_ref(), company).await {
                Ok(id) => PainelResponse::ok(serde_json::json!({"id": id})),
                Err(e) => painel_error(e),
            }
        }
        PainelRequest::ListProjects { status, search } => {
            let filter = projects::ProjectFilter { status, search };
            match projects::list_projects(ctx, state.store.as_ref(), &filter).await {
                Ok(list) => PainelResponse::ok(serde_json::json!({
                    "count": list.len(),
                    "projects": list,
                })),
                Err(e) => painel_error(e),
            }
        }
        PainelRequest::CreateProject { project } => {
            match projects::create_project(ctx, state.store.as_ref(), project).await {
                Ok(created) => PainelResponse::ok(serde_json::json!(created)),
                Err(e) => painel_error(e),
            }
        }
        PainelRequest::Dashboard => {
            match dashboard::dashboard_overview(ctx, state.store.as_ref()).await {
                Ok(overview) => PainelResponse::ok(serde_json::json!(overview)),
                Err(e) => painel_error(e),
            }
        }
    }
}

async fn handle_import(
    kind: RecordKind,
    company_id: Option<String>,
    file: Option<CsvFile>,
    ctx: &SessionContext,
    state: &AppState,
) -> PainelResponse {
    match import::import_upload(
        kind,
        company_id,
        file,
        &state.default_company_id,
        ctx,
        state.store.as_ref(),
    )
    .await
    {
        Ok(report) => PainelResponse::ok(serde_json::json!(report)),
        Err(e) => {
            let kind = match &e {
                ImportError::NoFileSelected | ImportError::TooFewRows => ErrorKind::Validation,
                ImportError::Unauthenticated => ErrorKind::Unauthenticated,
                ImportError::Store(_) => ErrorKind::Upstream,
                ImportError::Serialization(_) => ErrorKind::Internal,
            };
            if !e.is_validation() {
                tracing::error!(error = %e, "Import failed");
            }
            PainelResponse::err_kind(kind, e.to_string())
        }
    }
}

/// Chat never fails on collaborator errors; those become assistant replies.
async fn handle_chat(
    session_id: Option<Uuid>,
    message: String,
    state: &AppState,
) -> PainelResponse {
    if message.trim().is_empty() {
        return PainelResponse::err_kind(ErrorKind::Validation, "message must not be empty");
    }

    let (session_id, transcript) = match session_id {
        Some(id) => match state.sessions.get(&id).await {
            Some(t) => (id, t),
            None => return unknown_session(id),
        },
        None => state.sessions.open().await,
    };

    let exchange = state.chat.send(&transcript, &message).await;

    PainelResponse::ok(serde_json::json!({
        "session_id": session_id,
        "user": exchange.user,
        "reply": exchange.reply,
    }))
}

fn unknown_session(id: Uuid) -> PainelResponse {
    PainelResponse::err_kind(ErrorKind::NotFound, format!("unknown chat session {}", id))
}

fn painel_error(e: PainelError) -> PainelResponse {
    let kind = match &e {
        PainelError::Unauthenticated => ErrorKind::Unauthenticated,
        PainelError::Validation(_) => ErrorKind::Validation,
        PainelError::Store(_) => ErrorKind::Upstream,
        PainelError::Config(_) | PainelError::Other(_) => ErrorKind::Internal,
    };
    match kind {
        ErrorKind::Upstream | ErrorKind::Internal => tracing::error!(error = %e, "Request failed"),
        _ => tracing::debug!(error = %e, "Request rejected"),
    }
    PainelResponse::err_kind(kind, e.to_string())
}
