//! services/api/src/web/sessions.rs
//!
//! Tutoring session endpoints. Tutors create and maintain their own sessions;
//! admins approve or cancel them.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::info;
use tutoring_core::domain::{SessionFilter, SessionStatus, VerifiedIdentity};
use tutoring_core::ensure_owner_or_admin;
use tutoring_core::patch::merge_details;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::web::extract::ValidJson;
use crate::web::state::AppState;
use crate::web::types::{
    normalize_email, MessageResponse, SessionDetailsRequest, SessionListQuery, SessionResponse,
    SessionStatusRequest,
};

fn parse_status(raw: &str) -> ApiResult<SessionStatus> {
    SessionStatus::parse(raw)
        .ok_or_else(|| ApiError::validation("status must be one of pending, approved, cancelled"))
}

/// POST /sessions - Create a session as the calling tutor
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = SessionDetailsRequest,
    responses(
        (status = 201, description = "Session created, pending approval", body = SessionResponse),
        (status = 403, description = "Caller is not an approved tutor or admin")
    )
)]
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    ValidJson(req): ValidJson<SessionDetailsRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let session = state.db.create_session(&identity.email, req.details).await?;
    info!("Session {} created by {}", session.id, identity.email);
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// GET /sessions - List sessions, optionally by status and tutor
#[utoipa::path(
    get,
    path = "/sessions",
    params(SessionListQuery),
    responses(
        (status = 200, description = "Matching sessions", body = [SessionResponse]),
        (status = 400, description = "Unknown status")
    )
)]
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionListQuery>,
) -> ApiResult<Json<Vec<SessionResponse>>> {
    let filter = SessionFilter {
        status: query.status.as_deref().map(parse_status).transpose()?,
        tutor_email: query.tutor_email.as_deref().map(normalize_email),
    };
    let sessions = state.db.list_sessions(filter).await?;
    Ok(Json(sessions.into_iter().map(Into::into).collect()))
}

/// GET /sessions/{id} - One session
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "The session", body = SessionResponse),
        (status = 404, description = "Session not found")
    )
)]
pub async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionResponse>> {
    Ok(Json(state.db.get_session(id).await?.into()))
}

/// GET /sessions/tutor/{email} - All sessions of the calling tutor, any status
#[utoipa::path(
    get,
    path = "/sessions/tutor/{email}",
    params(("email" = String, Path, description = "Tutor email; must be the caller")),
    responses(
        (status = 200, description = "The tutor's sessions", body = [SessionResponse]),
        (status = 403, description = "Not an approved tutor, or another tutor's email")
    )
)]
pub async fn tutor_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
) -> ApiResult<Json<Vec<SessionResponse>>> {
    let sessions = state
        .db
        .list_sessions(SessionFilter {
            status: None,
            tutor_email: Some(identity.email),
        })
        .await?;
    Ok(Json(sessions.into_iter().map(Into::into).collect()))
}

/// PATCH /sessions/{id} - Merge scheduling fields into a session
#[utoipa::path(
    patch,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = SessionDetailsRequest,
    responses(
        (status = 200, description = "Session updated", body = SessionResponse),
        (status = 403, description = "Caller neither owns the session nor is admin"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn update_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<SessionDetailsRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.db.get_session(id).await?;
    ensure_owner_or_admin(state.db.as_ref(), &session.tutor_email, &identity).await?;

    let mut details = session.details;
    merge_details(&mut details, req.details);
    let session = state.db.update_session_details(id, details).await?;
    Ok(Json(session.into()))
}

/// PATCH /sessions/{id}/status - Approve or cancel a session
#[utoipa::path(
    patch,
    path = "/sessions/{id}/status",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = SessionStatusRequest,
    responses(
        (status = 200, description = "Status applied", body = SessionResponse),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn session_status_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<SessionStatusRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let status = parse_status(&req.status)?;
    let feedback = match status {
        SessionStatus::Cancelled => req.feedback.filter(|f| !f.trim().is_empty()),
        _ => None,
    };
    let session = state.db.update_session_status(id, status, feedback).await?;
    info!("Session {} is now {}", id, status);
    Ok(Json(session.into()))
}

/// DELETE /sessions/{id} - Delete a session
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session deleted", body = MessageResponse),
        (status = 403, description = "Caller neither owns the session nor is admin"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let session = state.db.get_session(id).await?;
    ensure_owner_or_admin(state.db.as_ref(), &session.tutor_email, &identity).await?;
    state.db.delete_session(id).await?;
    Ok(Json(MessageResponse::new("Session deleted")))
}
