//! services/api/src/web/tutors.rs
//!
//! Tutor application lifecycle: self-service applications, admin review and
//! public lookups.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::info;
use tutoring_core::domain::{NewTutorApplication, TutorStatus, VerifiedIdentity};
use tutoring_core::ports::PortError;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::web::extract::ValidJson;
use crate::web::state::AppState;
use crate::web::types::{
    normalize_email, required, MessageResponse, StatusQuery, TutorApplicationRequest,
    TutorApplicationResponse, TutorStatusRequest,
};

fn parse_status(raw: &str) -> ApiResult<TutorStatus> {
    TutorStatus::parse(raw).ok_or_else(|| {
        ApiError::validation("status must be one of pending, approved, cancelled, removed")
    })
}

/// POST /tutors - Apply to become a tutor
///
/// The applicant's email is taken from the verified identity. An open
/// (pending or approved) application blocks a new one; a cancelled or removed
/// one is reopened.
#[utoipa::path(
    post,
    path = "/tutors",
    request_body = TutorApplicationRequest,
    responses(
        (status = 201, description = "Application submitted", body = TutorApplicationResponse),
        (status = 400, description = "Name missing"),
        (status = 401, description = "Missing or invalid credential"),
        (status = 409, description = "An open application already exists")
    )
)]
pub async fn apply_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    ValidJson(req): ValidJson<TutorApplicationRequest>,
) -> ApiResult<(StatusCode, Json<TutorApplicationResponse>)> {
    let name = required(req.name.or(identity.name.clone()), "name")?;

    let application = match state.db.find_tutor_application_by_email(&identity.email).await? {
        Some(existing) if existing.status.is_open() => {
            return Err(PortError::Conflict(format!(
                "An application for {} is already {}",
                identity.email, existing.status
            ))
            .into());
        }
        Some(existing) => {
            state
                .db
                .reopen_tutor_application(existing.id, &name, req.photo_url.as_deref())
                .await?
        }
        None => {
            state
                .db
                .create_tutor_application(NewTutorApplication {
                    email: identity.email.clone(),
                    name,
                    photo_url: req.photo_url,
                    status: TutorStatus::Pending,
                })
                .await?
        }
    };

    info!("Tutor application {} submitted by {}", application.id, identity.email);
    Ok((StatusCode::CREATED, Json(application.into())))
}

/// GET /tutors?status= - Applications in one status
#[utoipa::path(
    get,
    path = "/tutors",
    params(StatusQuery),
    responses(
        (status = 200, description = "Matching applications", body = [TutorApplicationResponse]),
        (status = 400, description = "Status missing or unknown")
    )
)]
pub async fn list_by_status_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<Vec<TutorApplicationResponse>>> {
    let status = parse_status(&required(query.status, "status")?)?;
    let applications = state.db.list_tutor_applications(Some(status)).await?;
    Ok(Json(applications.into_iter().map(Into::into).collect()))
}

/// GET /tutors/pending - Applications awaiting review
#[utoipa::path(
    get,
    path = "/tutors/pending",
    responses(
        (status = 200, description = "Pending applications", body = [TutorApplicationResponse]),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn list_pending_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<TutorApplicationResponse>>> {
    let applications = state
        .db
        .list_tutor_applications(Some(TutorStatus::Pending))
        .await?;
    Ok(Json(applications.into_iter().map(Into::into).collect()))
}

/// GET /tutors/email/{email} - Application of one email
#[utoipa::path(
    get,
    path = "/tutors/email/{email}",
    params(("email" = String, Path, description = "Applicant email")),
    responses(
        (status = 200, description = "The application", body = TutorApplicationResponse),
        (status = 404, description = "No application for this email")
    )
)]
pub async fn get_by_email_handler(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> ApiResult<Json<TutorApplicationResponse>> {
    let email = normalize_email(&email);
    let application = state
        .db
        .find_tutor_application_by_email(&email)
        .await?
        .ok_or_else(|| PortError::NotFound(format!("Tutor application for {}", email)))?;
    Ok(Json(application.into()))
}

/// PATCH /tutors/{id} - Review an application
///
/// Feedback is kept only when the application is cancelled.
#[utoipa::path(
    patch,
    path = "/tutors/{id}",
    params(("id" = Uuid, Path, description = "Application id")),
    request_body = TutorStatusRequest,
    responses(
        (status = 200, description = "Application updated", body = TutorApplicationResponse),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Application not found")
    )
)]
pub async fn review_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<TutorStatusRequest>,
) -> ApiResult<Json<TutorApplicationResponse>> {
    let status = parse_status(&req.status)?;
    let feedback = match status {
        TutorStatus::Cancelled => req.feedback.filter(|f| !f.trim().is_empty()),
        _ => None,
    };

    let application = state
        .db
        .update_tutor_application_status(id, status, feedback)
        .await?;
    info!("Tutor application {} is now {}", id, status);
    Ok(Json(application.into()))
}

/// DELETE /tutors/{id} - Delete an application outright
#[utoipa::path(
    delete,
    path = "/tutors/{id}",
    params(("id" = Uuid, Path, description = "Application id")),
    responses(
        (status = 200, description = "Application deleted", body = MessageResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Application not found")
    )
)]
pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state.db.delete_tutor_application(id).await?;
    Ok(Json(MessageResponse::new("Tutor application deleted")))
}
