//! services/api/src/web/feedbacks.rs
//!
//! Session ratings left by students.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use tutoring_core::domain::{NewFeedback, VerifiedIdentity};
use tutoring_core::ensure_owner;
use tutoring_core::patch::{validate_rating, FeedbackPatch};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::web::extract::ValidJson;
use crate::web::state::AppState;
use crate::web::types::{
    CreateFeedbackRequest, FeedbackListQuery, FeedbackResponse, UpdateFeedbackRequest,
};

/// POST /feedbacks - Rate a session as the calling student
#[utoipa::path(
    post,
    path = "/feedbacks",
    request_body = CreateFeedbackRequest,
    responses(
        (status = 201, description = "Feedback recorded", body = FeedbackResponse),
        (status = 400, description = "Rating outside 1..=5"),
        (status = 403, description = "Caller is not a student"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn create_feedback_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    ValidJson(req): ValidJson<CreateFeedbackRequest>,
) -> ApiResult<(StatusCode, Json<FeedbackResponse>)> {
    let rating = validate_rating(req.rating)?;
    let session = state.db.get_session(req.session_id).await?;

    let feedback = state
        .db
        .create_feedback(NewFeedback {
            session_id: session.id,
            student_email: identity.email,
            rating,
            comment: req.comment,
        })
        .await?;

    info!("Feedback {} left on session {}", feedback.id, feedback.session_id);
    Ok((StatusCode::CREATED, Json(feedback.into())))
}

/// GET /feedbacks - Feedbacks, optionally for one session
#[utoipa::path(
    get,
    path = "/feedbacks",
    params(FeedbackListQuery),
    responses((status = 200, description = "Matching feedbacks", body = [FeedbackResponse]))
)]
pub async fn list_feedbacks_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedbackListQuery>,
) -> ApiResult<Json<Vec<FeedbackResponse>>> {
    let feedbacks = state.db.list_feedbacks(query.session_id).await?;
    Ok(Json(feedbacks.into_iter().map(Into::into).collect()))
}

/// PATCH /feedbacks/{id} - Revise the caller's own feedback
#[utoipa::path(
    patch,
    path = "/feedbacks/{id}",
    params(("id" = Uuid, Path, description = "Feedback id")),
    request_body = UpdateFeedbackRequest,
    responses(
        (status = 200, description = "Feedback updated", body = FeedbackResponse),
        (status = 400, description = "Rating outside 1..=5"),
        (status = 403, description = "Not the caller's feedback"),
        (status = 404, description = "Feedback not found")
    )
)]
pub async fn update_feedback_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<UpdateFeedbackRequest>,
) -> ApiResult<Json<FeedbackResponse>> {
    let mut feedback = state.db.get_feedback(id).await?;
    ensure_owner(&feedback.student_email, &identity)?;

    FeedbackPatch {
        rating: req.rating,
        comment: req.comment,
    }
    .apply(&mut feedback, Utc::now())?;
    state.db.update_feedback(&feedback).await?;

    Ok(Json(feedback.into()))
}
