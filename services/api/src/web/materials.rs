//! services/api/src/web/materials.rs
//!
//! Study materials attached to sessions. Tutors manage the materials of their
//! own sessions; students see a session's materials once they have paid for it.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use tutoring_core::domain::{MaterialFilter, NewMaterial, Role, VerifiedIdentity};
use tutoring_core::guards::same_email;
use tutoring_core::patch::MaterialPatch;
use tutoring_core::ports::PortError;
use tutoring_core::{ensure_owner_or_admin, resolve_role};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::web::extract::ValidJson;
use crate::web::state::AppState;
use crate::web::types::{
    required, CreateMaterialRequest, MaterialResponse, MessageResponse, UpdateMaterialRequest,
};

/// POST /materials - Attach a material to one of the caller's sessions
#[utoipa::path(
    post,
    path = "/materials",
    request_body = CreateMaterialRequest,
    responses(
        (status = 201, description = "Material created", body = MaterialResponse),
        (status = 400, description = "Title missing"),
        (status = 403, description = "Caller does not own the session"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn create_material_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    ValidJson(req): ValidJson<CreateMaterialRequest>,
) -> ApiResult<(StatusCode, Json<MaterialResponse>)> {
    let title = required(req.title, "title")?;
    let session = state.db.get_session(req.session_id).await?;
    ensure_owner_or_admin(state.db.as_ref(), &session.tutor_email, &identity).await?;

    // Materials belong to the session's tutor, even when an admin uploads them
    let material = state
        .db
        .create_material(NewMaterial {
            session_id: session.id,
            tutor_email: session.tutor_email,
            title,
            image_url: req.image_url,
            link: req.link,
        })
        .await?;

    info!("Material {} added to session {}", material.id, material.session_id);
    Ok((StatusCode::CREATED, Json(material.into())))
}

/// GET /materials - Every material
#[utoipa::path(
    get,
    path = "/materials",
    responses(
        (status = 200, description = "All materials", body = [MaterialResponse]),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn list_materials_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<MaterialResponse>>> {
    let materials = state.db.list_materials(MaterialFilter::default()).await?;
    Ok(Json(materials.into_iter().map(Into::into).collect()))
}

/// GET /materials/tutor/{email} - Materials uploaded by the calling tutor
#[utoipa::path(
    get,
    path = "/materials/tutor/{email}",
    params(("email" = String, Path, description = "Tutor email; must be the caller")),
    responses(
        (status = 200, description = "The tutor's materials", body = [MaterialResponse]),
        (status = 403, description = "Another user's email")
    )
)]
pub async fn tutor_materials_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
) -> ApiResult<Json<Vec<MaterialResponse>>> {
    let materials = state
        .db
        .list_materials(MaterialFilter {
            session_id: None,
            tutor_email: Some(identity.email),
        })
        .await?;
    Ok(Json(materials.into_iter().map(Into::into).collect()))
}

/// GET /materials/student/{email} - Materials of every session the caller paid for
#[utoipa::path(
    get,
    path = "/materials/student/{email}",
    params(("email" = String, Path, description = "Student email; must be the caller")),
    responses(
        (status = 200, description = "Materials of paid sessions", body = [MaterialResponse]),
        (status = 403, description = "Another user's email")
    )
)]
pub async fn student_materials_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
) -> ApiResult<Json<Vec<MaterialResponse>>> {
    let mut session_ids: Vec<Uuid> = state
        .db
        .list_payments_by_email(&identity.email)
        .await?
        .into_iter()
        .filter_map(|p| p.session_id)
        .collect();
    session_ids.sort_unstable();
    session_ids.dedup();

    if session_ids.is_empty() {
        return Ok(Json(Vec::new()));
    }
    let materials = state.db.list_materials_for_sessions(&session_ids).await?;
    Ok(Json(materials.into_iter().map(Into::into).collect()))
}

/// GET /materials/session/{session_id} - Materials of one session
///
/// Visible to admins, the session's tutor, and callers holding a payment for
/// the session.
#[utoipa::path(
    get,
    path = "/materials/session/{session_id}",
    params(("session_id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "The session's materials", body = [MaterialResponse]),
        (status = 403, description = "Caller has not paid for this session"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn session_materials_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<Vec<MaterialResponse>>> {
    let session = state.db.get_session(session_id).await?;

    let allowed = same_email(&session.tutor_email, &identity.email)
        || resolve_role(state.db.as_ref(), &identity.email).await? == Role::Admin
        || state.db.has_payment(&identity.email, session_id).await?;
    if !allowed {
        debug!("{} has no payment for session {}", identity.email, session_id);
        return Err(PortError::Forbidden("payment required for this session".to_string()).into());
    }

    let materials = state
        .db
        .list_materials(MaterialFilter {
            session_id: Some(session_id),
            tutor_email: None,
        })
        .await?;
    Ok(Json(materials.into_iter().map(Into::into).collect()))
}

/// PATCH /materials/{id} - Update the supplied fields of a material
#[utoipa::path(
    patch,
    path = "/materials/{id}",
    params(("id" = Uuid, Path, description = "Material id")),
    request_body = UpdateMaterialRequest,
    responses(
        (status = 200, description = "Material updated", body = MaterialResponse),
        (status = 403, description = "Caller neither owns the material nor is admin"),
        (status = 404, description = "Material not found")
    )
)]
pub async fn update_material_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<UpdateMaterialRequest>,
) -> ApiResult<Json<MaterialResponse>> {
    let mut material = state.db.get_material(id).await?;
    ensure_owner_or_admin(state.db.as_ref(), &material.tutor_email, &identity).await?;

    MaterialPatch {
        title: req.title.filter(|t| !t.trim().is_empty()),
        image_url: req.image_url,
        link: req.link,
    }
    .apply(&mut material, Utc::now());
    state.db.update_material(&material).await?;

    Ok(Json(material.into()))
}

/// DELETE /materials/{id} - Delete a material
#[utoipa::path(
    delete,
    path = "/materials/{id}",
    params(("id" = Uuid, Path, description = "Material id")),
    responses(
        (status = 200, description = "Material deleted", body = MessageResponse),
        (status = 403, description = "Caller neither owns the material nor is admin"),
        (status = 404, description = "Material not found")
    )
)]
pub async fn delete_material_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let material = state.db.get_material(id).await?;
    ensure_owner_or_admin(state.db.as_ref(), &material.tutor_email, &identity).await?;
    state.db.delete_material(id).await?;
    Ok(Json(MessageResponse::new("Material deleted")))
}
