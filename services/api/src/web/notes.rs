//! services/api/src/web/notes.rs
//!
//! Personal notes. Strictly owner-only: admins get no bypass here.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use std::sync::Arc;
use tutoring_core::domain::{NewNote, VerifiedIdentity};
use tutoring_core::ensure_owner;
use tutoring_core::patch::NotePatch;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::web::extract::ValidJson;
use crate::web::state::AppState;
use crate::web::types::{
    required, CreateNoteRequest, MessageResponse, NoteResponse, UpdateNoteRequest,
};

/// POST /notes - Create a note owned by the caller
#[utoipa::path(
    post,
    path = "/notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created", body = NoteResponse),
        (status = 400, description = "Title missing"),
        (status = 401, description = "Missing or invalid credential")
    )
)]
pub async fn create_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    ValidJson(req): ValidJson<CreateNoteRequest>,
) -> ApiResult<(StatusCode, Json<NoteResponse>)> {
    let note = state
        .db
        .create_note(NewNote {
            email: identity.email,
            title: required(req.title, "title")?,
            description: req.description,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(note.into())))
}

/// GET /notes/user/{email} - Notes of the caller
#[utoipa::path(
    get,
    path = "/notes/user/{email}",
    params(("email" = String, Path, description = "Owner email; must be the caller")),
    responses(
        (status = 200, description = "The caller's notes", body = [NoteResponse]),
        (status = 403, description = "Another user's email")
    )
)]
pub async fn user_notes_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
) -> ApiResult<Json<Vec<NoteResponse>>> {
    let notes = state.db.list_notes_by_email(&identity.email).await?;
    Ok(Json(notes.into_iter().map(Into::into).collect()))
}

/// PATCH /notes/{id} - Update the supplied fields of a note
#[utoipa::path(
    patch,
    path = "/notes/{id}",
    params(("id" = Uuid, Path, description = "Note id")),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Note updated", body = NoteResponse),
        (status = 403, description = "Not the caller's note"),
        (status = 404, description = "Note not found")
    )
)]
pub async fn update_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<UpdateNoteRequest>,
) -> ApiResult<Json<NoteResponse>> {
    let mut note = state.db.get_note(id).await?;
    ensure_owner(&note.email, &identity)?;

    NotePatch {
        title: req.title.filter(|t| !t.trim().is_empty()),
        description: req.description,
    }
    .apply(&mut note, Utc::now());
    state.db.update_note(&note).await?;

    Ok(Json(note.into()))
}

/// DELETE /notes/{id} - Delete one of the caller's notes
#[utoipa::path(
    delete,
    path = "/notes/{id}",
    params(("id" = Uuid, Path, description = "Note id")),
    responses(
        (status = 200, description = "Note deleted", body = MessageResponse),
        (status = 403, description = "Not the caller's note"),
        (status = 404, description = "Note not found")
    )
)]
pub async fn delete_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let note = state.db.get_note(id).await?;
    ensure_owner(&note.email, &identity)?;
    state.db.delete_note(id).await?;
    Ok(Json(MessageResponse::new("Note deleted")))
}
