//! services/api/src/web/rest.rs
//!
//! The health endpoint and the master definition of the OpenAPI document.

use utoipa::OpenApi;

use crate::web::types::*;
use crate::web::{admin, auth, feedbacks, materials, notes, payments, sessions, tutors};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::sync_user_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::my_role_handler,
        admin::role_lookup_handler,
        admin::list_users_handler,
        admin::change_role_handler,
        tutors::apply_handler,
        tutors::list_by_status_handler,
        tutors::list_pending_handler,
        tutors::get_by_email_handler,
        tutors::review_handler,
        tutors::delete_handler,
        sessions::create_session_handler,
        sessions::list_sessions_handler,
        sessions::get_session_handler,
        sessions::tutor_sessions_handler,
        sessions::update_session_handler,
        sessions::session_status_handler,
        sessions::delete_session_handler,
        materials::create_material_handler,
        materials::list_materials_handler,
        materials::tutor_materials_handler,
        materials::student_materials_handler,
        materials::session_materials_handler,
        materials::update_material_handler,
        materials::delete_material_handler,
        payments::create_payment_intent_handler,
        payments::store_payment_handler,
        payments::user_payments_handler,
        payments::check_payment_handler,
        notes::create_note_handler,
        notes::user_notes_handler,
        notes::update_note_handler,
        notes::delete_note_handler,
        feedbacks::create_feedback_handler,
        feedbacks::list_feedbacks_handler,
        feedbacks::update_feedback_handler,
    ),
    components(
        schemas(
            SyncUserRequest, SyncUserResponse, LoginRequest, LoginResponse, RoleResponse,
            ChangeRoleRequest, UserResponse, UserPageResponse,
            TutorApplicationRequest, TutorStatusRequest, TutorApplicationResponse,
            SessionDetailsRequest, SessionStatusRequest, SessionResponse,
            CreateMaterialRequest, UpdateMaterialRequest, MaterialResponse,
            PaymentIntentRequest, PaymentIntentResponse, StorePaymentRequest, PaymentResponse,
            PaymentCheckResponse,
            CreateFeedbackRequest, UpdateFeedbackRequest, FeedbackResponse,
            CreateNoteRequest, UpdateNoteRequest, NoteResponse,
            MessageResponse,
        )
    ),
    tags(
        (name = "Tutoring API", description = "Users, roles, tutor applications, sessions, materials, payments, notes and feedback.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Health
//=========================================================================================

/// GET / - Liveness text
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Server is up", body = String))
)]
pub async fn health_handler() -> &'static str {
    "Tutoring server is running"
}
