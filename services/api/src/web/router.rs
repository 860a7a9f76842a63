//! services/api/src/web/router.rs
//!
//! Assembles the full HTTP surface. Every protected route runs the session
//! middleware first, then its guard list, then the handler.

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;
use tutoring_core::guards::{Guard, ADMIN_ONLY, STUDENT_ONLY, TUTOR_OR_ADMIN};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::guard::RequireGuardsLayer;
use crate::web::middleware::require_identity;
use crate::web::rest::{health_handler, ApiDoc};
use crate::web::state::AppState;
use crate::web::{admin, auth, feedbacks, materials, notes, payments, sessions, tutors};

const APPROVED_TUTOR_ONLY: &[Guard] = &[Guard::ApprovedTutor];
const APPROVED_TUTOR_SELF: &[Guard] = &[Guard::ApprovedTutor, Guard::SelfAccess("email")];
const SELF_ONLY: &[Guard] = &[Guard::SelfAccess("email")];

/// Builds the application router around the shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    // --- 1. Public routes ---
    let public_routes = Router::new()
        .route("/", get(health_handler))
        .route("/users", post(auth::sync_user_handler))
        .route("/login", post(auth::login_handler))
        .route("/logout", post(auth::logout_handler))
        .route("/tutors", get(tutors::list_by_status_handler))
        .route("/tutors/email/{email}", get(tutors::get_by_email_handler))
        .route("/sessions", get(sessions::list_sessions_handler))
        .route("/sessions/{id}", get(sessions::get_session_handler))
        .route(
            "/payments/create-payment-intent",
            post(payments::create_payment_intent_handler),
        )
        .route("/feedbacks", get(feedbacks::list_feedbacks_handler));

    // --- 2. Guarded routes, one router per guard list ---
    let admin_routes = Router::new()
        .route("/users/role/{email}", get(admin::role_lookup_handler))
        .route("/admin/users", get(admin::list_users_handler))
        .route("/admin/users/{id}/role", patch(admin::change_role_handler))
        .route("/tutors/pending", get(tutors::list_pending_handler))
        .route(
            "/tutors/{id}",
            patch(tutors::review_handler).delete(tutors::delete_handler),
        )
        .route("/sessions/{id}/status", patch(sessions::session_status_handler))
        .route("/materials", get(materials::list_materials_handler))
        .route_layer(RequireGuardsLayer::new(state.clone(), ADMIN_ONLY));

    let approved_tutor_routes = Router::new()
        .route("/sessions", post(sessions::create_session_handler))
        .route_layer(RequireGuardsLayer::new(state.clone(), APPROVED_TUTOR_ONLY));

    let tutor_self_routes = Router::new()
        .route("/sessions/tutor/{email}", get(sessions::tutor_sessions_handler))
        .route_layer(RequireGuardsLayer::new(state.clone(), APPROVED_TUTOR_SELF));

    let tutor_or_admin_routes = Router::new()
        .route(
            "/sessions/{id}",
            patch(sessions::update_session_handler).delete(sessions::delete_session_handler),
        )
        .route("/materials", post(materials::create_material_handler))
        .route(
            "/materials/{id}",
            patch(materials::update_material_handler).delete(materials::delete_material_handler),
        )
        .route_layer(RequireGuardsLayer::new(state.clone(), TUTOR_OR_ADMIN));

    let self_routes = Router::new()
        .route("/materials/tutor/{email}", get(materials::tutor_materials_handler))
        .route("/materials/student/{email}", get(materials::student_materials_handler))
        .route("/payments/user/{email}", get(payments::user_payments_handler))
        .route("/notes/user/{email}", get(notes::user_notes_handler))
        .route_layer(RequireGuardsLayer::new(state.clone(), SELF_ONLY));

    let student_routes = Router::new()
        .route("/feedbacks", post(feedbacks::create_feedback_handler))
        .route_layer(RequireGuardsLayer::new(state.clone(), STUDENT_ONLY));

    // --- 3. Authenticated routes checked inside the handler (ownership, payment) ---
    let authenticated_routes = Router::new()
        .route("/users/me/role", get(auth::my_role_handler))
        .route("/tutors", post(tutors::apply_handler))
        .route(
            "/materials/session/{session_id}",
            get(materials::session_materials_handler),
        )
        .route("/payments/store-payment", post(payments::store_payment_handler))
        .route("/payments/check/{session_id}", get(payments::check_payment_handler))
        .route("/notes", post(notes::create_note_handler))
        .route(
            "/notes/{id}",
            patch(notes::update_note_handler).delete(notes::delete_note_handler),
        )
        .route("/feedbacks/{id}", patch(feedbacks::update_feedback_handler));

    // --- 4. The session middleware wraps every protected route ---
    let protected_routes = Router::new()
        .merge(admin_routes)
        .merge(approved_tutor_routes)
        .merge(tutor_self_routes)
        .merge(tutor_or_admin_routes)
        .merge(self_routes)
        .merge(student_routes)
        .merge(authenticated_routes)
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_identity,
        ));

    // --- 5. Combine, then add tracing, CORS and the API docs ---
    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors_layer(&state.config.cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    match origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            warn!("Ignoring unparsable CORS origin '{}'", origin);
            cors
        }
    }
}
