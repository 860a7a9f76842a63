//! services/api/src/web/auth.rs
//!
//! User sync from the identity provider, and session establishment: login
//! sets the `token` cookie from a verified credential, logout clears it.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::Duration;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{error, info};
use tutoring_core::domain::{NewUser, VerifiedIdentity};
use tutoring_core::resolve_role;

use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::web::extract::ValidJson;
use crate::web::middleware::{extract_credential, SESSION_COOKIE};
use crate::web::state::AppState;
use crate::web::types::{
    normalize_email, LoginRequest, LoginResponse, MessageResponse, RoleResponse, SyncUserRequest,
    SyncUserResponse,
};

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    })
}

fn session_cookie(config: &Config, value: &str, max_age_seconds: i64) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, value, max_age_seconds
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /users - Sync a user from the identity provider (idempotent by email)
#[utoipa::path(
    post,
    path = "/users",
    request_body = SyncUserRequest,
    responses(
        (status = 200, description = "User inserted or already present", body = SyncUserResponse),
        (status = 400, description = "Missing or malformed email"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn sync_user_handler(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<SyncUserRequest>,
) -> ApiResult<Json<SyncUserResponse>> {
    let email = normalize_email(&req.email);
    if !email_pattern().is_match(&email) {
        return Err(ApiError::validation("a valid email is required"));
    }
    let name = req
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    let (user, inserted) = state
        .db
        .upsert_user(NewUser {
            uid: req.uid,
            email,
            name,
            photo_url: req.photo_url,
        })
        .await
        .map_err(|e| {
            error!("User sync failed: {:?}", e);
            ApiError::from(e)
        })?;

    let message = if inserted {
        info!("New user synced: {}", user.email);
        "New user inserted"
    } else {
        "User already existed"
    };

    Ok(Json(SyncUserResponse {
        success: inserted,
        message: message.to_string(),
        user: user.into(),
    }))
}

/// POST /login - Verify a credential and store it in the session cookie
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Missing or invalid credential")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    // 1. Body token first, then the usual cookie/header locations
    let credential = body
        .ok()
        .and_then(|Json(req)| req.token)
        .filter(|t| !t.trim().is_empty())
        .or_else(|| extract_credential(&headers))
        .ok_or(ApiError::Unauthorized)?;

    // 2. Verify with the identity provider
    let identity = state.identity.verify(&credential).await?;
    let role = resolve_role(state.db.as_ref(), &identity.email).await?;

    // 3. The cookie holds the raw credential
    let max_age = Duration::days(state.config.session_cookie_days).num_seconds();
    let cookie = session_cookie(&state.config, &credential, max_age);

    info!("{} logged in as {}", identity.email, role);
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            email: identity.email,
            role: role.to_string(),
        }),
    ))
}

/// POST /logout - Clear the session cookie
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 200, description = "Logout successful", body = MessageResponse))
)]
pub async fn logout_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cookie = session_cookie(&state.config, "", 0);
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse::new("Logged out")),
    )
}

/// GET /users/me/role - The caller's own derived role
#[utoipa::path(
    get,
    path = "/users/me/role",
    responses(
        (status = 200, description = "Derived role", body = RoleResponse),
        (status = 401, description = "Missing or invalid credential")
    )
)]
pub async fn my_role_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
) -> ApiResult<Json<RoleResponse>> {
    let role = resolve_role(state.db.as_ref(), &identity.email).await?;
    Ok(Json(RoleResponse {
        email: identity.email,
        role: role.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_pattern() {
        assert!(email_pattern().is_match("alice@x.com"));
        assert!(!email_pattern().is_match("alice"));
        assert!(!email_pattern().is_match("a b@x.com"));
    }
}
