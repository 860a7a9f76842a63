//! services/api/src/web/admin.rs
//!
//! Admin-only endpoints over the role store: role lookup, the role-annotated
//! user listing and role changes.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use std::sync::Arc;
use tracing::info;
use tutoring_core::domain::{Role, VerifiedIdentity};
use tutoring_core::roles::{change_role, list_users_with_roles, resolve_role, UserQuery};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::web::extract::ValidJson;
use crate::web::state::AppState;
use crate::web::types::{
    normalize_email, ChangeRoleRequest, RoleResponse, UserListQuery, UserPageResponse,
    UserResponse,
};

/// GET /users/role/{email} - Derived role of any user
#[utoipa::path(
    get,
    path = "/users/role/{email}",
    params(("email" = String, Path, description = "Email to resolve")),
    responses(
        (status = 200, description = "Derived role", body = RoleResponse),
        (status = 401, description = "Missing or invalid credential"),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn role_lookup_handler(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> ApiResult<Json<RoleResponse>> {
    let email = normalize_email(&email);
    let role = resolve_role(state.db.as_ref(), &email).await?;
    Ok(Json(RoleResponse {
        email,
        role: role.to_string(),
    }))
}

/// GET /admin/users - Paginated user listing annotated with derived roles
#[utoipa::path(
    get,
    path = "/admin/users",
    params(UserListQuery),
    responses(
        (status = 200, description = "One page of users", body = UserPageResponse),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<UserPageResponse>> {
    let query = UserQuery {
        search: query.search,
        page: query.page,
        limit: query.limit,
    };
    let page = list_users_with_roles(state.db.as_ref(), &query).await?;
    Ok(Json(page.into()))
}

/// PATCH /admin/users/{id}/role - Promote or demote a user
#[utoipa::path(
    patch,
    path = "/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "Target user id")),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Role applied", body = UserResponse),
        (status = 400, description = "Unknown role"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "User not found")
    )
)]
pub async fn change_role_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<ChangeRoleRequest>,
) -> ApiResult<Json<UserResponse>> {
    let role = Role::parse(&req.role)
        .ok_or_else(|| ApiError::validation("role must be one of admin, tutor, student"))?;

    let user = change_role(state.db.as_ref(), id, role).await?;
    info!("{} set role of {} to {}", identity.email, user.email, role);

    Ok(Json(user.into()))
}
