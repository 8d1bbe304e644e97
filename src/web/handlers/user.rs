//! Account handlers.

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::auth::CurrentUser;
use crate::db::AccountStore;
use crate::web::dto::{RoleResponse, UserResponse};
use crate::web::error::ApiError;
use crate::web::middleware::Authorized;
use crate::web::permissions::AdminRoles;

use super::AppState;

/// GET /api/users/me - The authenticated caller.
pub async fn me(user: CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::new(user.user, user.role))
}

/// GET /api/users/roles - All roles with their grants.
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    _caller: Authorized<AdminRoles>,
) -> Result<Json<Vec<RoleResponse>>, ApiError> {
    let roles = state.db.list_roles().await?;
    Ok(Json(roles.into_iter().map(RoleResponse::from).collect()))
}
