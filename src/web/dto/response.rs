//! Response DTOs for Web API.

use serde::Serialize;

use crate::db::{Account, RoleWithPermissions, User};

/// Access token response, shaped for OAuth2 password-flow clients.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Access token (JWT).
    pub access_token: String,
    /// Always `bearer`.
    pub token_type: &'static str,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

impl TokenResponse {
    /// Wrap a freshly issued bearer token.
    pub fn bearer(access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            token_type: "bearer",
            expires_in,
        }
    }
}

/// Role with its granted permission names.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_superuser: bool,
    pub created_at: String,
    /// Granted permission names, sorted.
    pub permissions: Vec<String>,
}

impl From<RoleWithPermissions> for RoleResponse {
    fn from(role: RoleWithPermissions) -> Self {
        Self {
            id: role.role.id,
            name: role.role.name,
            description: role.role.description,
            is_superuser: role.role.is_superuser,
            created_at: role.role.created_at,
            permissions: role.permissions.into_iter().collect(),
        }
    }
}

/// Public view of an account. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub created_at: String,
    pub role: Option<RoleResponse>,
}

impl UserResponse {
    /// Build from a user and their role.
    pub fn new(user: User, role: Option<RoleWithPermissions>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            profile_image_url: user.profile_image_url,
            created_at: user.created_at,
            role: role.map(RoleResponse::from),
        }
    }
}

impl From<Account> for UserResponse {
    fn from(account: Account) -> Self {
        Self::new(account.user, account.role)
    }
}
