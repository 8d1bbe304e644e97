//! Request DTOs for Web API.

use serde::Deserialize;
use validator::Validate;

use crate::auth::SignupRequest;

/// Signup request.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupBody {
    /// Username.
    #[validate(length(min = 1, max = 50, message = "Username is required"))]
    pub username: String,
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Given name.
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    /// Family name.
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    /// Requested role (optional).
    #[serde(default)]
    pub role_name: Option<String>,
}

impl From<SignupBody> for SignupRequest {
    fn from(body: SignupBody) -> Self {
        let request = SignupRequest::new(
            body.username,
            body.email,
            body.password,
            body.first_name,
            body.last_name,
        );
        match body.role_name {
            Some(role) => request.with_role(role),
            None => request,
        }
    }
}

/// Login request. `username` may also be an email address.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginBody {
    /// Username or email.
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Form-encoded token request (OAuth2 password flow).
#[derive(Debug, Deserialize, Validate)]
pub struct TokenForm {
    /// Username or email.
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Grant type, `password` when present.
    #[serde(default)]
    pub grant_type: Option<String>,
}
