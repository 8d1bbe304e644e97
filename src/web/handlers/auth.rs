//! Authentication handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::auth::{authenticate, issue_token_for, signup as register_account};
use crate::db::AccountStore;
use crate::notify::{notify_quietly, Notification};
use crate::web::dto::{
    LoginBody, SignupBody, TokenForm, TokenResponse, UserResponse, ValidatedForm, ValidatedJson,
};
use crate::web::error::ApiError;

use super::AppState;

/// POST /api/auth/signup - Create an account.
///
/// A failed welcome notification is logged; the account stays created.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<SignupBody>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = register_account(&state.db, &state.roles, body.into()).await?;

    notify_quietly(state.notifier.as_ref(), Notification::welcome(&user)).await;

    let response = match state.db.find_account(user.id).await? {
        Some(account) => UserResponse::from(account),
        None => UserResponse::new(user, None),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login - Exchange credentials for an access token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<LoginBody>,
) -> Result<Json<TokenResponse>, ApiError> {
    issue(&state, &body.username, &body.password).await.map(Json)
}

/// POST /api/auth/token - OAuth2 password-flow token endpoint (form encoded).
pub async fn token(
    State(state): State<Arc<AppState>>,
    ValidatedForm(form): ValidatedForm<TokenForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    if let Some(grant_type) = form.grant_type.as_deref() {
        if grant_type != "password" {
            return Err(ApiError::bad_request("Unsupported grant type"));
        }
    }
    issue(&state, &form.username, &form.password).await.map(Json)
}

async fn issue(state: &AppState, identifier: &str, password: &str) -> Result<TokenResponse, ApiError> {
    let account = authenticate(&state.db, identifier, password).await?;
    let access_token = issue_token_for(&state.tokens, &account)?;
    Ok(TokenResponse::bearer(
        access_token,
        state.tokens.ttl().num_seconds(),
    ))
}
