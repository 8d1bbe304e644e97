//! Bearer authentication extractors.

use std::marker::PhantomData;

use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};

use crate::auth::{bearer_token, check_permission, AccessError, AuthGuard, CurrentUser};
use crate::web::error::ApiError;

/// A permission name known at compile time.
pub trait RequiredPermission: Send + Sync + 'static {
    /// Permission name checked against the caller's role.
    const NAME: &'static str;
}

/// Middleware that makes the guard available to the extractors.
pub async fn guard_layer(guard: AuthGuard, mut request: Request<Body>, next: Next) -> Response {
    request.extensions_mut().insert(guard);
    next.run(request).await
}

fn guard_from(parts: &Parts) -> Result<AuthGuard, ApiError> {
    parts.extensions.get::<AuthGuard>().cloned().ok_or_else(|| {
        tracing::error!("Auth guard not configured on router");
        ApiError::from(AccessError::Internal)
    })
}

/// Token from the `Authorization` header.
///
/// A header that is present but unreadable counts as no token.
fn header_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let guard = guard_from(parts)?;
        let user = guard.authenticate(header_token(parts)).await?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

/// Extractor admitting only callers whose role currently grants `P`.
///
/// ```ignore
/// async fn finance(Authorized(user, _): Authorized<ReportsFinance>) -> Json<Value> { .. }
/// ```
pub struct Authorized<P: RequiredPermission>(pub CurrentUser, pub PhantomData<P>);

impl<P: RequiredPermission> Authorized<P> {
    /// The admitted caller.
    pub fn user(&self) -> &CurrentUser {
        &self.0
    }

    /// Consume the extractor, returning the caller.
    pub fn into_user(self) -> CurrentUser {
        self.0
    }
}

impl<P: RequiredPermission> std::fmt::Debug for Authorized<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Authorized")
            .field(&P::NAME)
            .field(&self.0.user.id)
            .finish()
    }
}

#[async_trait]
impl<S, P> FromRequestParts<S> for Authorized<P>
where
    S: Send + Sync,
    P: RequiredPermission,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        check_permission(&user, P::NAME)?;
        Ok(Authorized(user, PhantomData))
    }
}
