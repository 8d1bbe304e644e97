//! Request authorization.
//!
//! [`AuthGuard`] turns a bearer token into a [`CurrentUser`] and checks
//! permission names against the caller's role. The role and its grants are
//! read from the store on every call; the `perms` claim inside the token is
//! never used for decisions, so revoking a grant takes effect immediately.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error};

use super::permission::Permissions;
use super::token::{Claims, TokenError, TokenService};
use crate::db::{AccountStore, RoleWithPermissions, User};

/// Outcome of a rejected request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// No usable credentials were presented.
    #[error("could not validate credentials")]
    Unauthenticated,

    /// The caller is known but lacks the permission.
    #[error("insufficient permissions")]
    Forbidden,

    /// Storage or key material failed while deciding.
    #[error("internal error")]
    Internal,
}

/// The authenticated caller with their role as currently stored.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// The identity.
    pub user: User,
    /// The caller's role and grants, read at authentication time.
    pub role: Option<RoleWithPermissions>,
    /// Claims of the presented token.
    pub claims: Claims,
}

impl CurrentUser {
    /// The caller's user id.
    pub fn id(&self) -> i64 {
        self.user.id
    }

    /// The caller's role name, if any.
    pub fn role_name(&self) -> Option<&str> {
        self.role.as_ref().map(|r| r.role.name.as_str())
    }

    /// Effective permissions from the stored role.
    pub fn permissions(&self) -> Permissions {
        self.role
            .as_ref()
            .map(RoleWithPermissions::resolve)
            .unwrap_or_else(Permissions::none)
    }
}

/// Extract the token from an `Authorization` header value.
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Authenticates tokens and enforces permissions.
#[derive(Clone)]
pub struct AuthGuard {
    tokens: Arc<TokenService>,
    store: Arc<dyn AccountStore>,
}

impl AuthGuard {
    /// Create a guard verifying with `tokens` and resolving accounts from `store`.
    pub fn new(tokens: Arc<TokenService>, store: Arc<dyn AccountStore>) -> Self {
        Self { tokens, store }
    }

    /// The token service used for verification.
    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    /// Resolve a token to the current caller.
    ///
    /// Every failure other than an operational fault is reported as
    /// [`AccessError::Unauthenticated`].
    pub async fn authenticate(&self, token: Option<&str>) -> Result<CurrentUser, AccessError> {
        let token = token.ok_or(AccessError::Unauthenticated)?;

        let claims = match self.tokens.verify(token) {
            Ok(claims) => claims,
            Err(TokenError::Key(e)) => {
                error!(error = %e, "Verification key unavailable");
                return Err(AccessError::Internal);
            }
            Err(e) => {
                debug!(error = %e, "Rejected bearer token");
                return Err(AccessError::Unauthenticated);
            }
        };

        let Some(user_id) = claims.subject_id() else {
            debug!(sub = %claims.sub, "Token subject is not a user id");
            return Err(AccessError::Unauthenticated);
        };

        let account = match self.store.find_account(user_id).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                debug!(user_id, "Token subject no longer exists");
                return Err(AccessError::Unauthenticated);
            }
            Err(e) => {
                error!(user_id, error = %e, "Account lookup failed");
                return Err(AccessError::Internal);
            }
        };

        Ok(CurrentUser {
            user: account.user,
            role: account.role,
            claims,
        })
    }

    /// Check that `user` currently holds `permission`.
    pub fn authorize(&self, user: &CurrentUser, permission: &str) -> Result<(), AccessError> {
        check_permission(user, permission)
    }

    /// Authenticate, then authorize.
    pub async fn require(
        &self,
        token: Option<&str>,
        permission: &str,
    ) -> Result<CurrentUser, AccessError> {
        let user = self.authenticate(token).await?;
        self.authorize(&user, permission)?;
        Ok(user)
    }
}

impl std::fmt::Debug for AuthGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGuard")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

/// Permission check against the stored role of an authenticated caller.
///
/// No role means no permissions. A superuser role admits everything.
pub fn check_permission(user: &CurrentUser, permission: &str) -> Result<(), AccessError> {
    let Some(role) = &user.role else {
        debug!(user_id = user.id(), permission, "Caller has no role");
        return Err(AccessError::Forbidden);
    };

    if role.resolve().allows(permission) {
        Ok(())
    } else {
        debug!(
            user_id = user.id(),
            role = %role.role.name,
            permission,
            "Permission denied"
        );
        Err(AccessError::Forbidden)
    }
}
