//! Account signup and login.

use thiserror::Error;
use tracing::{debug, info};

use super::password::{dummy_verify, hash_password, verify_password, PasswordError};
use super::token::{TokenError, TokenService};
use super::validation::{validate_signup, ValidationError};
use crate::config::RolesConfig;
use crate::db::{get_or_create_role_in, grant_in, insert_user_in, Account, AccountStore, NewUser};
use crate::db::{Database, User, UserRepository};
use crate::TollgateError;

/// Signup-specific errors.
#[derive(Error, Debug)]
pub enum SignupError {
    /// Validation failed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Username already exists.
    #[error("username already registered")]
    UsernameTaken,

    /// Email already exists.
    #[error("email already registered")]
    EmailTaken,

    /// The requested role cannot be self-assigned.
    #[error("role {0:?} cannot be requested at signup")]
    RoleNotAssignable(String),

    /// Password hashing failed.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<TollgateError> for SignupError {
    fn from(e: TollgateError) -> Self {
        match e {
            TollgateError::Conflict(msg) if msg.contains("users.email") => SignupError::EmailTaken,
            TollgateError::Conflict(msg) if msg.contains("users.username") => {
                SignupError::UsernameTaken
            }
            other => SignupError::Database(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for SignupError {
    fn from(e: sqlx::Error) -> Self {
        TollgateError::from(e).into()
    }
}

/// Login errors.
#[derive(Error, Debug)]
pub enum LoginError {
    /// Unknown account or wrong password. The two are not distinguished.
    #[error("incorrect username or password")]
    InvalidCredentials,

    /// Lookup or verification failed for an operational reason.
    #[error("login failed: {0}")]
    Internal(String),
}

/// Signup request data.
#[derive(Debug, Clone)]
pub struct SignupRequest {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Requested role. The configured default role is used when absent.
    pub role_name: Option<String>,
}

impl SignupRequest {
    /// Create a new signup request.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            role_name: None,
        }
    }

    /// Request a specific role.
    pub fn with_role(mut self, role_name: impl Into<String>) -> Self {
        self.role_name = Some(role_name.into());
        self
    }
}

/// Register a new account.
///
/// This function:
/// 1. Validates all input fields
/// 2. Rejects a taken username, then a taken email, before writing anything
/// 3. Hashes the password
/// 4. In one transaction, gets or creates the role, grants the configured
///    default permissions when it is the default role, and inserts the user
///
/// Superuser roles are refused. Roles that do not exist yet are created
/// without grants unless they are the default role.
pub async fn signup(
    db: &Database,
    roles: &RolesConfig,
    request: SignupRequest,
) -> Result<User, SignupError> {
    validate_signup(
        &request.username,
        &request.email,
        &request.password,
        &request.first_name,
        &request.last_name,
    )?;

    let users = UserRepository::new(db.pool());
    if users.username_exists(&request.username).await? {
        return Err(SignupError::UsernameTaken);
    }
    if users.email_exists(&request.email).await? {
        return Err(SignupError::EmailTaken);
    }

    let password_hash = hash_blocking(request.password.clone()).await?;

    let role_name = request
        .role_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(roles.default_role_name.as_str())
        .to_string();

    let mut tx = db.pool().begin().await?;

    let role = get_or_create_role_in(&mut tx, &role_name, None).await?;
    if role.is_superuser {
        debug!(role = %role_name, "Refusing superuser role at signup");
        return Err(SignupError::RoleNotAssignable(role_name));
    }
    if role.name == roles.default_role_name {
        for permission in &roles.default_permissions {
            grant_in(&mut tx, role.id, permission).await?;
        }
    }

    let new_user = NewUser::new(
        request.username.trim(),
        request.email.trim(),
        password_hash,
        role.id,
    )
    .with_first_name(request.first_name.trim())
    .with_last_name(request.last_name.trim());
    let user = insert_user_in(&mut tx, &new_user).await?;

    tx.commit().await?;

    info!(user_id = user.id, username = %user.username, role = %role.name, "Account created");
    Ok(user)
}

/// Check a username-or-email and password.
///
/// Unknown accounts still run a password verification.
pub async fn authenticate(
    store: &dyn AccountStore,
    identifier: &str,
    password: &str,
) -> Result<Account, LoginError> {
    let account = store
        .find_account_by_login(identifier.trim())
        .await
        .map_err(|e| LoginError::Internal(e.to_string()))?;

    let Some(account) = account else {
        let password = password.to_string();
        let _ = tokio::task::spawn_blocking(move || dummy_verify(&password)).await;
        debug!("Login for unknown account");
        return Err(LoginError::InvalidCredentials);
    };

    let password = password.to_string();
    let hash = account.user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| LoginError::Internal(e.to_string()))?;

    if !matches {
        debug!(user_id = account.user.id, "Login with wrong password");
        return Err(LoginError::InvalidCredentials);
    }

    info!(user_id = account.user.id, "Login succeeded");
    Ok(account)
}

/// Issue an access token for an authenticated account.
pub fn issue_token_for(tokens: &TokenService, account: &Account) -> Result<String, TokenError> {
    let role = account.role.as_ref().ok_or(TokenError::MissingRole)?;
    tokens.issue_for(&account.user, role)
}

/// Hash on the blocking thread pool.
pub(crate) async fn hash_blocking(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::Hash(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::KeyStore;
    use crate::db::{NewRole, RoleRepository};
    use std::sync::Arc;

    const PRIVATE_PEM: &str = include_str!("../../tests/fixtures/private_key.pem");
    const PUBLIC_PEM: &str = include_str!("../../tests/fixtures/public_key.pem");

    async fn setup() -> (Database, RolesConfig) {
        (Database::open_in_memory().await.unwrap(), RolesConfig::default())
    }

    fn request(username: &str) -> SignupRequest {
        SignupRequest::new(
            username,
            format!("{username}@example.com"),
            "correct horse",
            "First",
            "Last",
        )
    }

    #[tokio::test]
    async fn test_signup_assigns_default_role_with_default_grants() {
        let (db, roles) = setup().await;

        let user = signup(&db, &roles, request("alice")).await.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.first_name.as_deref(), Some("First"));
        assert!(user.password_hash.starts_with("$argon2id$"));

        let role = RoleRepository::new(db.pool())
            .get_with_permissions(user.role_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(role.role.name, "basic_user");
        assert!(!role.role.is_superuser);
        assert!(role.permissions.contains("files:profile-picture"));
    }

    #[tokio::test]
    async fn test_signup_with_new_role_gets_no_grants() {
        let (db, roles) = setup().await;

        let user = signup(&db, &roles, request("fin").with_role("finance_analyst"))
            .await
            .unwrap();
        let role = RoleRepository::new(db.pool())
            .get_with_permissions(user.role_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(role.role.name, "finance_analyst");
        assert!(role.permissions.is_empty());
    }

    #[tokio::test]
    async fn test_signup_reuses_existing_role() {
        let (db, roles) = setup().await;
        let existing = RoleRepository::new(db.pool())
            .ensure("support_agent", None, false, &["support:tickets:view"])
            .await
            .unwrap();

        let user = signup(&db, &roles, request("sam").with_role("support_agent"))
            .await
            .unwrap();
        assert_eq!(user.role_id, existing.role.id);
    }

    #[tokio::test]
    async fn test_signup_blank_role_uses_default() {
        let (db, roles) = setup().await;
        let user = signup(&db, &roles, request("alice").with_role("  "))
            .await
            .unwrap();
        let role = RoleRepository::new(db.pool())
            .get_by_id(user.role_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(role.name, "basic_user");
    }

    #[tokio::test]
    async fn test_signup_refuses_superuser_role() {
        let (db, roles) = setup().await;
        RoleRepository::new(db.pool())
            .create(&NewRole::new("super_admin").superuser())
            .await
            .unwrap();

        let result = signup(&db, &roles, request("mallory").with_role("super_admin")).await;
        assert!(matches!(result, Err(SignupError::RoleNotAssignable(_))));
        assert_eq!(UserRepository::new(db.pool()).count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_username_makes_no_writes() {
        let (db, roles) = setup().await;
        signup(&db, &roles, request("alice")).await.unwrap();
        let roles_before = RoleRepository::new(db.pool()).list_all().await.unwrap();

        let dup = SignupRequest::new("alice", "other@example.com", "correct horse", "A", "B")
            .with_role("brand_new_role");
        let result = signup(&db, &roles, dup).await;

        assert!(matches!(result, Err(SignupError::UsernameTaken)));
        assert_eq!(UserRepository::new(db.pool()).count().await.unwrap(), 1);
        let roles_after = RoleRepository::new(db.pool()).list_all().await.unwrap();
        assert_eq!(roles_before, roles_after);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (db, roles) = setup().await;
        signup(&db, &roles, request("alice")).await.unwrap();

        let dup = SignupRequest::new("alice2", "ALICE@example.com", "correct horse", "A", "B");
        assert!(matches!(
            signup(&db, &roles, dup).await,
            Err(SignupError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn test_username_checked_before_email() {
        let (db, roles) = setup().await;
        signup(&db, &roles, request("alice")).await.unwrap();

        let dup = SignupRequest::new("alice", "alice@example.com", "correct horse", "A", "B");
        assert!(matches!(
            signup(&db, &roles, dup).await,
            Err(SignupError::UsernameTaken)
        ));
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let (db, roles) = setup().await;
        let short = SignupRequest::new("alice", "alice@example.com", "short", "A", "B");
        assert!(matches!(
            signup(&db, &roles, short).await,
            Err(SignupError::Validation(ValidationError::Password(_)))
        ));

        let bad_email = SignupRequest::new("alice", "nope", "correct horse", "A", "B");
        assert!(matches!(
            signup(&db, &roles, bad_email).await,
            Err(SignupError::Validation(ValidationError::EmailInvalidFormat))
        ));
    }

    #[test]
    fn test_conflict_mapping() {
        let email = TollgateError::Conflict("UNIQUE constraint failed: users.email".to_string());
        assert!(matches!(SignupError::from(email), SignupError::EmailTaken));
        let username =
            TollgateError::Conflict("UNIQUE constraint failed: users.username".to_string());
        assert!(matches!(
            SignupError::from(username),
            SignupError::UsernameTaken
        ));
    }

    #[tokio::test]
    async fn test_authenticate_by_username_or_email() {
        let (db, roles) = setup().await;
        let user = signup(&db, &roles, request("alice")).await.unwrap();

        let by_name = authenticate(&db, "alice", "correct horse").await.unwrap();
        assert_eq!(by_name.user.id, user.id);

        let by_email = authenticate(&db, "alice@example.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(by_email.user.id, user.id);
        assert_eq!(
            by_email.role.map(|r| r.role.name),
            Some("basic_user".to_string())
        );
    }

    #[tokio::test]
    async fn test_authenticate_failures_are_indistinguishable() {
        let (db, roles) = setup().await;
        signup(&db, &roles, request("alice")).await.unwrap();

        let wrong = authenticate(&db, "alice", "wrong password").await.unwrap_err();
        let unknown = authenticate(&db, "nobody", "correct horse").await.unwrap_err();
        assert!(matches!(wrong, LoginError::InvalidCredentials));
        assert!(matches!(unknown, LoginError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_issue_token_for_account() {
        let (db, roles) = setup().await;
        let user = signup(&db, &roles, request("alice")).await.unwrap();
        let tokens = TokenService::new(
            Arc::new(KeyStore::from_pem(PRIVATE_PEM, PUBLIC_PEM)),
            chrono::Duration::minutes(60),
        );

        let account = authenticate(&db, "alice", "correct horse").await.unwrap();
        let token = issue_token_for(&tokens, &account).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.subject_id(), Some(user.id));
        assert_eq!(claims.role, "basic_user");
        assert_eq!(claims.perms, vec!["files:profile-picture"]);

        let orphan = Account {
            user: account.user.clone(),
            role: None,
        };
        assert!(matches!(
            issue_token_for(&tokens, &orphan),
            Err(TokenError::MissingRole)
        ));
    }
}
