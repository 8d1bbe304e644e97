//! Operator provisioning: the super admin account and demo data.

use tracing::info;

use super::registration::hash_blocking;
use crate::config::RolesConfig;
use crate::db::{ensure_role_in, insert_user_in, Database, NewUser, RoleRepository, User, UserRepository};
use crate::{Result, TollgateError};

/// Password given to every demo account.
pub const DEMO_PASSWORD: &str = "ChangeMe123!";

/// Details for the super admin account.
#[derive(Debug, Clone)]
pub struct SuperAdminRequest {
    /// Login username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

impl SuperAdminRequest {
    /// Create a request with the default "System Admin" name.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            first_name: "System".to_string(),
            last_name: "Admin".to_string(),
        }
    }
}

/// Create an account holding the configured superuser role.
///
/// The role is created if needed, or upgraded to superuser if it exists.
/// Fails with [`TollgateError::Conflict`] if the username or email is taken.
pub async fn create_super_admin(
    db: &Database,
    roles: &RolesConfig,
    request: SuperAdminRequest,
) -> Result<User> {
    if request.password.is_empty() {
        return Err(TollgateError::Validation(
            "password cannot be empty".to_string(),
        ));
    }

    let users = UserRepository::new(db.pool());
    if users.username_exists(&request.username).await? || users.email_exists(&request.email).await? {
        return Err(TollgateError::Conflict(
            "a user with that username or email already exists".to_string(),
        ));
    }

    let password_hash = hash_blocking(request.password).await?;

    let mut tx = db.pool().begin().await?;
    let role = ensure_role_in(
        &mut tx,
        &roles.super_admin_role_name,
        Some("Super administrator with full access"),
        true,
        &[],
    )
    .await?;
    let user = insert_user_in(
        &mut tx,
        &NewUser::new(request.username, request.email, password_hash, role.role.id)
            .with_first_name(request.first_name)
            .with_last_name(request.last_name),
    )
    .await?;
    tx.commit().await?;

    info!(user_id = user.id, username = %user.username, role = %role.role.name, "Super admin created");
    Ok(user)
}

struct DemoRole {
    name: String,
    description: &'static str,
    permissions: &'static [&'static str],
    is_superuser: bool,
}

struct DemoUser {
    username: &'static str,
    email: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    role_name: String,
}

fn demo_roles(roles: &RolesConfig) -> Vec<DemoRole> {
    vec![
        DemoRole {
            name: roles.super_admin_role_name.clone(),
            description: "Super admins can access everything",
            permissions: &[],
            is_superuser: true,
        },
        DemoRole {
            name: "finance_analyst".to_string(),
            description: "Finance can view finance reports",
            permissions: &["reports:finance"],
            is_superuser: false,
        },
        DemoRole {
            name: "operations_manager".to_string(),
            description: "Operations can read their reports",
            permissions: &["reports:operations"],
            is_superuser: false,
        },
        DemoRole {
            name: "support_agent".to_string(),
            description: "Support agents can manage tickets",
            permissions: &["support:tickets:view", "support:tickets:create"],
            is_superuser: false,
        },
        DemoRole {
            name: roles.default_role_name.clone(),
            description: "Basic user with profile upload access",
            permissions: &["files:profile-picture"],
            is_superuser: false,
        },
    ]
}

fn demo_users(roles: &RolesConfig) -> Vec<DemoUser> {
    vec![
        DemoUser {
            username: "finance_user",
            email: "finance@example.com",
            first_name: "Fin",
            last_name: "User",
            role_name: "finance_analyst".to_string(),
        },
        DemoUser {
            username: "ops_user",
            email: "ops@example.com",
            first_name: "Ops",
            last_name: "User",
            role_name: "operations_manager".to_string(),
        },
        DemoUser {
            username: "support_user",
            email: "support@example.com",
            first_name: "Support",
            last_name: "Agent",
            role_name: "support_agent".to_string(),
        },
        DemoUser {
            username: "basic_user",
            email: "basic@example.com",
            first_name: "Basic",
            last_name: "User",
            role_name: roles.default_role_name.clone(),
        },
    ]
}

/// What [`seed_demo_data`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Roles created or updated.
    pub roles: usize,
    /// Demo users created. Existing usernames are skipped.
    pub users_created: usize,
}

/// Provision the demo roles and one user per non-superuser role.
///
/// Safe to run repeatedly: roles are upserted and existing users are left alone.
pub async fn seed_demo_data(db: &Database, roles: &RolesConfig) -> Result<SeedReport> {
    let role_repo = RoleRepository::new(db.pool());
    let user_repo = UserRepository::new(db.pool());
    let mut report = SeedReport::default();

    for role in demo_roles(roles) {
        role_repo
            .ensure(
                &role.name,
                Some(role.description),
                role.is_superuser,
                role.permissions,
            )
            .await?;
        report.roles += 1;
    }

    for demo in demo_users(roles) {
        if user_repo.username_exists(demo.username).await? {
            continue;
        }
        let Some(role) = role_repo.get_by_name(&demo.role_name).await? else {
            continue;
        };

        let password_hash = hash_blocking(DEMO_PASSWORD.to_string()).await?;
        user_repo
            .create(
                &NewUser::new(demo.username, demo.email, password_hash, role.id)
                    .with_first_name(demo.first_name)
                    .with_last_name(demo.last_name),
            )
            .await?;
        report.users_created += 1;
    }

    info!(
        roles = report.roles,
        users_created = report.users_created,
        "Demo data seeded"
    );
    Ok(report)
}
