//! Account lookup abstraction consumed by the authorization guard.

use async_trait::async_trait;

use super::role::{NewRole, Role, RoleWithPermissions};
use super::user::User;
use super::{Database, RoleRepository, UserRepository};
use crate::Result;

/// A user together with their role and its current grants.
#[derive(Debug, Clone)]
pub struct Account {
    /// The identity.
    pub user: User,
    /// The assigned role, absent only if the role row has gone missing.
    pub role: Option<RoleWithPermissions>,
}

/// Storage operations needed to make authorization decisions.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Find a user by id, with their role and grants.
    async fn find_account(&self, user_id: i64) -> Result<Option<Account>>;

    /// Find a user by username or email, with their role and grants.
    async fn find_account_by_login(&self, identifier: &str) -> Result<Option<Account>>;

    /// Find a role by name.
    async fn find_role(&self, name: &str) -> Result<Option<RoleWithPermissions>>;

    /// Create a role.
    async fn create_role(&self, role: &NewRole) -> Result<Role>;

    /// Grant a permission to a role. Returns false if it was already granted.
    async fn create_grant(&self, role_id: i64, permission: &str) -> Result<bool>;

    /// List every role with its grants.
    async fn list_roles(&self) -> Result<Vec<RoleWithPermissions>>;
}

impl Database {
    async fn account_for(&self, user: Option<User>) -> Result<Option<Account>> {
        let Some(user) = user else {
            return Ok(None);
        };
        let role = RoleRepository::new(self.pool())
            .get_with_permissions(user.role_id)
            .await?;
        Ok(Some(Account { user, role }))
    }
}

#[async_trait]
impl AccountStore for Database {
    async fn find_account(&self, user_id: i64) -> Result<Option<Account>> {
        let user = UserRepository::new(self.pool()).get_by_id(user_id).await?;
        self.account_for(user).await
    }

    async fn find_account_by_login(&self, identifier: &str) -> Result<Option<Account>> {
        let user = UserRepository::new(self.pool())
            .get_by_username_or_email(identifier)
            .await?;
        self.account_for(user).await
    }

    async fn find_role(&self, name: &str) -> Result<Option<RoleWithPermissions>> {
        RoleRepository::new(self.pool())
            .get_by_name_with_permissions(name)
            .await
    }

    async fn create_role(&self, role: &NewRole) -> Result<Role> {
        RoleRepository::new(self.pool()).create(role).await
    }

    async fn create_grant(&self, role_id: i64, permission: &str) -> Result<bool> {
        RoleRepository::new(self.pool())
            .grant(role_id, permission)
            .await
    }

    async fn list_roles(&self) -> Result<Vec<RoleWithPermissions>> {
        RoleRepository::new(self.pool()).list_all().await
    }
}
