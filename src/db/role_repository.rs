//! Role and permission grant repository for Tollgate.
//!
//! Creation paths lean on the unique constraints of `roles.name` and
//! `role_permissions(role_id, name)` rather than checking before inserting,
//! so concurrent signups naming the same role cannot create duplicates.

use std::collections::{BTreeMap, BTreeSet};

use sqlx::SqliteConnection;

use super::role::{NewRole, Role, RoleWithPermissions};
use super::DbPool;
use crate::auth::is_valid_permission_name;
use crate::{Result, TollgateError};

const ROLE_COLUMNS: &str = "id, name, description, is_superuser, created_at";

/// Repository for roles and their permission grants.
pub struct RoleRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> RoleRepository<'a> {
    /// Create a new RoleRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new role.
    ///
    /// Returns [`TollgateError::Conflict`] when the name is taken.
    pub async fn create(&self, new_role: &NewRole) -> Result<Role> {
        validate_role_name(&new_role.name)?;
        let role = sqlx::query_as::<_, Role>(&format!(
            "INSERT INTO roles (name, description, is_superuser) VALUES (?, ?, ?)
             RETURNING {ROLE_COLUMNS}"
        ))
        .bind(&new_role.name)
        .bind(&new_role.description)
        .bind(new_role.is_superuser)
        .fetch_one(self.pool)
        .await?;
        Ok(role)
    }

    /// Get a role by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(role)
    }

    /// Get a role by its exact name.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Role>> {
        let mut conn = self.pool.acquire().await?;
        role_by_name_in(&mut conn, name).await
    }

    /// Get a role by ID together with its grants.
    pub async fn get_with_permissions(&self, id: i64) -> Result<Option<RoleWithPermissions>> {
        let Some(role) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let permissions = self.permissions(role.id).await?;
        Ok(Some(RoleWithPermissions { role, permissions }))
    }

    /// Get a role by name together with its grants.
    pub async fn get_by_name_with_permissions(
        &self,
        name: &str,
    ) -> Result<Option<RoleWithPermissions>> {
        let Some(role) = self.get_by_name(name).await? else {
            return Ok(None);
        };
        let permissions = self.permissions(role.id).await?;
        Ok(Some(RoleWithPermissions { role, permissions }))
    }

    /// Names of the permissions granted to a role.
    pub async fn permissions(&self, role_id: i64) -> Result<BTreeSet<String>> {
        let mut conn = self.pool.acquire().await?;
        permissions_in(&mut conn, role_id).await
    }

    /// Return the role with this name, creating a regular role if absent.
    pub async fn get_or_create(&self, name: &str, description: Option<&str>) -> Result<Role> {
        let mut conn = self.pool.acquire().await?;
        get_or_create_role_in(&mut conn, name, description).await
    }

    /// Create or update a role for provisioning and grant it `permissions`.
    ///
    /// An existing superuser flag is never cleared and an existing
    /// description is kept.
    pub async fn ensure(
        &self,
        name: &str,
        description: Option<&str>,
        is_superuser: bool,
        permissions: &[&str],
    ) -> Result<RoleWithPermissions> {
        let mut tx = self.pool.begin().await?;
        let role = ensure_role_in(&mut tx, name, description, is_superuser, permissions).await?;
        tx.commit().await?;
        Ok(role)
    }

    /// Grant a permission to a role.
    ///
    /// Granting an existing permission is a no-op. Returns true when a new
    /// grant row was written.
    pub async fn grant(&self, role_id: i64, permission: &str) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        grant_in(&mut conn, role_id, permission).await
    }

    /// Revoke a permission from a role.
    ///
    /// Returns true if a grant was removed.
    pub async fn revoke(&self, role_id: i64, permission: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM role_permissions WHERE role_id = ? AND name = ?")
            .bind(role_id)
            .bind(permission)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a role and, through the cascade, its grants.
    ///
    /// Fails while users are still assigned to the role.
    pub async fn delete(&self, role_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM roles WHERE id = ?")
            .bind(role_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List every role with its grants, ordered by name.
    pub async fn list_all(&self) -> Result<Vec<RoleWithPermissions>> {
        let roles = sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles ORDER BY name"
        ))
        .fetch_all(self.pool)
        .await?;

        let grants: Vec<(i64, String)> =
            sqlx::query_as("SELECT role_id, name FROM role_permissions")
                .fetch_all(self.pool)
                .await?;

        let mut by_role: BTreeMap<i64, BTreeSet<String>> = BTreeMap::new();
        for (role_id, name) in grants {
            by_role.entry(role_id).or_default().insert(name);
        }

        Ok(roles
            .into_iter()
            .map(|role| {
                let permissions = by_role.remove(&role.id).unwrap_or_default();
                RoleWithPermissions { role, permissions }
            })
            .collect())
    }
}

fn validate_role_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(TollgateError::Validation(
            "role name must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_grant(permission: &str) -> Result<()> {
    if !is_valid_permission_name(permission) {
        return Err(TollgateError::Validation(format!(
            "invalid permission name: {permission:?}"
        )));
    }
    Ok(())
}

async fn role_by_name_in(conn: &mut SqliteConnection, name: &str) -> Result<Option<Role>> {
    let role = sqlx::query_as::<_, Role>(&format!(
        "SELECT {ROLE_COLUMNS} FROM roles WHERE name = ?"
    ))
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(role)
}

pub(crate) async fn permissions_in(
    conn: &mut SqliteConnection,
    role_id: i64,
) -> Result<BTreeSet<String>> {
    let names: Vec<String> =
        sqlx::query_scalar("SELECT name FROM role_permissions WHERE role_id = ?")
            .bind(role_id)
            .fetch_all(&mut *conn)
            .await?;
    Ok(names.into_iter().collect())
}

/// Insert-if-absent on the unique name, then read back.
pub(crate) async fn get_or_create_role_in(
    conn: &mut SqliteConnection,
    name: &str,
    description: Option<&str>,
) -> Result<Role> {
    validate_role_name(name)?;
    sqlx::query("INSERT INTO roles (name, description) VALUES (?, ?) ON CONFLICT(name) DO NOTHING")
        .bind(name)
        .bind(description)
        .execute(&mut *conn)
        .await?;

    role_by_name_in(conn, name)
        .await?
        .ok_or_else(|| TollgateError::NotFound(format!("role {name}")))
}

pub(crate) async fn grant_in(
    conn: &mut SqliteConnection,
    role_id: i64,
    permission: &str,
) -> Result<bool> {
    validate_grant(permission)?;
    let result = sqlx::query(
        "INSERT INTO role_permissions (role_id, name) VALUES (?, ?)
         ON CONFLICT(role_id, name) DO NOTHING",
    )
    .bind(role_id)
    .bind(permission)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn ensure_role_in(
    conn: &mut SqliteConnection,
    name: &str,
    description: Option<&str>,
    is_superuser: bool,
    permissions: &[&str],
) -> Result<RoleWithPermissions> {
    validate_role_name(name)?;
    for permission in permissions {
        validate_grant(permission)?;
    }

    let role = sqlx::query_as::<_, Role>(&format!(
        "INSERT INTO roles (name, description, is_superuser) VALUES (?, ?, ?)
         ON CONFLICT(name) DO UPDATE SET
             is_superuser = roles.is_superuser OR excluded.is_superuser,
             description = COALESCE(roles.description, excluded.description)
         RETURNING {ROLE_COLUMNS}"
    ))
    .bind(name)
    .bind(description)
    .bind(is_superuser)
    .fetch_one(&mut *conn)
    .await?;

    for permission in permissions {
        grant_in(conn, role.id, permission).await?;
    }

    let permissions = permissions_in(conn, role.id).await?;
    Ok(RoleWithPermissions { role, permissions })
}
