//! Role model for Tollgate.

use std::collections::BTreeSet;

/// A named role. Permissions are stored separately as grants.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Role {
    /// Unique role ID.
    pub id: i64,
    /// Role name (unique).
    pub name: String,
    /// Human readable description.
    pub description: Option<String>,
    /// Superusers pass every permission check.
    pub is_superuser: bool,
    /// Creation timestamp.
    pub created_at: String,
}

/// Data for creating a new role.
#[derive(Debug, Clone)]
pub struct NewRole {
    /// Role name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Whether the role is a superuser role.
    pub is_superuser: bool,
}

impl NewRole {
    /// Create a regular role.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            is_superuser: false,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the role as superuser.
    pub fn superuser(mut self) -> Self {
        self.is_superuser = true;
        self
    }
}

/// A role together with the names of its granted permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleWithPermissions {
    /// The role row.
    pub role: Role,
    /// Granted permission names.
    pub permissions: BTreeSet<String>,
}
