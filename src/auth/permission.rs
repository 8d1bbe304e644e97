//! Permission sets and their resolution from roles.
//!
//! A role either carries the superuser flag, which admits every permission,
//! or a finite set of granted permission names.

use std::collections::BTreeSet;

use crate::db::{Role, RoleWithPermissions};

/// Claim value standing for "every permission".
pub const WILDCARD: &str = "*";

/// The effective permissions of a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permissions {
    /// Superuser: every permission is admitted.
    All,
    /// Exactly these permission names.
    Granted(BTreeSet<String>),
}

impl Permissions {
    /// An empty grant set.
    pub fn none() -> Self {
        Permissions::Granted(BTreeSet::new())
    }

    /// Check whether `permission` is admitted.
    ///
    /// # Examples
    ///
    /// ```
    /// use tollgate::Permissions;
    ///
    /// let perms = Permissions::from_claim(&["reports:finance".to_string()]);
    /// assert!(perms.allows("reports:finance"));
    /// assert!(!perms.allows("reports:operations"));
    /// assert!(Permissions::All.allows("anything"));
    /// ```
    pub fn allows(&self, permission: &str) -> bool {
        match self {
            Permissions::All => true,
            Permissions::Granted(names) => names.contains(permission),
        }
    }

    /// Whether this is the superuser set.
    pub fn is_all(&self) -> bool {
        matches!(self, Permissions::All)
    }

    /// Wire form used in the `perms` token claim.
    pub fn to_claim(&self) -> Vec<String> {
        match self {
            Permissions::All => vec![WILDCARD.to_string()],
            Permissions::Granted(names) => names.iter().cloned().collect(),
        }
    }

    /// Parse the `perms` claim. A list containing `"*"` means [`Permissions::All`].
    pub fn from_claim(claim: &[String]) -> Self {
        if claim.iter().any(|name| name == WILDCARD) {
            Permissions::All
        } else {
            Permissions::Granted(claim.iter().cloned().collect())
        }
    }
}

/// Effective permissions of a role given its grants.
///
/// The superuser flag short-circuits: grants are ignored.
pub fn resolve(role: &Role, grants: &BTreeSet<String>) -> Permissions {
    if role.is_superuser {
        Permissions::All
    } else {
        Permissions::Granted(grants.clone())
    }
}

impl RoleWithPermissions {
    /// Effective permissions of this role.
    pub fn resolve(&self) -> Permissions {
        resolve(&self.role, &self.permissions)
    }
}

/// Whether `name` may be stored as a grant.
///
/// Grant names are non-empty, contain no whitespace, and are never the
/// wildcard; superuser access comes only from the role flag.
pub fn is_valid_permission_name(name: &str) -> bool {
    !name.is_empty() && name != WILDCARD && !name.chars().any(char::is_whitespace)
}
