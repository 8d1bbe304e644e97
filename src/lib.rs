//! Tollgate - authentication and role-based authorization core.
//!
//! Accounts carry exactly one role; roles carry permission grants. Clients
//! exchange a username and password for an RS256 access token, and every
//! protected request is admitted only if the caller's role, as currently
//! stored, grants the required permission.
//!
//! ```
//! use tollgate::{hash_password, verify_password};
//!
//! let hash = hash_password("correct horse").unwrap();
//! assert!(verify_password("correct horse", &hash));
//! assert!(!verify_password("wrong horse", &hash));
//! ```

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod notify;
pub mod storage;
pub mod web;

pub use auth::{
    bearer_token, check_permission, hash_password, validate_password, verify_password,
    AccessError, AuthGuard, Claims, CurrentUser, KeyError, KeyStore, LoginError, PasswordError,
    Permissions, SignupError, SignupRequest, TokenError, TokenService,
};
pub use config::Config;
pub use db::{
    Account, AccountStore, Database, NewRole, NewUser, Role, RoleRepository, RoleWithPermissions,
    User, UserRepository, UserUpdate,
};
pub use error::{Result, TollgateError};
