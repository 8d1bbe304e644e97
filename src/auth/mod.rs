//! Authentication and authorization core.
//!
//! - [`keys`]: RSA keypair loading, caching and generation
//! - [`password`]: Argon2id credential hashing
//! - [`token`]: RS256 access tokens
//! - [`permission`]: role permission sets
//! - [`guard`]: per-request authentication and permission checks
//! - [`registration`] and [`provision`]: account flows built on the above

pub mod guard;
pub mod keys;
pub mod password;
pub mod permission;
pub mod provision;
pub mod registration;
pub mod token;
pub mod validation;

pub use guard::{bearer_token, check_permission, AccessError, AuthGuard, CurrentUser};
pub use keys::{KeyError, KeyStore, MIN_KEY_BITS};
pub use password::{
    dummy_verify, hash_password, validate_password, verify_password, PasswordError,
    MAX_PASSWORD_BYTES, MIN_PASSWORD_LENGTH,
};
pub use permission::{is_valid_permission_name, resolve, Permissions, WILDCARD};
pub use provision::{
    create_super_admin, seed_demo_data, SeedReport, SuperAdminRequest, DEMO_PASSWORD,
};
pub use registration::{
    authenticate, issue_token_for, signup, LoginError, SignupError, SignupRequest,
};
pub use token::{Claims, TokenError, TokenService};
pub use validation::ValidationError;
