//! Credential hashing for Tollgate.
//!
//! Uses Argon2id with fixed parameters. Inputs above [`MAX_PASSWORD_BYTES`]
//! are refused when hashing and never match when verifying.

use std::sync::OnceLock;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand_core::OsRng;
use thiserror::Error;

/// Minimum password length in characters, enforced at signup.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length in UTF-8 bytes.
pub const MAX_PASSWORD_BYTES: usize = 100;

/// Password-related errors.
#[derive(Error, Debug)]
pub enum PasswordError {
    /// Password is too short.
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    TooShort,

    /// Password exceeds the byte ceiling.
    #[error("password must be at most {MAX_PASSWORD_BYTES} bytes")]
    TooLong,

    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Create the Argon2 hasher.
///
/// Parameters:
/// - Memory cost: 64 MiB (65536 KiB)
/// - Time cost: 3 iterations
/// - Parallelism: 4 lanes
fn create_argon2() -> Result<Argon2<'static>, PasswordError> {
    let params =
        Params::new(65536, 3, 4, None).map_err(|e| PasswordError::Hash(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password using Argon2id.
///
/// Returns a PHC-formatted string carrying the algorithm, parameters, salt and digest.
///
/// # Examples
///
/// ```
/// use tollgate::hash_password;
///
/// let hash = hash_password("correct horse").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(PasswordError::TooLong);
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = create_argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored hash.
///
/// Never fails: a malformed hash, an oversize password, or a mismatch all
/// return false. The rejected-early cases still run one verification
/// against a fixed hash so they cost the same as a real mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    if password.len() > MAX_PASSWORD_BYTES {
        burn_verification(password);
        return false;
    }

    match PasswordHash::new(hash) {
        // Parameters come from the parsed hash.
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => {
            burn_verification(password);
            false
        }
    }
}

/// Run a verification whose result is discarded.
///
/// Used when the account being logged into does not exist.
pub fn dummy_verify(password: &str) {
    burn_verification(password);
}

fn burn_verification(password: &str) {
    let Some(dummy) = dummy_hash() else {
        return;
    };
    let input = &password.as_bytes()[..password.len().min(MAX_PASSWORD_BYTES)];
    if let Ok(parsed) = PasswordHash::new(dummy) {
        let _ = Argon2::default().verify_password(input, &parsed);
    }
}

fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("tollgate-timing-equalizer").ok())
        .as_deref()
}

/// Validate a password against the signup policy.
///
/// Checks:
/// - Minimum length: 8 characters
/// - Maximum length: 100 bytes
///
/// # Examples
///
/// ```
/// use tollgate::validate_password;
///
/// assert!(validate_password("short").is_err());
/// assert!(validate_password("valid_password_123").is_ok());
/// ```
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(PasswordError::TooLong);
    }
    Ok(())
}
