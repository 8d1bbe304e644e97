//! Error types for Tollgate.

use thiserror::Error;

use crate::auth::{KeyError, PasswordError, TokenError};

/// Common error type for Tollgate.
#[derive(Error, Debug)]
pub enum TollgateError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant, except unique
    /// constraint violations which become [`TollgateError::Conflict`].
    #[error("database error: {0}")]
    Database(String),

    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key store error.
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    /// Token issuance or verification error.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Credential hashing error.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for TollgateError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                TollgateError::Conflict(db_err.message().to_string())
            }
            _ => TollgateError::Database(e.to_string()),
        }
    }
}

/// Result type alias for Tollgate operations.
pub type Result<T> = std::result::Result<T, TollgateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = TollgateError::Validation("username too long".to_string());
        assert_eq!(err.to_string(), "validation error: username too long");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = TollgateError::NotFound("role".to_string());
        assert_eq!(err.to_string(), "role not found");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TollgateError = io_err.into();
        assert!(matches!(err, TollgateError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_password_error_conversion() {
        let err: TollgateError = PasswordError::TooLong.into();
        assert!(matches!(err, TollgateError::Password(PasswordError::TooLong)));
    }

    #[test]
    fn test_row_not_found_is_database_error() {
        let err: TollgateError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, TollgateError::Database(_)));
    }
}
