//! Configuration module for Tollgate.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::auth::{is_valid_permission_name, MIN_KEY_BITS};
use crate::{Result, TollgateError};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins (empty allows any origin without credentials).
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/tollgate.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Signing key configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct KeysConfig {
    /// PEM file holding the RSA private key.
    #[serde(default = "default_private_key_path")]
    pub private_key_path: PathBuf,
    /// PEM file holding the RSA public key.
    #[serde(default = "default_public_key_path")]
    pub public_key_path: PathBuf,
    /// Modulus size used by `generate-keys`.
    #[serde(default = "default_key_bits")]
    pub bits: usize,
}

fn default_private_key_path() -> PathBuf {
    PathBuf::from("keys/private_key.pem")
}

fn default_public_key_path() -> PathBuf {
    PathBuf::from("keys/public_key.pem")
}

fn default_key_bits() -> usize {
    MIN_KEY_BITS
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            private_key_path: default_private_key_path(),
            public_key_path: default_public_key_path(),
            bits: default_key_bits(),
        }
    }
}

/// Access token configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// Access token lifetime in minutes.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_minutes: i64,
}

/// Longest accepted access token lifetime: one year.
pub const MAX_ACCESS_TOKEN_EXPIRY_MINUTES: i64 = 365 * 24 * 60;

fn default_access_token_expiry() -> i64 {
    60
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_token_expiry_minutes: default_access_token_expiry(),
        }
    }
}

impl TokenConfig {
    /// Access token lifetime, capped at [`MAX_ACCESS_TOKEN_EXPIRY_MINUTES`].
    pub fn access_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(
            self.access_token_expiry_minutes
                .min(MAX_ACCESS_TOKEN_EXPIRY_MINUTES),
        )
    }
}

/// Role provisioning configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RolesConfig {
    /// Role assigned at signup when the request names none.
    #[serde(default = "default_role_name")]
    pub default_role_name: String,
    /// Superuser role used by `create-super-admin`.
    #[serde(default = "default_super_admin_role_name")]
    pub super_admin_role_name: String,
    /// Permissions granted to the default role when signup provisions it.
    #[serde(default = "default_role_permissions")]
    pub default_permissions: Vec<String>,
}

fn default_role_name() -> String {
    "basic_user".to_string()
}

fn default_super_admin_role_name() -> String {
    "super_admin".to_string()
}

fn default_role_permissions() -> Vec<String> {
    vec!["files:profile-picture".to_string()]
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            default_role_name: default_role_name(),
            super_admin_role_name: default_super_admin_role_name(),
            default_permissions: default_role_permissions(),
        }
    }
}

/// Profile picture upload configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadsConfig {
    /// Directory profile pictures are written to.
    #[serde(default = "default_upload_path")]
    pub storage_path: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Public URL prefix for stored pictures. When unset the stored path is returned.
    #[serde(default)]
    pub public_base_url: Option<String>,
}

fn default_upload_path() -> String {
    "uploads".to_string()
}

/// Largest accepted upload limit in megabytes.
pub const MAX_UPLOAD_SIZE_MB: u64 = 1024;

fn default_max_upload_size() -> u64 {
    5
}

impl UploadsConfig {
    /// Upload limit in bytes, capped at [`MAX_UPLOAD_SIZE_MB`].
    pub fn max_upload_bytes(&self) -> usize {
        let mb = self.max_upload_size_mb.min(MAX_UPLOAD_SIZE_MB);
        usize::try_from(mb * 1024 * 1024).unwrap_or(usize::MAX)
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            storage_path: default_upload_path(),
            max_upload_size_mb: default_max_upload_size(),
            public_base_url: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Empty disables file output.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/tollgate.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Signing key configuration.
    #[serde(default)]
    pub keys: KeysConfig,
    /// Access token configuration.
    #[serde(default)]
    pub token: TokenConfig,
    /// Role provisioning configuration.
    #[serde(default)]
    pub roles: RolesConfig,
    /// Upload configuration.
    #[serde(default)]
    pub uploads: UploadsConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(TollgateError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| TollgateError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `TOLLGATE_PRIVATE_KEY_PATH`
    /// - `TOLLGATE_PUBLIC_KEY_PATH`
    /// - `TOLLGATE_DATABASE_PATH`
    /// - `TOLLGATE_TOKEN_EXPIRY_MINUTES` (ignored unless it parses as an integer)
    pub fn apply_env_overrides(&mut self) {
        if let Some(path) = non_empty_env("TOLLGATE_PRIVATE_KEY_PATH") {
            self.keys.private_key_path = PathBuf::from(path);
        }
        if let Some(path) = non_empty_env("TOLLGATE_PUBLIC_KEY_PATH") {
            self.keys.public_key_path = PathBuf::from(path);
        }
        if let Some(path) = non_empty_env("TOLLGATE_DATABASE_PATH") {
            self.database.path = path;
        }
        if let Some(minutes) = non_empty_env("TOLLGATE_TOKEN_EXPIRY_MINUTES") {
            match minutes.parse() {
                Ok(minutes) => self.token.access_token_expiry_minutes = minutes,
                Err(_) => tracing::warn!(
                    value = %minutes,
                    "Ignoring non-numeric TOLLGATE_TOKEN_EXPIRY_MINUTES"
                ),
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - the key size is below the minimum
    /// - the token lifetime is not positive or exceeds one year
    /// - the upload limit is zero or above [`MAX_UPLOAD_SIZE_MB`]
    /// - either role name is empty
    /// - a default permission is not a valid grant name
    pub fn validate(&self) -> Result<()> {
        if self.keys.bits < MIN_KEY_BITS {
            return Err(TollgateError::Config(format!(
                "keys.bits must be at least {MIN_KEY_BITS}, got {}",
                self.keys.bits
            )));
        }
        let expiry = self.token.access_token_expiry_minutes;
        if !(1..=MAX_ACCESS_TOKEN_EXPIRY_MINUTES).contains(&expiry) {
            return Err(TollgateError::Config(format!(
                "token.access_token_expiry_minutes must be between 1 and \
                 {MAX_ACCESS_TOKEN_EXPIRY_MINUTES}, got {expiry}"
            )));
        }
        let upload_mb = self.uploads.max_upload_size_mb;
        if !(1..=MAX_UPLOAD_SIZE_MB).contains(&upload_mb) {
            return Err(TollgateError::Config(format!(
                "uploads.max_upload_size_mb must be between 1 and {MAX_UPLOAD_SIZE_MB}, got {upload_mb}"
            )));
        }
        if self.roles.default_role_name.trim().is_empty()
            || self.roles.super_admin_role_name.trim().is_empty()
        {
            return Err(TollgateError::Config(
                "roles.default_role_name and roles.super_admin_role_name must be set".to_string(),
            ));
        }
        if let Some(bad) = self
            .roles
            .default_permissions
            .iter()
            .find(|name| !is_valid_permission_name(name))
        {
            return Err(TollgateError::Config(format!(
                "roles.default_permissions contains an invalid permission name: {bad:?}"
            )));
        }
        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}
