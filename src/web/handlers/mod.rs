//! API handlers.

pub mod auth;
pub mod demo;
pub mod file;
pub mod user;

pub use auth::*;
pub use demo::*;
pub use file::*;
pub use user::*;

use std::sync::Arc;

use crate::auth::{AuthGuard, TokenService};
use crate::config::{Config, RolesConfig};
use crate::db::AccountStore;
use crate::notify::{LogNotifier, Notifier};
use crate::storage::{LocalImageStore, ProfileImageStore};
use crate::Database;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Database,
    /// Role provisioning settings used by signup.
    pub roles: RolesConfig,
    /// Token issuing and verification.
    pub tokens: Arc<TokenService>,
    /// Request authentication and permission checks.
    pub guard: AuthGuard,
    /// Profile picture storage.
    pub images: Arc<dyn ProfileImageStore>,
    /// Account notifications.
    pub notifier: Arc<dyn Notifier>,
    /// Largest accepted upload in bytes.
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Create the state with local image storage and log-only notifications.
    pub fn new(db: Database, config: &Config, tokens: Arc<TokenService>) -> Self {
        let store: Arc<dyn AccountStore> = Arc::new(db.clone());
        Self {
            guard: AuthGuard::new(tokens.clone(), store),
            db,
            roles: config.roles.clone(),
            tokens,
            images: Arc::new(LocalImageStore::new(
                &config.uploads.storage_path,
                config.uploads.public_base_url.clone(),
            )),
            notifier: Arc::new(LogNotifier),
            max_upload_bytes: config.uploads.max_upload_bytes(),
        }
    }

    /// Replace the image store.
    pub fn with_image_store(mut self, images: Arc<dyn ProfileImageStore>) -> Self {
        self.images = images;
        self
    }

    /// Replace the notifier.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("db", &self.db)
            .field("tokens", &self.tokens)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish_non_exhaustive()
    }
}
