//! Test helpers for Web API integration tests.
//!
//! Builds the full router over an in-memory database, the fixture keypair
//! and a temporary upload directory.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use tollgate::auth::{seed_demo_data, SeedReport, DEMO_PASSWORD};
use tollgate::notify::{Notification, Notifier};
use tollgate::storage::LocalImageStore;
use tollgate::web::{create_router, AppState};
use tollgate::{Config, Database, KeyStore, TokenService};

pub const PRIVATE_KEY: &str = include_str!("../fixtures/private_key.pem");
pub const PUBLIC_KEY: &str = include_str!("../fixtures/public_key.pem");
pub const OTHER_PRIVATE_KEY: &str = include_str!("../fixtures/other_private_key.pem");
pub const OTHER_PUBLIC_KEY: &str = include_str!("../fixtures/other_public_key.pem");

/// Notifier that keeps every notification it is handed.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> tollgate::Result<()> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Notifier that always fails.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _: &Notification) -> tollgate::Result<()> {
        Err(tollgate::TollgateError::Io(std::io::Error::other(
            "mail relay unavailable",
        )))
    }
}

/// A running test application.
pub struct TestApp {
    pub server: TestServer,
    pub db: Database,
    pub tokens: Arc<TokenService>,
    pub notifier: Arc<RecordingNotifier>,
    pub uploads: TempDir,
    pub config: Config,
}

/// Token service signing with the fixture keypair.
pub fn fixture_tokens(config: &Config) -> Arc<TokenService> {
    let keys = Arc::new(KeyStore::from_pem(PRIVATE_KEY, PUBLIC_KEY));
    Arc::new(TokenService::new(keys, config.token.access_token_ttl()))
}

/// Token service signing with an unrelated keypair.
pub fn foreign_tokens() -> TokenService {
    let keys = Arc::new(KeyStore::from_pem(OTHER_PRIVATE_KEY, OTHER_PUBLIC_KEY));
    TokenService::new(keys, chrono::Duration::minutes(60))
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with(Config::default(), None).await
}

/// Build an app, optionally replacing the recording notifier.
pub async fn create_test_app_with(
    mut config: Config,
    notifier: Option<Arc<dyn Notifier>>,
) -> TestApp {
    let uploads = tempfile::tempdir().expect("Failed to create upload dir");
    config.uploads.storage_path = uploads.path().display().to_string();

    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let tokens = fixture_tokens(&config);
    let recording = Arc::new(RecordingNotifier::default());

    let state = AppState::new(db.clone(), &config, tokens.clone())
        .with_image_store(Arc::new(LocalImageStore::new(uploads.path(), None)))
        .with_notifier(notifier.unwrap_or_else(|| recording.clone() as Arc<dyn Notifier>));

    let router = create_router(Arc::new(state), &config.server.cors_origins);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        db,
        tokens,
        notifier: recording,
        uploads,
        config,
    }
}

impl TestApp {
    /// Provision the demo roles and users.
    pub async fn seed(&self) -> SeedReport {
        seed_demo_data(&self.db, &self.config.roles)
            .await
            .expect("Failed to seed demo data")
    }

    /// Log in through the API and return the access token.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .server
            .post("/api/auth/login")
            .json(&json!({ "username": username, "password": password }))
            .await;
        response.assert_status_ok();
        response.json::<Value>()["access_token"]
            .as_str()
            .expect("access_token missing")
            .to_string()
    }

    /// Log in as one of the seeded demo users.
    pub async fn login_demo(&self, username: &str) -> String {
        self.login(username, DEMO_PASSWORD).await
    }

    /// Sign up through the API and return the response body.
    pub async fn signup(&self, username: &str, email: &str, password: &str) -> Value {
        let response = self
            .server
            .post("/api/auth/signup")
            .json(&json!({
                "username": username,
                "email": email,
                "password": password,
                "first_name": "Test",
                "last_name": "User"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()
    }

    /// GET `path` with a bearer token.
    pub async fn get_as(&self, path: &str, token: &str) -> axum_test::TestResponse {
        self.server
            .get(path)
            .add_header(AUTHORIZATION, bearer(token))
            .await
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
