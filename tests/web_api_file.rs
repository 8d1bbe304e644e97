//! Web API Profile Picture Tests

mod common;

use axum::http::{header::AUTHORIZATION, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use serde_json::Value;

use common::{bearer, create_test_app, create_test_app_with};
use tollgate::{Config, RoleRepository, UserRepository};

const PASSWORD: &str = "Sup3rSecret!";
const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake image body";

fn image_form(content_type: &str, data: &[u8]) -> MultipartForm {
    let part = Part::bytes(data.to_vec())
        .file_name("avatar")
        .mime_type(content_type);
    MultipartForm::new().add_part("file", part)
}

#[tokio::test]
async fn test_upload_profile_picture() {
    let app = create_test_app().await;
    app.signup("alice", "alice@example.com", PASSWORD).await;
    let token = app.login("alice", PASSWORD).await;

    let response = app
        .server
        .post("/api/files/profile-picture")
        .add_header(AUTHORIZATION, bearer(&token))
        .multipart(image_form("image/png", PNG_BYTES))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["username"], "alice");
    let location = body["profile_image_url"].as_str().unwrap().to_string();
    assert!(location.ends_with(".png"));

    let stored = std::fs::read(&location).unwrap();
    assert_eq!(stored, PNG_BYTES);
    assert!(std::path::Path::new(&location).starts_with(app.uploads.path()));

    let user = UserRepository::new(app.db.pool())
        .get_by_username("alice")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.profile_image_url.as_deref(), Some(location.as_str()));
}

#[tokio::test]
async fn test_upload_rejects_non_images() {
    let app = create_test_app().await;
    app.signup("alice", "alice@example.com", PASSWORD).await;
    let token = app.login("alice", PASSWORD).await;

    let response = app
        .server
        .post("/api/files/profile-picture")
        .add_header(AUTHORIZATION, bearer(&token))
        .multipart(image_form("application/pdf", b"%PDF-1.7"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Only image uploads are supported");
}

#[tokio::test]
async fn test_upload_requires_file_field() {
    let app = create_test_app().await;
    app.signup("alice", "alice@example.com", PASSWORD).await;
    let token = app.login("alice", PASSWORD).await;

    let form = MultipartForm::new().add_text("description", "no file here");
    let response = app
        .server
        .post("/api/files/profile-picture")
        .add_header(AUTHORIZATION, bearer(&token))
        .multipart(form)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_too_large() {
    let mut config = Config::default();
    config.uploads.max_upload_size_mb = 1;
    let app = create_test_app_with(config, None).await;
    app.signup("alice", "alice@example.com", PASSWORD).await;
    let token = app.login("alice", PASSWORD).await;

    let data = vec![0u8; 1024 * 1024 + 1];
    let response = app
        .server
        .post("/api/files/profile-picture")
        .add_header(AUTHORIZATION, bearer(&token))
        .multipart(image_form("image/jpeg", &data))
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_upload_requires_permission() {
    let app = create_test_app().await;
    app.seed().await;
    let token = app.login_demo("support_user").await;

    let response = app
        .server
        .post("/api/files/profile-picture")
        .add_header(AUTHORIZATION, bearer(&token))
        .multipart(image_form("image/png", PNG_BYTES))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_upload_permission_follows_grant() {
    let app = create_test_app().await;
    app.seed().await;
    let token = app.login_demo("support_user").await;

    let repo = RoleRepository::new(app.db.pool());
    let role = repo.get_by_name("support_agent").await.unwrap().unwrap();
    repo.grant(role.id, "files:profile-picture").await.unwrap();

    let response = app
        .server
        .post("/api/files/profile-picture")
        .add_header(AUTHORIZATION, bearer(&token))
        .multipart(image_form("image/webp", b"RIFF....WEBP"))
        .await;

    response.assert_status_ok();
    assert!(response.json::<Value>()["profile_image_url"]
        .as_str()
        .unwrap()
        .ends_with(".webp"));
}

#[tokio::test]
async fn test_upload_requires_authentication() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/api/files/profile-picture")
        .multipart(image_form("image/png", PNG_BYTES))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}
