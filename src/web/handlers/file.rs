//! Profile picture upload.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};

use crate::db::{UserRepository, UserUpdate};
use crate::storage::image_extension;
use crate::web::dto::UserResponse;
use crate::web::error::{ApiError, ErrorCode};
use crate::web::middleware::Authorized;
use crate::web::permissions::ProfilePicture;

use super::AppState;

const UNSUPPORTED: &str = "Only image uploads are supported";

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(ErrorCode::PayloadTooLarge, "Upload is too large")
    } else {
        tracing::debug!(error = %e, "Failed to read multipart field");
        ApiError::bad_request("Invalid multipart data")
    }
}

/// POST /api/files/profile-picture - Replace the caller's profile picture.
///
/// Request body: multipart/form-data with a `file` field of type JPEG, PNG
/// or WebP.
pub async fn upload_profile_picture(
    State(state): State<Arc<AppState>>,
    caller: Authorized<ProfilePicture>,
    mut multipart: Multipart,
) -> Result<Json<UserResponse>, ApiError> {
    let caller = caller.into_user();

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        if image_extension(&content_type).is_none() {
            return Err(ApiError::bad_request(UNSUPPORTED));
        }
        let data = field.bytes().await.map_err(multipart_error)?;
        upload = Some((content_type, data));
        break;
    }

    let (content_type, data) = upload.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    if data.len() > state.max_upload_bytes {
        return Err(ApiError::new(ErrorCode::PayloadTooLarge, "Upload is too large"));
    }

    let location = state
        .images
        .save_profile_picture(caller.id(), &content_type, &data)
        .await?;

    let user = UserRepository::new(state.db.pool())
        .update(
            caller.id(),
            &UserUpdate::new().profile_image_url(Some(location)),
        )
        .await?
        .ok_or_else(|| ApiError::from(crate::auth::AccessError::Unauthenticated))?;

    tracing::info!(user_id = user.id, "Profile picture updated");
    Ok(Json(UserResponse::new(user, caller.role)))
}
