use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::rpc::Session;

use super::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub url: String,
}

/// POST /api/assets - record an uploaded asset
///
/// Binary transport and blob storage live with the external upload
/// collaborator; this endpoint records the resulting hosted URL and
/// returns the Image row that catalog mutations reference by id.
/// Requires a session.
///
/// Expected Input:
/// ```json
/// { "url": "https://cdn.example.com/uploads/logo.png" }
/// ```
///
/// Expected Output:
/// ```json
/// { "success": true, "data": { "id": "...", "url": "...", "uploaderId": "...", "createdAt": "..." } }
/// ```
pub async fn upload(
    State(state): State<AppState>,
    Extension(session): Extension<Option<Session>>,
    Json(req): Json<UploadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = session
        .ok_or_else(|| ApiError::unauthenticated("you must be signed in to upload assets"))?;

    let image = state.store.create_image(&req.url, session.user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": image })),
    ))
}
