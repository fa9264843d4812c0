//! Multipart image uploads.

use axum::{
    body::Bytes,
    extract::{Multipart, State},
};
use serde::Serialize;

use super::{ApiResponse, ApiResult};
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::services::ServiceError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ImageUploaded {
    pub image_url: String,
}

/// A file part pulled out of a multipart body.
pub(crate) struct FilePart {
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

/// Read the first part named `name`, skipping any others.
pub(crate) async fn read_file_field(
    multipart: &mut Multipart,
    name: &str,
) -> Result<Option<FilePart>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(name) {
            continue;
        }
        let file_name = field.file_name().map(str::to_owned);
        let bytes = field.bytes().await?;
        return Ok(Some(FilePart { file_name, bytes }));
    }
    Ok(None)
}

/// POST /api/upload
///
/// Stores a catalog image from the `image` field and returns its public URL.
#[tracing::instrument(skip_all)]
pub async fn image(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    mut multipart: Multipart,
) -> ApiResult<ImageUploaded> {
    let part = read_file_field(&mut multipart, "image")
        .await?
        .filter(|p| !p.bytes.is_empty())
        .ok_or_else(|| ServiceError::InvalidInput("image is required".to_owned()))?;
    let original = part
        .file_name
        .ok_or_else(|| ServiceError::InvalidInput("image must have a file name".to_owned()))?;

    let storage = state.uploads();
    let stored = storage
        .save(&original, &part.bytes)
        .await
        .map_err(ServiceError::from)?;
    let image_url = storage.public_url(&state.config().base_url, &stored);

    tracing::info!(file = %stored, "Catalog image uploaded");
    Ok(ApiResponse::ok(ImageUploaded { image_url }))
}
