use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::storage::{BlobId, StorageError};
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

/// Served for every image; uploads are not inspected.
const IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// Headroom for multipart boundaries and part headers on top of the blob limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn image_body_limit(max_blob_size: u64) -> DefaultBodyLimit {
    let max = usize::try_from(max_blob_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(max.saturating_add(MULTIPART_OVERHEAD))
}

#[utoipa::path(
    post,
    path = "/images/",
    tag = "Images",
    operation_id = "uploadImage",
    summary = "Upload an image",
    description = "Stores the multipart `file` field under a new id and returns that id as plain text. Two uploads of the same bytes get different ids.",
    request_body(content_type = "multipart/form-data", description = "Multipart form with a `file` field"),
    responses(
        (status = 200, description = "Image stored; body is the new id", body = String, content_type = "text/plain"),
        (status = 400, description = "Missing `file` field or file too large (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let max_size = state.config.storage.max_blob_size;
    let mut data: Option<Vec<u8>> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue; // Ignore unknown fields.
        }

        let mut buf = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            if (buf.len() + chunk.len()) as u64 > max_size {
                return Err(AppError::Validation(format!(
                    "File exceeds maximum size of {max_size} bytes"
                )));
            }
            buf.extend_from_slice(&chunk);
        }
        data = Some(buf);
    }

    let data = data.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    let id = state.blob_store.create(&data).await?;

    tracing::info!(%id, size = data.len(), "Image uploaded");
    Ok((StatusCode::OK, id.to_string()))
}

#[utoipa::path(
    get,
    path = "/images/{id}",
    tag = "Images",
    operation_id = "getImage",
    summary = "Download an image",
    params(("id" = String, Path, description = "Image id returned by the upload")),
    responses(
        (status = 200, description = "Image bytes", content_type = "image/jpeg"),
        (status = 404, description = "No such image (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = BlobId::parse(&id)?;

    let location = state.blob_store.read(&id)?;
    let reader = location.open().await?;
    let size = location.size().await?;

    let body = Body::from_stream(ReaderStream::new(reader));
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, IMAGE_CONTENT_TYPE)
        .header(header::CONTENT_LENGTH, size.to_string())
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

#[utoipa::path(
    put,
    path = "/images/{id}",
    tag = "Images",
    operation_id = "replaceImage",
    summary = "Replace an image",
    description = "Overwrites the image with the raw request body. Creates it when the id is well-formed but unused.",
    params(("id" = String, Path, description = "Image id")),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 204, description = "Image stored"),
        (status = 400, description = "Malformed id or body too large (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, body), fields(id, size = body.len()))]
pub async fn replace_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let id = BlobId::parse(&id).map_err(|e| AppError::Validation(e.to_string()))?;
    state.blob_store.update(&id, &body).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/images/{id}",
    tag = "Images",
    operation_id = "deleteImage",
    summary = "Delete an image",
    description = "Idempotent: deleting a missing image also succeeds.",
    params(("id" = String, Path, description = "Image id")),
    responses(
        (status = 204, description = "Image deleted or absent"),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    match BlobId::parse(&id) {
        Ok(id) => {
            let removed = state.blob_store.delete(&id).await?;
            tracing::debug!(%id, removed, "Image delete");
        }
        // Never issued, so already absent.
        Err(StorageError::InvalidId(_)) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(StatusCode::NO_CONTENT)
}
