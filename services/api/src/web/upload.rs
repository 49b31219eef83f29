//! services/api/src/web/upload.rs
//!
//! The upload proxy: image uploads are validated at the boundary, then handed
//! to the configured `MediaStore`.

use crate::adapters::cloudinary::SignedUpload;
use crate::error::ApiError;
use crate::web::protocol::{
    ok, DeletedImage, Envelope, ErrorEnvelope, UploadSignature, UploadedImage,
};
use crate::web::state::AppState;
use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        Multipart, Path, State,
    },
    Json,
};
use futures::future::try_join_all;
use recipe_social_core::domain::{UploadOptions, UploadSource};
use std::sync::Arc;
use tracing::info;

pub const MAX_FILE_BYTES: usize = 2 * 1024 * 1024;
pub const MAX_FILES: usize = 10;
pub const UPLOAD_TRANSFORMATION: &str = "c_limit,h_1200,w_1200/q_auto/f_auto";

const SINGLE_FIELD: &str = "image";
const MULTIPLE_FIELDS: [&str; 2] = ["images", "images[]"];

/// A file read off the wire that passed the size and type checks.
struct IncomingImage {
    data: Vec<u8>,
    file_name: String,
    content_type: String,
}

impl IncomingImage {
    fn into_source(self) -> UploadSource {
        UploadSource::Bytes {
            data: self.data,
            file_name: self.file_name,
            content_type: self.content_type,
        }
    }
}

fn upload_options(state: &AppState) -> UploadOptions {
    UploadOptions {
        folder: state.config.upload_folder.clone(),
        transformation: Some(UPLOAD_TRANSFORMATION.to_string()),
    }
}

fn multipart_error(e: impl std::fmt::Display) -> ApiError {
    ApiError::BadRequest(format!("Invalid multipart body: {}", e))
}

/// Reads one field chunk by chunk, failing as soon as it exceeds the limit.
async fn read_image(mut field: Field<'_>) -> Result<IncomingImage, ApiError> {
    let content_type = field.content_type().unwrap_or_default().to_string();
    if !content_type.starts_with("image/") {
        return Err(ApiError::BadRequest(
            "Only image files are allowed".to_string(),
        ));
    }
    let file_name = field.file_name().unwrap_or("upload").to_string();

    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if data.len() + chunk.len() > MAX_FILE_BYTES {
            // Drain the rest so the client still reads the 400.
            while field.chunk().await.map_err(multipart_error)?.is_some() {}
            return Err(ApiError::BadRequest(
                "File too large. Maximum size is 2MB".to_string(),
            ));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(IncomingImage {
        data,
        file_name,
        content_type,
    })
}

/// Upload a single image.
#[utoipa::path(
    post,
    path = "/api/upload/single",
    request_body(content_type = "multipart/form-data", description = "One image in the `image` field (2MB max)."),
    responses(
        (status = 200, description = "Image uploaded", body = UploadedImage),
        (status = 400, description = "Missing file, wrong type or too large", body = ErrorEnvelope),
        (status = 500, description = "The media service rejected the upload", body = ErrorEnvelope)
    )
)]
pub async fn upload_single_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Envelope<UploadedImage>>, ApiError> {
    let mut multipart = multipart.map_err(multipart_error)?;

    let mut image = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some(SINGLE_FIELD) && image.is_none() {
            image = Some(read_image(field).await?);
        }
    }
    let image = image.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    let result = state
        .media
        .upload(image.into_source(), &upload_options(&state))
        .await?;
    info!("Uploaded image {}", result.public_id);
    Ok(ok(result.into()))
}

/// Upload up to ten images at once.
#[utoipa::path(
    post,
    path = "/api/upload/multiple",
    request_body(content_type = "multipart/form-data", description = "Images in the `images` field (10 max, 2MB each)."),
    responses(
        (status = 200, description = "Images uploaded, in request order", body = [UploadedImage]),
        (status = 400, description = "Missing files, too many, wrong type or too large", body = ErrorEnvelope),
        (status = 500, description = "The media service rejected an upload", body = ErrorEnvelope)
    )
)]
pub async fn upload_multiple_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Envelope<Vec<UploadedImage>>>, ApiError> {
    let mut multipart = multipart.map_err(multipart_error)?;

    // The whole batch is validated before anything is sent.
    let mut images = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let accepted = field
            .name()
            .map(|name| MULTIPLE_FIELDS.contains(&name))
            .unwrap_or(false);
        if !accepted {
            continue;
        }
        if images.len() == MAX_FILES {
            return Err(ApiError::BadRequest(format!(
                "Too many files. Maximum is {}",
                MAX_FILES
            )));
        }
        images.push(read_image(field).await?);
    }
    if images.is_empty() {
        return Err(ApiError::BadRequest("No files uploaded".to_string()));
    }

    let options = upload_options(&state);
    let uploads = images
        .into_iter()
        .map(|image| state.media.upload(image.into_source(), &options));
    let results = try_join_all(uploads).await?;
    info!("Uploaded {} images", results.len());
    Ok(ok(results.into_iter().map(UploadedImage::from).collect()))
}

/// Delete an uploaded image. Ids containing a folder must be percent-encoded.
#[utoipa::path(
    delete,
    path = "/api/upload/{public_id}",
    params(("public_id" = String, Path, description = "The media service's id for the image.")),
    responses(
        (status = 200, description = "Deletion result", body = DeletedImage),
        (status = 400, description = "Missing id", body = ErrorEnvelope),
        (status = 500, description = "The media service rejected the deletion", body = ErrorEnvelope)
    )
)]
pub async fn delete_upload_handler(
    State(state): State<Arc<AppState>>,
    Path(public_id): Path<String>,
) -> Result<Json<Envelope<DeletedImage>>, ApiError> {
    if public_id.trim().is_empty() {
        return Err(ApiError::BadRequest("Public ID is required".to_string()));
    }
    let result = state.media.destroy(&public_id).await?;
    info!("Deleted image {}: {}", public_id, result.result);
    Ok(ok(DeletedImage {
        result: result.result,
    }))
}

/// Issue signed parameters for a direct client-side upload.
#[utoipa::path(
    get,
    path = "/api/upload/signature",
    responses(
        (status = 200, description = "Signed upload parameters", body = UploadSignature),
        (status = 500, description = "Media service credentials are not configured", body = ErrorEnvelope)
    )
)]
pub async fn upload_signature_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Envelope<UploadSignature>>, ApiError> {
    let credentials = state.config.cloudinary.as_ref().ok_or_else(|| {
        ApiError::Internal("media service credentials are not configured".to_string())
    })?;
    let signed = SignedUpload::new(
        credentials,
        &state.config.upload_folder,
        UPLOAD_TRANSFORMATION,
        chrono::Utc::now().timestamp(),
    );
    Ok(ok(signed.into()))
}
