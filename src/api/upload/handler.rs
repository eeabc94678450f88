//! Image Upload Handler
//!
//! Accepts a multipart image (PNG, JPEG, WebP), re-encodes to JPEG and
//! stores it under the uploads dir. Filenames are content hashes, so the
//! same image uploaded twice lands on the same file.

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

use axum::Json;
use axum::extract::{Multipart, State};
use image::{DynamicImage, GenericImageView};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// Maximum file size (5MB)
const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Supported image formats
const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// JPEG quality for catalog images
const JPEG_QUALITY: u8 = 85;

/// Upload response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    /// Filename stem; used to reference the stored file
    pub public_id: String,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
    pub format: String,
}

fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn validate_image(data: &[u8], ext: &str) -> AppResult<()> {
    if data.len() > MAX_FILE_SIZE {
        return Err(AppError::validation(format!(
            "File too large. Maximum size is {}MB",
            MAX_FILE_SIZE / 1024 / 1024
        )));
    }
    let ext_lower = ext.to_lowercase();
    if !SUPPORTED_FORMATS.contains(&ext_lower.as_str()) {
        return Err(AppError::validation(format!(
            "Unsupported file format '{}'. Supported: {}",
            ext_lower,
            SUPPORTED_FORMATS.join(", ")
        )));
    }
    Ok(())
}

/// Re-encode as JPEG at the catalog quality setting
fn compress_image(data: &[u8]) -> AppResult<(DynamicImage, Vec<u8>)> {
    let img = image::load_from_memory(data)
        .map_err(|e| AppError::validation(format!("Invalid image: {e}")))?;

    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        let rgb_img = img.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
        rgb_img
            .write_with_encoder(encoder)
            .map_err(|e| AppError::internal(format!("Failed to compress image: {e}")))?;
    }
    Ok((img, buffer))
}

/// POST /api/upload (admin)
pub async fn upload(
    State(state): State<ServerState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    if !user.is_admin() {
        return Err(AppError::forbidden("Admin access required"));
    }

    let uploads_dir = state.config.uploads_dir();
    fs::create_dir_all(&uploads_dir)
        .map_err(|e| AppError::internal(format!("Failed to create uploads directory: {e}")))?;

    let mut field_data: Option<Vec<u8>> = None;
    let mut original_filename: Option<String> = None;
    let mut content_type: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            original_filename = field.file_name().map(|s| s.to_string());
            content_type = field.content_type().map(|s| s.to_string());
            field_data = Some(field.bytes().await?.to_vec());
            break;
        }
    }

    let data = field_data
        .ok_or_else(|| AppError::validation("No 'file' field found. Field name must be 'file'"))?;
    if data.is_empty() {
        return Err(AppError::validation("Empty file provided"));
    }

    // Extension from the filename, else from the declared content type
    let ext = original_filename
        .as_deref()
        .and_then(|name| {
            PathBuf::from(name)
                .extension()
                .and_then(|e| e.to_str().map(|s| s.to_string()))
        })
        .or_else(|| {
            content_type.as_deref().and_then(|ct| {
                mime_guess::get_mime_extensions_str(ct)
                    .and_then(|exts| exts.first())
                    .map(|e| e.to_string())
            })
        })
        .ok_or_else(|| AppError::validation("Cannot determine file type"))?;

    validate_image(&data, &ext)?;
    let (img, compressed) = compress_image(&data)?;

    let hash = calculate_hash(&compressed);
    let public_id = &hash[..32];
    let filename = format!("{public_id}.jpg");
    let file_path = uploads_dir.join(&filename);

    // Same content, same name; rewriting an identical file is harmless
    fs::write(&file_path, &compressed)
        .map_err(|e| AppError::internal(format!("Failed to save file: {e}")))?;

    info!(
        original_name = original_filename.as_deref().unwrap_or("unnamed"),
        size = compressed.len(),
        file = %filename,
        "Image uploaded"
    );

    let (width, height) = img.dimensions();
    Ok(Json(UploadResponse {
        url: format!("/uploads/{filename}"),
        public_id: public_id.to_string(),
        width,
        height,
        bytes: compressed.len(),
        format: "jpg".to_string(),
    }))
}
