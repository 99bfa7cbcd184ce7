//! Image file storage for landing pages.
//!
//! Uploaded images live as plain files under `{data_dir}/uploads/` and are
//! referenced from rows as `/uploads/<name>` path strings. The database row
//! is the authoritative side of that pairing: saves happen before the row
//! that references them is committed, deletions only after the row change is
//! confirmed (or as compensation while failing a request). Deletion is
//! always best-effort; a failure leaves an orphaned file, never a row
//! pointing at a missing one.

use chrono::Utc;
use rand::Rng;
use std::path::{Path, PathBuf};

use crate::error::ApiError;

/// Upload size cap: 5 MiB.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Accepted image file extensions.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["jpeg", "jpg", "png", "gif"];

/// Public path prefix under which stored images are referenced.
pub const PUBLIC_PREFIX: &str = "/uploads/";

/// Compute the uploads directory path.
pub fn uploads_dir(data_dir: &str) -> PathBuf {
    Path::new(data_dir).join("uploads")
}

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn content_type_allowed(content_type: &str) -> bool {
    matches!(
        content_type,
        "image/jpeg" | "image/jpg" | "image/png" | "image/gif"
    )
}

/// Validate and store one uploaded image, returning its public path.
///
/// Both the file extension and the declared content type must be in the
/// allowed set, and the payload must fit the size cap; nothing is written
/// until all three checks pass. The stored name is collision-resistant:
/// field name, millisecond timestamp, random suffix, original extension.
pub fn save_image(
    data_dir: &str,
    original_name: &str,
    content_type: &str,
    data: &[u8],
) -> Result<String, ApiError> {
    let ext = extension_of(original_name).ok_or_else(|| {
        ApiError::UnsupportedMedia(
            "Only image files are allowed (jpeg, jpg, png, gif)".to_string(),
        )
    })?;
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) || !content_type_allowed(content_type) {
        return Err(ApiError::UnsupportedMedia(
            "Only image files are allowed (jpeg, jpg, png, gif)".to_string(),
        ));
    }

    if data.len() > MAX_IMAGE_BYTES {
        return Err(ApiError::PayloadTooLarge(format!(
            "Image exceeds the {} byte limit",
            MAX_IMAGE_BYTES
        )));
    }

    let dir = uploads_dir(data_dir);
    std::fs::create_dir_all(&dir)
        .map_err(|e| ApiError::Storage(format!("Create uploads directory: {}", e)))?;

    let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
    let file_name = format!(
        "main_image-{}-{}.{}",
        Utc::now().timestamp_millis(),
        suffix,
        ext
    );

    let file_path = dir.join(&file_name);
    std::fs::write(&file_path, data)
        .map_err(|e| ApiError::Storage(format!("Write image file: {}", e)))?;

    tracing::debug!("Stored image {} ({} bytes)", file_path.display(), data.len());

    Ok(format!("{}{}", PUBLIC_PREFIX, file_name))
}

/// Delete a stored image by its public path. Idempotent and infallible from
/// the caller's point of view: a missing file logs a warning, any other I/O
/// failure logs an error, and paths outside `/uploads/` are ignored. Only
/// the basename is used, so a stored path can never escape the uploads dir.
pub fn delete_image(data_dir: &str, public_path: &str) {
    if !public_path.starts_with(PUBLIC_PREFIX) {
        return;
    }
    let Some(base_name) = Path::new(public_path).file_name() else {
        return;
    };

    let file_path = uploads_dir(data_dir).join(base_name);
    match std::fs::remove_file(&file_path) {
        Ok(()) => tracing::info!("Deleted image {}", file_path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("Tried to delete missing image {}", file_path.display());
        }
        Err(e) => {
            tracing::error!("Failed to delete image {}: {}", file_path.display(), e);
        }
    }
}

/// Fire-and-forget deletion for cleanup after a confirmed row change.
/// The response never waits on file removal.
pub fn spawn_delete_image(data_dir: String, public_path: String) {
    tokio::task::spawn_blocking(move || delete_image(&data_dir, &public_path));
}
