//! Image upload handling for the admin panel: MIME and size checks, a
//! sanitized timestamped filename under a target-specific folder, and a
//! traversal-guarded best-effort delete of the file a record previously
//! referenced.

use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use tracing::warn;

use crate::error::{AppError, AppResult};

pub const ALLOWED_IMAGE_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/webp", "image/gif"];

pub const ALLOWED_TARGETS: [&str; 2] = ["projects", "profile"];

pub const MAX_IMAGE_BYTES: usize = 3 * 1024 * 1024;

/// Public URL prefix the upload directory is served under.
pub const PUBLIC_PREFIX: &str = "/uploads/";

/// Keep only characters safe in a filename; collapse the rest to '-'.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches(['-', '.']);
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

fn validate_upload(target: &str, content_type: &str, size: usize) -> AppResult<()> {
    if !ALLOWED_TARGETS.contains(&target) {
        return Err(AppError::InvalidPayload(format!(
            "unknown upload target: '{target}'"
        )));
    }
    if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
        return Err(AppError::InvalidPayload(format!(
            "unsupported image type: '{content_type}'"
        )));
    }
    if size == 0 {
        return Err(AppError::InvalidPayload("file is empty".to_string()));
    }
    if size > MAX_IMAGE_BYTES {
        return Err(AppError::InvalidPayload(format!(
            "file exceeds the {} MB limit",
            MAX_IMAGE_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Write an uploaded image and return its public relative URL.
pub async fn store_image(
    upload_dir: &str,
    target: &str,
    file_name: &str,
    content_type: &str,
    bytes: &[u8],
) -> AppResult<String> {
    validate_upload(target, content_type, bytes.len())?;

    let name = format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        sanitize_file_name(file_name)
    );

    let dir = Path::new(upload_dir).join(target);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Configuration(format!("cannot create upload dir: {e}")))?;

    let path = dir.join(&name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| AppError::Configuration(format!("cannot write upload: {e}")))?;

    Ok(format!("{PUBLIC_PREFIX}{target}/{name}"))
}

/// Resolve a public URL back to a path inside the upload directory.
/// Rejects anything outside the `/uploads/` prefix or containing traversal.
pub fn resolve_public_url(upload_dir: &str, public_url: &str) -> AppResult<PathBuf> {
    let relative = public_url.strip_prefix(PUBLIC_PREFIX).ok_or_else(|| {
        AppError::InvalidPayload(format!("'{public_url}' is not an uploaded file URL"))
    })?;

    let relative_path = Path::new(relative);
    let traversal = relative_path
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if traversal || relative.is_empty() {
        return Err(AppError::InvalidPayload(
            "upload path may not traverse directories".to_string(),
        ));
    }

    Ok(Path::new(upload_dir).join(relative_path))
}

/// Best-effort removal of a previously uploaded file. Invalid URLs are
/// rejected; a missing file is not an error.
pub async fn delete_previous(upload_dir: &str, public_url: &str) -> AppResult<()> {
    let path = resolve_public_url(upload_dir, public_url)?;
    match tokio::fs::remove_file(&path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => {
            warn!("Failed to delete previous upload {}: {e}", path.display());
            Ok(())
        }
    }
}
