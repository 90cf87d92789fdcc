//! Photo entries as self-contained data URIs

use crate::consts::MAX_PHOTO_BYTES;
use crate::error::{ErrorCategory, ErrorKind, KeepsakeError, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::fs;
use std::path::{Path, PathBuf};

/// Encode image bytes as a `data:` URI.
pub fn data_uri(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, STANDARD.encode(bytes))
}

/// Media type for a supported image file, judged by extension.
pub fn media_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Image files directly inside `dir`, sorted by file name.
pub fn image_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| io_error(dir, "failed to list", e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| io_error(dir, "failed to list", e))?.path();
        if path.is_file() && media_type_for(&path).is_some() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load every image in `dir` as a data URI.
///
/// The running total is checked after each file so a directory of huge
/// photos fails before all of it is read into memory.
pub fn load_dir(dir: &Path) -> Result<Vec<String>> {
    let mut photos = Vec::new();
    let mut total = 0usize;

    for path in image_files(dir)? {
        // image_files only yields paths with a known media type
        let Some(media_type) = media_type_for(&path) else {
            continue;
        };
        let bytes = fs::read(&path).map_err(|e| io_error(&path, "failed to read", e))?;
        let uri = data_uri(media_type, &bytes);

        total += uri.len();
        if total > MAX_PHOTO_BYTES {
            return Err(KeepsakeError::with_kind(
                ErrorCategory::User,
                ErrorKind::PayloadTooLarge,
                format!(
                    "photos in {} exceed the {MAX_PHOTO_BYTES} byte limit; use fewer or smaller photos",
                    dir.display()
                ),
            ));
        }

        tracing::debug!(file = %path.display(), bytes = uri.len(), "loaded photo");
        photos.push(uri);
    }

    Ok(photos)
}

fn io_error(path: &Path, what: &str, err: std::io::Error) -> KeepsakeError {
    let category = if err.kind() == std::io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    KeepsakeError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("{what} {}", path.display()),
        err,
    )
}
