use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

pub const MAX_UPLOAD_BYTES: usize = 5_000_000;
pub const MAX_WIDTH: u32 = 800;
pub const JPEG_QUALITY: u8 = 80;

const ALLOWED_TYPES: [&str; 3] = ["jpeg", "jpg", "png"];

/// Type filter for incoming uploads. Both the file extension and the
/// declared mime type must be on the allow-list, case-insensitively;
/// a `.jpg` with a `text/plain` content type is rejected.
pub fn is_accepted_type(extension: &str, mime_type: &str) -> bool {
    let ext = extension.to_ascii_lowercase();
    let mime = mime_type.to_ascii_lowercase();
    ALLOWED_TYPES.contains(&ext.as_str())
        && matches!(mime.strip_prefix("image/"), Some(m) if ALLOWED_TYPES.contains(&m))
}

/// Name a payload is stored under: millisecond timestamp plus the
/// sanitized client filename. Collisions within the same millisecond for
/// the same name are possible but accepted.
pub fn choose_storage_name(original: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}-{}",
        now.timestamp_millis(),
        sanitize_filename::sanitize(original)
    )
}

/// What the persistence step should record after the compression attempt.
#[derive(Debug)]
pub enum CompressionOutcome {
    /// Re-encoded file is canonical; the original has been removed
    /// (or at least we tried).
    Compressed {
        filename: String,
        path: PathBuf,
        size_bytes: i64,
    },
    /// Compression failed; the untouched original stays canonical.
    Fallback {
        filename: String,
        path: PathBuf,
        size_bytes: i64,
    },
}

impl CompressionOutcome {
    pub fn into_parts(self) -> (String, PathBuf, i64) {
        match self {
            CompressionOutcome::Compressed {
                filename,
                path,
                size_bytes,
            }
            | CompressionOutcome::Fallback {
                filename,
                path,
                size_bytes,
            } => (filename, path, size_bytes),
        }
    }
}

/// Re-encodes the stored file as a JPEG, capped at MAX_WIDTH and written
/// next to it as `compressed-<name>`. Compression is an optimization: any
/// decode or encode failure leaves the original file in place and reports
/// it as the canonical artifact instead of failing the upload.
pub fn compress_image(uploads_dir: &Path, stored_name: &str, original_size: i64) -> CompressionOutcome {
    let stored_path = uploads_dir.join(stored_name);
    match try_compress(uploads_dir, &stored_path, stored_name) {
        Ok(outcome) => outcome,
        Err(e) => {
            log::warn!("compression failed for {}, keeping original: {}", stored_name, e);
            CompressionOutcome::Fallback {
                filename: stored_name.to_string(),
                path: stored_path,
                size_bytes: original_size,
            }
        }
    }
}

fn try_compress(
    uploads_dir: &Path,
    stored_path: &Path,
    stored_name: &str,
) -> Result<CompressionOutcome, image::ImageError> {
    let img = image::open(stored_path)?;
    let img = if img.width() > MAX_WIDTH {
        img.resize(MAX_WIDTH, u32::MAX, FilterType::Lanczos3)
    } else {
        img
    };

    let mut jpeg_data = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut jpeg_data, JPEG_QUALITY);
    // JPEG has no alpha channel, so flatten first
    img.to_rgb8().write_with_encoder(encoder)?;
    let jpeg_bytes = jpeg_data.into_inner();

    let compressed_name = format!("compressed-{}", stored_name);
    let compressed_path = uploads_dir.join(&compressed_name);
    std::fs::write(&compressed_path, &jpeg_bytes)?;

    // The compressed file is authoritative from here on; losing the
    // original only wastes disk space, so a failed delete is not fatal.
    if let Err(e) = std::fs::remove_file(stored_path) {
        log::warn!("failed to delete original {} after compression: {}", stored_name, e);
    }

    Ok(CompressionOutcome::Compressed {
        filename: compressed_name,
        size_bytes: jpeg_bytes.len() as i64,
        path: compressed_path,
    })
}
