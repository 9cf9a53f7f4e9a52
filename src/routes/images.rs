use crate::{config::Config, db::Db, errors::ApiError, upload};
use crate::models::image::{ImageMeta, NewImage};
use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use futures_util::TryStreamExt as _;
use std::path::Path;

/// POST /api/upload
///
/// Runs the whole pipeline: pull the file out of the multipart form,
/// validate, store, compress, persist. Nothing touches disk until
/// validation has passed.
pub async fn upload_image(
    cfg: web::Data<Config>,
    db: web::Data<Db>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    // first field that carries a filename is the upload
    let mut file: Option<(String, String, Vec<u8>)> = None;
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|_| ApiError::BadRequest("No file uploaded".into()))?
    {
        let Some(original) = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|s| s.to_string()))
        else {
            continue;
        };
        let mime = field
            .content_type()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();

        let mut data: Vec<u8> = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|_| ApiError::BadRequest("No file uploaded".into()))?
        {
            data.extend_from_slice(&chunk);
            if data.len() > upload::MAX_UPLOAD_BYTES {
                return Err(ApiError::BadRequest("File too large".into()));
            }
        }
        file = Some((original, mime, data));
        break;
    }
    let Some((original, mime, data)) = file else {
        return Err(ApiError::BadRequest("No file uploaded".into()));
    };

    let original = sanitize_filename::sanitize(&original);
    let extension = Path::new(&original)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    if !upload::is_accepted_type(extension, &mime) {
        return Err(ApiError::BadRequest(
            "Only image files (jpg, jpeg, png) are allowed!".into(),
        ));
    }

    let stored_name = upload::choose_storage_name(&original, chrono::Utc::now());
    let uploads_dir = Path::new(&cfg.uploads_dir);
    std::fs::write(uploads_dir.join(&stored_name), &data).map_err(|e| {
        log::error!("failed to store upload {}: {}", stored_name, e);
        ApiError::Internal("Server error while uploading image".into())
    })?;

    let outcome = upload::compress_image(uploads_dir, &stored_name, data.len() as i64);
    let (filename, path, size_bytes) = outcome.into_parts();

    let meta = ImageMeta::create(
        &db,
        NewImage {
            filename,
            original_filename: original,
            mime_type: mime,
            storage_path: path.to_string_lossy().into_owned(),
            size_bytes,
        },
    )
    .await
    .map_err(|e| {
        log::error!("db error inserting image record: {}", e);
        ApiError::Internal("Server error while uploading image".into())
    })?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "image": {
            "id": meta.id,
            "filename": meta.filename,
            "originalFilename": meta.original_filename,
            "url": meta.url(),
            "uploadedAt": meta.uploaded_at,
        }
    })))
}

/// GET /api/images/{id}
pub async fn get_image(
    db: web::Data<Db>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let meta = ImageMeta::find(&db, &id).await.map_err(|e| {
        log::error!("db error fetching image {}: {}", id, e);
        ApiError::Internal("Server error while getting image".into())
    })?;
    let meta = meta.ok_or(ApiError::NotFound)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "image": {
            "id": meta.id,
            "filename": meta.filename,
            "originalFilename": meta.original_filename,
            "url": meta.url(),
            "uploadedAt": meta.uploaded_at,
            "sizeBytes": meta.size_bytes,
        }
    })))
}

/// DELETE /api/images/{id}
///
/// Removes the stored binary first, then the record. A binary that is
/// already gone is tolerated; a binary we cannot remove keeps its record,
/// so the file never becomes unreachable through the API.
pub async fn delete_image(
    db: web::Data<Db>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let meta = ImageMeta::find(&db, &id).await.map_err(|e| {
        log::error!("db error fetching image {}: {}", id, e);
        ApiError::Internal("Server error while deleting image".into())
    })?;
    let meta = meta.ok_or(ApiError::NotFound)?;

    match std::fs::remove_file(&meta.storage_path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("image file {} already missing", meta.storage_path);
        }
        Err(e) => {
            log::error!("failed to delete image file {}: {}", meta.storage_path, e);
            return Err(ApiError::Internal("Server error while deleting image".into()));
        }
    }

    let removed = ImageMeta::delete(&db, &id).await.map_err(|e| {
        log::error!("db error deleting image {}: {}", id, e);
        ApiError::Internal("Server error while deleting image".into())
    })?;
    if !removed {
        return Err(ApiError::NotFound);
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Image deleted successfully"
    })))
}
