use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use sqlx::FromRow;

use crate::db::Db;

/// One stored image. Rows are created by the upload pipeline and removed by
/// delete-by-id; there is no update path.
#[derive(Serialize, Deserialize, Debug, Clone, FromRow)]
pub struct ImageMeta {
    pub id: String,
    pub filename: String,
    pub original_filename: String,
    pub mime_type: String,
    pub storage_path: String,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
}

/// Fields the pipeline supplies at creation time; id and uploaded_at are
/// assigned on insert.
pub struct NewImage {
    pub filename: String,
    pub original_filename: String,
    pub mime_type: String,
    pub storage_path: String,
    pub size_bytes: i64,
}

impl ImageMeta {
    pub async fn create(db: &Db, new: NewImage) -> sqlx::Result<ImageMeta> {
        let meta = ImageMeta {
            id: uuid::Uuid::new_v4().to_string(),
            filename: new.filename,
            original_filename: new.original_filename,
            mime_type: new.mime_type,
            storage_path: new.storage_path,
            size_bytes: new.size_bytes,
            uploaded_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO images (id, filename, original_filename, mime_type, storage_path, size_bytes, uploaded_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&meta.id)
        .bind(&meta.filename)
        .bind(&meta.original_filename)
        .bind(&meta.mime_type)
        .bind(&meta.storage_path)
        .bind(meta.size_bytes)
        .bind(meta.uploaded_at)
        .execute(&db.0)
        .await?;
        Ok(meta)
    }

    pub async fn find(db: &Db, id: &str) -> sqlx::Result<Option<ImageMeta>> {
        sqlx::query_as::<_, ImageMeta>(
            "SELECT id, filename, original_filename, mime_type, storage_path, size_bytes, uploaded_at \
             FROM images WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&db.0)
        .await
    }

    /// Returns false when no row matched, so the caller can report not-found
    /// instead of silently succeeding.
    pub async fn delete(db: &Db, id: &str) -> sqlx::Result<bool> {
        let res = sqlx::query("DELETE FROM images WHERE id = ?")
            .bind(id)
            .execute(&db.0)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    pub fn url(&self) -> String {
        format!("/uploads/{}", urlencoding::encode(&self.filename))
    }
}
