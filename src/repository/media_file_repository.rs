use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::{
    domain::{MediaFile, MediaOwner},
    error::{AppError, Result},
    repository::MediaFileRepository,
};

pub struct SqliteMediaFileRepository {
    pool: SqlitePool,
}

impl SqliteMediaFileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

pub(crate) async fn media_files_for(pool: &SqlitePool, owner: MediaOwner) -> Result<Vec<MediaFile>> {
    let (column, id) = match owner {
        MediaOwner::Notice(id) => ("notice_id", id),
        MediaOwner::Event(id) => ("event_id", id),
    };
    let sql = format!(
        "SELECT id, filename, notice_id, event_id FROM media_files WHERE {} = ? ORDER BY id ASC",
        column
    );

    let files = sqlx::query_as::<_, MediaFile>(&sql)
        .bind(id)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(files)
}

#[async_trait]
impl MediaFileRepository for SqliteMediaFileRepository {
    async fn create(&self, filename: &str, owner: MediaOwner) -> Result<MediaFile> {
        let (notice_id, event_id) = match owner {
            MediaOwner::Notice(id) => (Some(id), None),
            MediaOwner::Event(id) => (None, Some(id)),
        };

        let id = sqlx::query(
            "INSERT INTO media_files (filename, notice_id, event_id) VALUES (?, ?, ?)"
        )
        .bind(filename)
        .bind(notice_id)
        .bind(event_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .last_insert_rowid();

        Ok(MediaFile {
            id,
            filename: filename.to_string(),
            notice_id,
            event_id,
        })
    }

    async fn list_for(&self, owner: MediaOwner) -> Result<Vec<MediaFile>> {
        media_files_for(&self.pool, owner).await
    }
}
