use std::collections::HashSet;
use std::path::Path;

use bytes::Bytes;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::{Document, DocumentStatus, User};
use crate::services::quota;

/// Document metadata plus the files behind it. Files are written before
/// their row exists, so a crash can leave an orphan on disk but never a row
/// pointing at a missing file.
#[derive(Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
    storage_dir: String,
}

impl DocumentStore {
    pub fn new(pool: SqlitePool, storage_dir: String) -> Self {
        Self { pool, storage_dir }
    }

    /// Accepts an upload for the user: write the bytes under a fresh name,
    /// then reserve a quota slot and record the metadata in one transaction.
    /// Returns the new document plus the user's free-slot counter after the
    /// reserve.
    pub async fn store(
        &self,
        user: &User,
        original_filename: &str,
        data: Bytes,
    ) -> AppResult<(Document, i64)> {
        // Advisory check so an over-quota request fails before any disk IO.
        quota::check(user)?;

        let stored_filename = generate_stored_filename(original_filename);
        let stored_path = format!("{}/{}", self.storage_dir, stored_filename);

        tokio::fs::create_dir_all(&self.storage_dir).await?;
        tokio::fs::write(&stored_path, &data).await.map_err(|e| {
            tracing::error!("Failed to write {}: {}", stored_path, e);
            AppError::File(e)
        })?;

        match self
            .record(user, original_filename, &stored_filename, &stored_path)
            .await
        {
            Ok((document, free_docs_used)) => {
                tracing::info!(
                    "Stored document {} for user {} ({} bytes)",
                    document.id,
                    user.id,
                    data.len()
                );
                Ok((document, free_docs_used))
            }
            Err(e) => {
                // The row never landed, so the file must not stay either.
                if let Err(cleanup) = tokio::fs::remove_file(&stored_path).await {
                    tracing::warn!("Failed to remove {} after rollback: {}", stored_path, cleanup);
                }
                Err(e)
            }
        }
    }

    // Quota reserve and metadata insert commit together, so two concurrent
    // uploads cannot both take the last free slot. The conditional UPDATE is
    // the first statement on purpose: it takes the write lock up front.
    async fn record(
        &self,
        user: &User,
        original_filename: &str,
        stored_filename: &str,
        stored_path: &str,
    ) -> AppResult<(Document, i64)> {
        let mut tx = self.pool.begin().await?;

        let free_docs_used = if user.is_paid {
            user.free_docs_used
        } else {
            let reserved: Option<i64> = sqlx::query_scalar(
                "UPDATE users SET free_docs_used = free_docs_used + 1 \
                 WHERE id = ?1 AND is_paid = 0 AND free_docs_used < ?2 \
                 RETURNING free_docs_used",
            )
            .bind(user.id)
            .bind(quota::FREE_DOC_LIMIT)
            .fetch_optional(&mut *tx)
            .await?;

            match reserved {
                Some(count) => count,
                None => {
                    // Either a concurrent upload took the last slot, or an
                    // admin flipped the account to paid mid-request.
                    let (is_paid, used): (bool, i64) =
                        sqlx::query_as("SELECT is_paid, free_docs_used FROM users WHERE id = ?1")
                            .bind(user.id)
                            .fetch_one(&mut *tx)
                            .await?;
                    if !is_paid {
                        return Err(AppError::QuotaExceeded);
                    }
                    used
                }
            }
        };

        let document = sqlx::query_as::<_, Document>(
            "INSERT INTO documents \
             (user_id, original_filename, stored_filename, stored_path, status, review_notes, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6) RETURNING *",
        )
        .bind(user.id)
        .bind(original_filename)
        .bind(stored_filename)
        .bind(stored_path)
        .bind(DocumentStatus::Uploaded)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((document, free_docs_used))
    }

    /// The user's documents, newest first.
    pub async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE user_id = ?1 ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(documents)
    }

    /// Fetches one document, scoped to its owner. A document that exists but
    /// belongs to someone else is indistinguishable from one that does not
    /// exist.
    pub async fn get_for_user(&self, user_id: i64, document_id: i64) -> AppResult<Document> {
        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = ?1 AND user_id = ?2")
            .bind(document_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Document"))
    }

    /// Admin-side status update. Review notes are only overwritten when a
    /// new value is supplied.
    pub async fn set_status(
        &self,
        document_id: i64,
        status: DocumentStatus,
        review_notes: Option<&str>,
    ) -> AppResult<Document> {
        let document = sqlx::query_as::<_, Document>(
            "UPDATE documents SET status = ?1, review_notes = COALESCE(?2, review_notes) \
             WHERE id = ?3 RETURNING *",
        )
        .bind(status)
        .bind(review_notes)
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Document"))?;

        tracing::info!("Set status={} for document {}", document.status, document.id);
        Ok(document)
    }

    /// Deletes files in the storage directory that no document row points
    /// at. Run at startup to mop up after crashes between write and record.
    pub async fn sweep_orphan_files(&self) -> AppResult<usize> {
        let referenced: HashSet<String> =
            sqlx::query_scalar::<_, String>("SELECT stored_filename FROM documents")
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .collect();

        let mut entries = match tokio::fs::read_dir(&self.storage_dir).await {
            Ok(entries) => entries,
            // Nothing has been uploaded yet.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(AppError::File(e)),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if referenced.contains(&name) {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => {
                    tracing::warn!("Removed orphaned upload {}", name);
                    removed += 1;
                }
                Err(e) => tracing::error!("Failed to remove orphaned upload {}: {}", name, e),
            }
        }
        Ok(removed)
    }
}

/// Collision-resistant name for the bytes on disk: random hex with the
/// original extension preserved. The client-supplied name itself never
/// touches the filesystem.
pub fn generate_stored_filename(original: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    match Path::new(original).extension().and_then(|ext| ext.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{}.{}", id, ext),
        _ => id,
    }
}
