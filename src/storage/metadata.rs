use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use super::{MetadataStore, NewVideoRow, VideoRow};

const RETURNING_COLUMNS: &str = "id::text AS id, title, description, category, views, video_url, \
     thumbnail_url, uploaded_by, created_at, updated_at";

/// `learning_videos` repository backed by Postgres.
#[derive(Clone, Debug)]
pub struct PgVideoRepository {
    db: PgPool,
}

impl PgVideoRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MetadataStore for PgVideoRepository {
    #[tracing::instrument(name = "Insert learning video", skip(self, row), fields(title = %row.title))]
    async fn insert(&self, row: NewVideoRow) -> anyhow::Result<VideoRow> {
        let query = format!(
            "INSERT INTO learning_videos (title, description, category, video_url, uploaded_by, views) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            RETURNING_COLUMNS
        );

        sqlx::query_as::<_, VideoRow>(&query)
            .bind(&row.title)
            .bind(&row.description)
            .bind(&row.category)
            .bind(&row.video_url)
            .bind(&row.uploaded_by)
            .bind(row.views)
            .fetch_one(&self.db)
            .await
            .context("Failed to insert learning video")
    }

    #[tracing::instrument(name = "Select all learning videos", skip(self))]
    async fn select_all(&self) -> anyhow::Result<Vec<VideoRow>> {
        let query = format!(
            "SELECT {} FROM learning_videos ORDER BY created_at DESC",
            RETURNING_COLUMNS
        );

        let rows = sqlx::query_as::<_, VideoRow>(&query)
            .fetch_all(&self.db)
            .await
            .context("Failed to fetch learning videos")?;

        tracing::debug!("Fetched {} learning video rows", rows.len());
        Ok(rows)
    }

    #[tracing::instrument(name = "Delete learning video", skip(self))]
    async fn delete_by_id(&self, id: &str) -> anyhow::Result<()> {
        let result = sqlx::query("DELETE FROM learning_videos WHERE id::text = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("Failed to delete learning video")?;

        if result.rows_affected() == 0 {
            tracing::warn!("No learning video row matched id {}", id);
        }
        Ok(())
    }
}
