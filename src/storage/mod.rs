//! Contracts for the backing services the catalog talks to.
//!
//! The catalog only ever sees these traits. Production adapters live beside
//! them: a storage REST client for binaries, a Postgres repository for
//! metadata rows, and a token-backed identity provider.

pub mod identity;
#[cfg(test)]
pub mod memory;
pub mod metadata;
pub mod object_store;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub use identity::{Actor, SessionIdentity};
pub use metadata::PgVideoRepository;
pub use object_store::StorageClient;

/// A row of the `learning_videos` table.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct VideoRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub views: Option<i32>,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub uploaded_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column values for a row about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVideoRow {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub video_url: String,
    pub uploaded_by: String,
    pub views: i32,
}

/// Durable binary storage keyed by `<folder>/<file>` paths.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> anyhow::Result<()>;

    /// Publicly resolvable URL of an object. Does not check existence.
    fn public_url(&self, bucket: &str, path: &str) -> String;

    async fn remove(&self, bucket: &str, paths: &[String]) -> anyhow::Result<()>;
}

/// Relational metadata for persisted videos.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn insert(&self, row: NewVideoRow) -> anyhow::Result<VideoRow>;

    /// All rows, newest first.
    async fn select_all(&self) -> anyhow::Result<Vec<VideoRow>>;

    /// Deleting an id that does not exist is not an error.
    async fn delete_by_id(&self, id: &str) -> anyhow::Result<()>;
}

/// Resolves who is performing the current operation.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_actor(&self) -> anyhow::Result<Option<Actor>>;
}
