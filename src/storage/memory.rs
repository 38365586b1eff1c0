//! In-memory stand-ins for the backing services, recording every call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Duration, TimeZone, Utc};

use super::{Actor, IdentityProvider, MetadataStore, NewVideoRow, ObjectStore, VideoRow};

pub const BASE_URL: &str = "https://example.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Upload { bucket: String, path: String },
    Remove { bucket: String, paths: Vec<String> },
    Insert { title: String, video_url: String },
    SelectAll,
    DeleteById(String),
}

impl StoreCall {
    pub fn is_write(&self) -> bool {
        !matches!(self, StoreCall::SelectAll)
    }
}

/// Object store and metadata store sharing one call journal.
#[derive(Default)]
pub struct MemoryBackend {
    pub objects: Mutex<HashMap<(String, String), Bytes>>,
    pub rows: Mutex<Vec<VideoRow>>,
    pub calls: Mutex<Vec<StoreCall>>,
    pub fail_upload: AtomicBool,
    pub fail_remove: AtomicBool,
    pub fail_insert: AtomicBool,
    pub fail_select: AtomicBool,
    pub fail_delete: AtomicBool,
    next_id: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a persisted row, newest last.
    pub fn seed_row(&self, id: &str, title: &str, category: Option<&str>, video_url: &str) {
        let mut rows = self.rows.lock().unwrap();
        let created_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::minutes(rows.len() as i64);
        rows.push(VideoRow {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            category: category.map(str::to_string),
            views: None,
            video_url: video_url.to_string(),
            thumbnail_url: None,
            uploaded_by: Some("seed".to_string()),
            created_at,
            updated_at: created_at,
        });
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<StoreCall> {
        self.calls().into_iter().filter(StoreCall::is_write).collect()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ObjectStore for MemoryBackend {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        _content_type: &str,
    ) -> anyhow::Result<()> {
        self.record(StoreCall::Upload {
            bucket: bucket.to_string(),
            path: path.to_string(),
        });
        if self.fail_upload.load(Ordering::SeqCst) {
            anyhow::bail!("upload rejected");
        }
        let mut objects = self.objects.lock().unwrap();
        let key = (bucket.to_string(), path.to_string());
        if objects.contains_key(&key) {
            anyhow::bail!("object {} already exists", path);
        }
        objects.insert(key, data);
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", BASE_URL, bucket, path)
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> anyhow::Result<()> {
        self.record(StoreCall::Remove {
            bucket: bucket.to_string(),
            paths: paths.to_vec(),
        });
        if self.fail_remove.load(Ordering::SeqCst) {
            anyhow::bail!("remove rejected");
        }
        let mut objects = self.objects.lock().unwrap();
        for path in paths {
            objects.remove(&(bucket.to_string(), path.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for MemoryBackend {
    async fn insert(&self, row: NewVideoRow) -> anyhow::Result<VideoRow> {
        self.record(StoreCall::Insert {
            title: row.title.clone(),
            video_url: row.video_url.clone(),
        });
        if self.fail_insert.load(Ordering::SeqCst) {
            anyhow::bail!("insert rejected");
        }
        let id = format!("row-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let now = Utc::now();
        let inserted = VideoRow {
            id,
            title: row.title,
            description: row.description,
            category: Some(row.category),
            views: Some(row.views),
            video_url: row.video_url,
            thumbnail_url: None,
            uploaded_by: Some(row.uploaded_by),
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(inserted.clone());
        Ok(inserted)
    }

    async fn select_all(&self) -> anyhow::Result<Vec<VideoRow>> {
        self.record(StoreCall::SelectAll);
        if self.fail_select.load(Ordering::SeqCst) {
            anyhow::bail!("select rejected");
        }
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn delete_by_id(&self, id: &str) -> anyhow::Result<()> {
        self.record(StoreCall::DeleteById(id.to_string()));
        if self.fail_delete.load(Ordering::SeqCst) {
            anyhow::bail!("delete rejected");
        }
        self.rows.lock().unwrap().retain(|row| row.id != id);
        Ok(())
    }
}

pub struct StaticIdentity(pub Option<Actor>);

impl StaticIdentity {
    pub fn doctor(id: &str) -> Self {
        StaticIdentity(Some(Actor {
            id: id.to_string(),
            role: super::identity::DOCTOR_ROLE.to_string(),
        }))
    }

    pub fn anonymous() -> Self {
        StaticIdentity(None)
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_actor(&self) -> anyhow::Result<Option<Actor>> {
        Ok(self.0.clone())
    }
}
