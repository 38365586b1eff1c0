use std::sync::Arc;

use super::entry::VideoEntry;
use super::external::ExternalFeed;
use super::orphan::{LeaveOrphan, OrphanPolicy};
use crate::storage::{MetadataStore, ObjectStore};

/// Result of a catalog load. `degraded` is set when persisted entries could
/// not be fetched and only the external feed is present.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogLoad {
    pub entries: Vec<VideoEntry>,
    pub degraded: bool,
}

/// Merges the external feed with persisted uploads and runs the upload and
/// delete pipelines against the backing stores.
pub struct CatalogService {
    pub(super) objects: Arc<dyn ObjectStore>,
    pub(super) metadata: Arc<dyn MetadataStore>,
    pub(super) feed: ExternalFeed,
    pub(super) bucket: String,
    pub(super) orphan_policy: Arc<dyn OrphanPolicy>,
}

impl CatalogService {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
        feed: ExternalFeed,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            objects,
            metadata,
            feed,
            bucket: bucket.into(),
            orphan_policy: Arc::new(LeaveOrphan),
        }
    }

    pub fn with_orphan_policy(mut self, policy: Arc<dyn OrphanPolicy>) -> Self {
        self.orphan_policy = policy;
        self
    }

    /// External entries first, then persisted entries newest first. A failing
    /// metadata store degrades the result to the external feed alone.
    #[tracing::instrument(name = "Load video catalog", skip(self))]
    pub async fn load_catalog(&self) -> CatalogLoad {
        let mut entries = self.feed.materialize();

        let degraded = match self.metadata.select_all().await {
            Ok(rows) => {
                let persisted: Vec<VideoEntry> =
                    rows.into_iter().filter_map(VideoEntry::from_row).collect();
                tracing::info!(
                    external = entries.len(),
                    persisted = persisted.len(),
                    "Loaded video catalog"
                );
                entries.extend(persisted);
                false
            }
            Err(e) => {
                metrics::counter!("learning_videos_load_degraded_total").increment(1);
                tracing::warn!(
                    error = ?e,
                    external = entries.len(),
                    "Metadata store unavailable, serving external feed only"
                );
                true
            }
        };

        CatalogLoad { entries, degraded }
    }
}
