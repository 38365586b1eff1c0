use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::storage::ObjectStore;

/// What to do with an object left behind when its metadata row could not be
/// written.
#[async_trait]
pub trait OrphanPolicy: Send + Sync {
    async fn on_orphaned_object(&self, store: &dyn ObjectStore, bucket: &str, path: &str);
}

/// Leaves the object in place for an operator to reconcile.
#[derive(Debug, Default, Clone, Copy)]
pub struct LeaveOrphan;

#[async_trait]
impl OrphanPolicy for LeaveOrphan {
    async fn on_orphaned_object(&self, _store: &dyn ObjectStore, bucket: &str, path: &str) {
        metrics::counter!("learning_videos_orphaned_objects_total").increment(1);
        tracing::warn!(bucket, path, "Leaving orphaned object in storage");
    }
}

/// Makes a single attempt to remove the object. Failure is only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct RemoveOrphan;

#[async_trait]
impl OrphanPolicy for RemoveOrphan {
    async fn on_orphaned_object(&self, store: &dyn ObjectStore, bucket: &str, path: &str) {
        match store.remove(bucket, &[path.to_string()]).await {
            Ok(()) => tracing::info!(bucket, path, "Removed orphaned object"),
            Err(e) => {
                metrics::counter!("learning_videos_orphaned_objects_total").increment(1);
                tracing::warn!(bucket, path, error = ?e, "Failed to remove orphaned object");
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanPolicyKind {
    Leave,
    Remove,
}

impl OrphanPolicyKind {
    pub fn into_policy(self) -> Arc<dyn OrphanPolicy> {
        match self {
            OrphanPolicyKind::Leave => Arc::new(LeaveOrphan),
            OrphanPolicyKind::Remove => Arc::new(RemoveOrphan),
        }
    }
}

impl FromStr for OrphanPolicyKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "leave" => Ok(OrphanPolicyKind::Leave),
            "remove" => Ok(OrphanPolicyKind::Remove),
            other => Err(AppError::Configuration(format!(
                "Unknown ORPHAN_POLICY '{}', expected 'leave' or 'remove'",
                other
            ))),
        }
    }
}
