use serde::{Deserialize, Serialize};

use crate::storage::VideoRow;

/// Category applied to entries that carry none.
pub const DEFAULT_CATEGORY: &str = "General";

/// Where an entry is played from. Exactly one reference per entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum VideoSource {
    External {
        #[serde(rename = "externalReference")]
        external_reference: String,
        #[serde(rename = "embedUrl")]
        embed_url: String,
    },
    Object {
        #[serde(rename = "objectReference")]
        object_reference: String,
    },
}

/// One catalog item, externally hosted or persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEntry {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub views: u64,
    #[serde(flatten)]
    pub source: VideoSource,
    pub thumbnail: Option<String>,
}

impl VideoEntry {
    /// Projects a persisted row. Rows without a video URL are not playable
    /// and yield `None`.
    pub fn from_row(row: VideoRow) -> Option<Self> {
        if row.video_url.trim().is_empty() {
            tracing::warn!(id = %row.id, "Skipping learning video row without video_url");
            return None;
        }

        Some(VideoEntry {
            id: row.id,
            title: row.title,
            description: row.description,
            category: row
                .category
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            views: row.views.unwrap_or(0).max(0) as u64,
            source: VideoSource::Object {
                object_reference: row.video_url,
            },
            thumbnail: row.thumbnail_url.filter(|t| !t.is_empty()),
        })
    }

    pub fn object_reference(&self) -> Option<&str> {
        match &self.source {
            VideoSource::Object { object_reference } => Some(object_reference),
            VideoSource::External { .. } => None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.object_reference().is_some()
    }
}
