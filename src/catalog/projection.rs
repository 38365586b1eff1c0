use chrono::Utc;

use super::entry::VideoEntry;
use super::external::{external_entry, EXTERNAL_ID_PREFIX};
use super::filter;
use super::service::CatalogLoad;

/// In-memory merged view of the catalog.
///
/// Rebuilt wholesale by [`CatalogProjection::replace`]; the other mutations
/// are applied only after the backing stores confirmed the change, except
/// [`CatalogProjection::append_external`] which never touches them.
#[derive(Debug, Clone, Default)]
pub struct CatalogProjection {
    entries: Vec<VideoEntry>,
    loaded: bool,
    degraded: bool,
}

impl CatalogProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn entries(&self) -> &[VideoEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&VideoEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn replace(&mut self, load: CatalogLoad) {
        self.entries = load.entries;
        self.degraded = load.degraded;
        self.loaded = true;
    }

    pub fn prepend(&mut self, entry: VideoEntry) {
        self.entries.insert(0, entry);
    }

    /// Adds an externally hosted video to this view only. It is gone after
    /// the next `replace`.
    pub fn append_external(
        &mut self,
        title: String,
        description: Option<String>,
        url: &str,
    ) -> VideoEntry {
        let mut id = format!("{}-{}", EXTERNAL_ID_PREFIX, Utc::now().timestamp_millis());
        while self.get(&id).is_some() {
            id.push('_');
        }
        let entry = external_entry(id, title, description, url, 0);
        self.entries.push(entry.clone());
        entry
    }

    pub fn remove(&mut self, id: &str) -> Option<VideoEntry> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn filtered(&self, search: &str, category: &str) -> Vec<VideoEntry> {
        filter::filter(&self.entries, search, category)
    }

    pub fn categories(&self) -> Vec<String> {
        filter::categories(&self.entries)
    }
}
