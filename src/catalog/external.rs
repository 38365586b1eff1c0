//! Externally hosted videos: the static sample feed and helpers deriving
//! thumbnails and embed links from a watch URL.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

use super::entry::{VideoEntry, VideoSource};

pub const EXTERNAL_CATEGORY: &str = "YouTube";
pub const EXTERNAL_ID_PREFIX: &str = "yt";
const EXTERNAL_DESCRIPTION: &str = "Educational video";
const MAX_SAMPLE_VIEWS: u64 = 5000;

static VIDEO_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("Invalid video identifier regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalVideo {
    pub url: String,
    pub title: String,
}

impl ExternalVideo {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }
}

/// Fixed list of externally hosted videos shown ahead of persisted uploads.
#[derive(Debug, Clone)]
pub struct ExternalFeed {
    prefix: String,
    videos: Vec<ExternalVideo>,
}

impl ExternalFeed {
    pub fn new(prefix: impl Into<String>, videos: Vec<ExternalVideo>) -> Self {
        Self {
            prefix: prefix.into(),
            videos,
        }
    }

    pub fn sample() -> Self {
        Self::new(
            EXTERNAL_ID_PREFIX,
            vec![
                ExternalVideo::new(
                    "https://www.youtube.com/watch?v=_snimIOTp9o",
                    "Introduction to Cardiology",
                ),
                ExternalVideo::new(
                    "https://www.youtube.com/watch?v=tD5QlyV-CvQ",
                    "Emergency Medicine Basics",
                ),
                ExternalVideo::new(
                    "https://www.youtube.com/watch?v=d2mlWUzA0B4",
                    "Soft Skills for Doctors",
                ),
                ExternalVideo::new(
                    "https://www.youtube.com/watch?v=w9zISG3BFBs",
                    "Medical Ethics Overview",
                ),
            ],
        )
    }

    /// Entries in feed order, ids `<prefix>-<index>`. View counts are display
    /// values only and differ between calls.
    pub fn materialize(&self) -> Vec<VideoEntry> {
        let mut rng = rand::thread_rng();
        self.videos
            .iter()
            .enumerate()
            .map(|(index, video)| {
                external_entry(
                    format!("{}-{}", self.prefix, index),
                    video.title.clone(),
                    Some(EXTERNAL_DESCRIPTION.to_string()),
                    &video.url,
                    rng.gen_range(0..MAX_SAMPLE_VIEWS),
                )
            })
            .collect()
    }
}

pub fn external_entry(
    id: String,
    title: String,
    description: Option<String>,
    url: &str,
    views: u64,
) -> VideoEntry {
    let thumbnail = thumbnail_url(url);
    VideoEntry {
        id,
        title,
        description,
        category: EXTERNAL_CATEGORY.to_string(),
        views,
        source: VideoSource::External {
            external_reference: url.to_string(),
            embed_url: embed_url(url),
        },
        thumbnail: (!thumbnail.is_empty()).then_some(thumbnail),
    }
}

/// The 11-character video identifier of a watch, share or embed URL.
pub fn video_identifier(url: &str) -> Option<&str> {
    VIDEO_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Empty when the URL carries no recognisable identifier.
pub fn thumbnail_url(url: &str) -> String {
    video_identifier(url)
        .map(|id| format!("https://img.youtube.com/vi/{}/hqdefault.jpg", id))
        .unwrap_or_default()
}

/// Falls back to the URL itself when no identifier is found.
pub fn embed_url(url: &str) -> String {
    video_identifier(url)
        .map(|id| format!("https://www.youtube.com/embed/{}", id))
        .unwrap_or_else(|| url.to_string())
}
