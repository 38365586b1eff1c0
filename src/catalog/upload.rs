use bytes::Bytes;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;

use super::entry::VideoEntry;
use super::service::CatalogService;
use crate::errors::AppError;
use crate::storage::{IdentityProvider, NewVideoRow};

/// Category given to uploads that do not name one.
pub const UPLOAD_CATEGORY: &str = "Manual";
const DEFAULT_EXTENSION: &str = "bin";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const SUFFIX_TOKEN_LEN: usize = 10;

/// Binary payload of an upload with the name it was selected under.
#[derive(Debug, Clone)]
pub struct VideoFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub folder: String,
    pub file: VideoFile,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl CatalogService {
    /// Stores the binary, then records its metadata row attributed to the
    /// current actor. Steps run strictly in order and stop at the first
    /// failure.
    #[tracing::instrument(
        name = "Upload video",
        skip(self, identity, request),
        fields(folder = %request.folder, title = %request.title, size = request.file.bytes.len())
    )]
    pub async fn upload_video(
        &self,
        identity: &dyn IdentityProvider,
        request: UploadRequest,
    ) -> Result<VideoEntry, AppError> {
        let actor = match identity.current_actor().await {
            Ok(Some(actor)) => actor,
            Ok(None) => {
                tracing::warn!("Upload attempted without an authenticated actor");
                return Err(AppError::unauthenticated());
            }
            Err(e) => {
                tracing::warn!(error = ?e, "Identity provider failed to resolve actor");
                return Err(AppError::unauthenticated());
            }
        };

        let UploadRequest {
            folder,
            file,
            title,
            description,
            category,
        } = request;

        let path = storage_path(
            &folder,
            &file.file_name,
            Utc::now().timestamp_millis(),
            &random_token(),
        );
        let content_type = file
            .content_type
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        self.objects
            .upload(&self.bucket, &path, file.bytes, &content_type)
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, path = %path, "Object store rejected upload");
                AppError::UploadFailed(e)
            })?;

        let video_url = self.objects.public_url(&self.bucket, &path);

        let row = NewVideoRow {
            title,
            description: description.filter(|d| !d.is_empty()),
            category: category
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| UPLOAD_CATEGORY.to_string()),
            video_url,
            uploaded_by: actor.id,
            views: 0,
        };

        let inserted = match self.metadata.insert(row).await {
            Ok(inserted) => inserted,
            Err(e) => {
                tracing::error!(error = ?e, path = %path, "Metadata store rejected insert");
                self.orphan_policy
                    .on_orphaned_object(self.objects.as_ref(), &self.bucket, &path)
                    .await;
                return Err(AppError::PersistFailed(e));
            }
        };

        let id = inserted.id.clone();
        let entry = VideoEntry::from_row(inserted).ok_or_else(|| {
            AppError::PersistFailed(anyhow::anyhow!(
                "Inserted row {} came back without a video_url",
                id
            ))
        })?;

        metrics::counter!("learning_videos_uploaded_total").increment(1);
        tracing::info!(id = %entry.id, path = %path, "Video uploaded");
        Ok(entry)
    }
}

/// `<folder>/<millis>-<token>.<ext>`; the extension is taken from the original
/// file name.
pub fn storage_path(folder: &str, file_name: &str, millis: i64, token: &str) -> String {
    let folder = folder.trim_matches('/');
    let file = format!("{}-{}.{}", millis, token, extension_of(file_name));
    if folder.is_empty() {
        file
    } else {
        format!("{}/{}", folder, file)
    }
}

fn extension_of(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_TOKEN_LEN)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}
