use percent_encoding::percent_decode_str;

use super::service::CatalogService;
use crate::errors::AppError;
use crate::storage::object_store::PUBLIC_OBJECT_PREFIX;

impl CatalogService {
    /// Removes the metadata row, then the object behind `object_url`.
    ///
    /// The row goes first: if that fails nothing else is attempted. If the
    /// object removal fails afterwards the error is still returned, and the
    /// object is left orphaned.
    #[tracing::instrument(name = "Delete video", skip(self))]
    pub async fn delete_video(&self, id: &str, object_url: &str) -> Result<(), AppError> {
        self.metadata.delete_by_id(id).await.map_err(|e| {
            tracing::error!(error = ?e, "Metadata store rejected delete");
            AppError::PersistFailed(e)
        })?;

        let path = match object_path_from_url(object_url, &self.bucket) {
            Some(path) => path,
            None => {
                metrics::counter!("learning_videos_orphaned_objects_total").increment(1);
                tracing::warn!(
                    bucket = %self.bucket,
                    "Row deleted but object URL does not point into the bucket"
                );
                return Err(AppError::InvalidObjectReference(object_url.to_string()));
            }
        };

        if let Err(e) = self.objects.remove(&self.bucket, &[path.clone()]).await {
            metrics::counter!("learning_videos_orphaned_objects_total").increment(1);
            tracing::warn!(
                bucket = %self.bucket,
                path = %path,
                error = ?e,
                "Row deleted but object removal failed, object is orphaned"
            );
            return Err(AppError::ObjectRemovalFailed(e));
        }

        metrics::counter!("learning_videos_deleted_total").increment(1);
        tracing::info!(path = %path, "Video deleted");
        Ok(())
    }
}

/// The storage path of a public object URL: everything after
/// `/storage/v1/object/public/<bucket>/`, percent-decoded so it names the
/// object as it was stored. Query and fragment are ignored.
pub fn object_path_from_url(object_url: &str, bucket: &str) -> Option<String> {
    let parsed = url::Url::parse(object_url).ok()?;
    let marker = format!("{}{}/", PUBLIC_OBJECT_PREFIX, bucket);
    let path = parsed.path();
    let start = path.find(&marker)? + marker.len();
    let object_path = percent_decode_str(&path[start..]).decode_utf8().ok()?;
    (!object_path.is_empty()).then(|| object_path.into_owned())
}
