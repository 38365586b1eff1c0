use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::common::middleware::forbid_non_doctor;
use crate::api::common::ApiResponse;
use crate::catalog::{UploadRequest, VideoEntry, VideoFile, ALL_CATEGORIES};
use crate::errors::AppError;
use crate::storage::SessionIdentity;
use crate::InnerState;

#[derive(Debug, Deserialize)]
pub struct ListVideosParams {
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    pub videos: Vec<VideoEntry>,
    pub categories: Vec<String>,
    pub degraded: bool,
}

#[derive(TryFromMultipart)]
pub struct UploadVideoForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[form_data(limit = "512MiB")]
    pub file: Option<FieldData<Bytes>>,
}

#[derive(Debug, Deserialize)]
pub struct AddExternalVideoRequest {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
}

/// Loads the projection on first use.
async fn ensure_loaded(inner: &InnerState) {
    if inner.projection.read().await.is_loaded() {
        return;
    }
    let load = inner.catalog.load_catalog().await;
    let mut projection = inner.projection.write().await;
    if !projection.is_loaded() {
        projection.replace(load);
    }
}

fn require_doctor(identity: &SessionIdentity) -> Result<(), AppError> {
    if identity.actor().is_none() {
        return Err(AppError::unauthenticated());
    }
    forbid_non_doctor(identity)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[tracing::instrument(name = "List learning videos", skip(inner))]
pub async fn list_videos(
    State(inner): State<InnerState>,
    Query(params): Query<ListVideosParams>,
) -> Result<Json<ApiResponse<CatalogResponse>>, AppError> {
    ensure_loaded(&inner).await;

    let search = params.search.unwrap_or_default();
    let search = search.trim();
    let category = non_empty(params.category).unwrap_or_else(|| ALL_CATEGORIES.to_string());

    let projection = inner.projection.read().await;
    let videos = projection.filtered(search, &category);
    tracing::debug!(
        matched = videos.len(),
        total = projection.entries().len(),
        "Filtered video catalog"
    );

    Ok(Json(ApiResponse::success(CatalogResponse {
        videos,
        categories: projection.categories(),
        degraded: projection.is_degraded(),
    })))
}

#[tracing::instrument(name = "Reload learning videos", skip(inner))]
pub async fn reload_videos(
    State(inner): State<InnerState>,
) -> Result<Json<ApiResponse<CatalogResponse>>, AppError> {
    let load = inner.catalog.load_catalog().await;
    let mut projection = inner.projection.write().await;
    projection.replace(load);

    Ok(Json(ApiResponse::success(CatalogResponse {
        videos: projection.entries().to_vec(),
        categories: projection.categories(),
        degraded: projection.is_degraded(),
    })))
}

#[tracing::instrument(name = "Upload learning video", skip(inner, identity, form))]
pub async fn upload_video(
    State(inner): State<InnerState>,
    Extension(identity): Extension<SessionIdentity>,
    TypedMultipart(form): TypedMultipart<UploadVideoForm>,
) -> Result<(StatusCode, Json<ApiResponse<VideoEntry>>), AppError> {
    forbid_non_doctor(&identity)?;

    let title = non_empty(form.title);
    let file = form.file.filter(|f| !f.contents.is_empty());
    let (title, file) = match (title, file) {
        (Some(title), Some(file)) => (title, file),
        _ => {
            return Err(AppError::Validation(
                "Please provide both title and video file".to_string(),
            ))
        }
    };

    let request = UploadRequest {
        folder: inner.settings.upload_folder.clone(),
        file: VideoFile {
            file_name: file.metadata.file_name.unwrap_or_default(),
            content_type: file.metadata.content_type,
            bytes: file.contents,
        },
        title,
        description: non_empty(form.description),
        category: non_empty(form.category),
    };

    let entry = inner.catalog.upload_video(&identity, request).await?;

    ensure_loaded(&inner).await;
    let mut projection = inner.projection.write().await;
    if projection.get(&entry.id).is_none() {
        projection.prepend(entry.clone());
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(entry).with_message("Video uploaded successfully")),
    ))
}

#[tracing::instrument(name = "Add external learning video", skip(inner, identity, payload))]
pub async fn add_external_video(
    State(inner): State<InnerState>,
    Extension(identity): Extension<SessionIdentity>,
    Json(payload): Json<AddExternalVideoRequest>,
) -> Result<(StatusCode, Json<ApiResponse<VideoEntry>>), AppError> {
    require_doctor(&identity)?;

    let title = payload.title.trim();
    let url = payload.url.trim();
    if title.is_empty() || url.is_empty() {
        return Err(AppError::Validation(
            "Please provide both title and video URL".to_string(),
        ));
    }
    url::Url::parse(url)
        .map_err(|e| AppError::Validation(format!("Invalid video URL: {}", e)))?;

    ensure_loaded(&inner).await;
    let entry = inner.projection.write().await.append_external(
        title.to_string(),
        non_empty(payload.description),
        url,
    );
    tracing::info!(id = %entry.id, "Added transient external video");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(entry).with_message("YouTube video added")),
    ))
}

#[tracing::instrument(name = "Delete learning video", skip(inner, identity))]
pub async fn delete_video(
    State(inner): State<InnerState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    require_doctor(&identity)?;
    ensure_loaded(&inner).await;

    let mut entry = inner.projection.read().await.get(&id).cloned();
    if entry.is_none() {
        tracing::debug!("Video {} not in projection, reloading", id);
        let load = inner.catalog.load_catalog().await;
        let mut projection = inner.projection.write().await;
        projection.replace(load);
        entry = projection.get(&id).cloned();
    }

    let entry = entry.ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;
    let object_url = entry
        .object_reference()
        .ok_or_else(|| AppError::Validation("Only uploaded videos can be deleted".to_string()))?;

    inner.catalog.delete_video(&id, object_url).await?;
    inner.projection.write().await.remove(&id);

    Ok(Json(
        ApiResponse::success(json!({ "id": id })).with_message("Video removed successfully"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogProjection, CatalogService, ExternalFeed};
    use crate::config::Settings;
    use crate::storage::identity::{issue_token, DOCTOR_ROLE};
    use crate::storage::memory::{MemoryBackend, StoreCall};
    use crate::storage::ObjectStore;
    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::Router;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    const SECRET: &str = "test-secret";
    const OBJECT_URL: &str =
        "https://example.com/storage/v1/object/public/doctor-videos/doctor-uploads/v1.mp4";

    fn settings() -> Settings {
        let vars: HashMap<String, String> = [
            ("DATABASE_URL", "postgres://localhost/learning"),
            ("STORAGE_URL", "https://example.com"),
            ("STORAGE_SERVICE_KEY", "service-key"),
            ("SECRET_TOKEN", SECRET),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Settings::from_vars(vars).unwrap()
    }

    async fn app() -> (Router, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .upload(
                "doctor-videos",
                "doctor-uploads/v1.mp4",
                Bytes::from_static(b"v"),
                "video/mp4",
            )
            .await
            .unwrap();
        backend.seed_row("v1", "Intro to Stroke Care", Some("Manual"), OBJECT_URL);

        let catalog = CatalogService::new(
            backend.clone(),
            backend.clone(),
            ExternalFeed::sample(),
            "doctor-videos",
        );
        let state = InnerState {
            catalog: Arc::new(catalog),
            projection: Arc::new(RwLock::new(CatalogProjection::new())),
            settings: Arc::new(settings()),
        };
        (crate::api::create_api_router(state), backend)
    }

    fn bearer(role: &str) -> String {
        format!("Bearer {}", issue_token("doc-1", role, SECRET))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn lists_external_then_persisted_with_categories() {
        let (app, _) = app().await;

        let response = app
            .oneshot(Request::get("/api/v1/videos").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let videos = body["data"]["videos"].as_array().unwrap();
        assert_eq!(videos.len(), 5);
        assert_eq!(videos[0]["id"], "yt-0");
        assert_eq!(videos[4]["id"], "v1");
        assert_eq!(body["data"]["categories"], json!(["All", "YouTube", "Manual"]));
        assert_eq!(body["data"]["degraded"], false);
    }

    #[tokio::test]
    async fn filters_by_search_and_category() {
        let (app, _) = app().await;

        let response = app
            .oneshot(
                Request::get("/api/v1/videos?search=INTRO&category=Manual")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = body_json(response).await;
        let videos = body["data"]["videos"].as_array().unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0]["title"], "Intro to Stroke Care");
    }

    #[tokio::test]
    async fn invalid_token_is_rejected() {
        let (app, _) = app().await;

        let response = app
            .oneshot(
                Request::get("/api/v1/videos")
                    .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn anonymous_delete_is_unauthenticated() {
        let (app, backend) = app().await;

        let response = app
            .oneshot(Request::delete("/api/v1/videos/v1").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(backend.writes().len(), 1);
    }

    #[tokio::test]
    async fn doctor_deletes_persisted_video() {
        let (app, backend) = app().await;

        let response = app
            .clone()
            .oneshot(
                Request::delete("/api/v1/videos/v1")
                    .header(header::AUTHORIZATION, bearer(DOCTOR_ROLE))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(backend.row_count(), 0);
        assert_eq!(backend.object_count(), 0);
        assert!(backend.calls().contains(&StoreCall::DeleteById("v1".into())));

        let response = app
            .oneshot(Request::get("/api/v1/videos").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"]["videos"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn external_entries_cannot_be_deleted() {
        let (app, _) = app().await;

        let response = app
            .oneshot(
                Request::delete("/api/v1/videos/yt-0")
                    .header(header::AUTHORIZATION, bearer(DOCTOR_ROLE))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_doctors_cannot_add_videos() {
        let (app, _) = app().await;

        let response = app
            .oneshot(
                Request::post("/api/v1/videos/external")
                    .header(header::AUTHORIZATION, bearer("patient"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "title": "Triage", "url": "https://youtu.be/abcdefghijk" })
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn non_doctor_upload_is_refused_before_the_body_is_read() {
        let (app, backend) = app().await;

        let response = app
            .oneshot(
                Request::post("/api/v1/videos")
                    .header(header::AUTHORIZATION, bearer("patient"))
                    .header(header::CONTENT_TYPE, "application/octet-stream")
                    .body(Body::from("not a multipart body"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(backend.writes().len(), 1);
    }

    #[tokio::test]
    async fn anonymous_upload_reaches_the_pipeline() {
        let (app, backend) = app().await;
        let boundary = "learninghubboundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nSepsis Bundle\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"sepsis.mp4\"\r\n\
             Content-Type: video/mp4\r\n\r\nvideo-bytes\r\n--{b}--\r\n",
            b = boundary
        );

        let response = app
            .oneshot(
                Request::post("/api/v1/videos")
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={}", boundary),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Auth session not found");
        assert_eq!(backend.writes().len(), 1);
    }

    #[tokio::test]
    async fn external_video_is_appended_until_reload() {
        let (app, _) = app().await;

        let response = app
            .clone()
            .oneshot(
                Request::post("/api/v1/videos/external")
                    .header(header::AUTHORIZATION, bearer(DOCTOR_ROLE))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "title": "Triage", "url": "https://youtu.be/abcdefghijk" })
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let added = body_json(response).await;
        assert_eq!(added["data"]["category"], "YouTube");

        let response = app
            .clone()
            .oneshot(Request::get("/api/v1/videos?search=triage").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"]["videos"].as_array().unwrap().len(), 1);

        let response = app
            .oneshot(Request::post("/api/v1/videos/reload").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        let videos = body["data"]["videos"].as_array().unwrap();
        assert!(videos.iter().all(|v| v["title"] != "Triage"));
    }

    #[tokio::test]
    async fn doctor_uploads_multipart_video() {
        let (app, backend) = app().await;
        let boundary = "learninghubboundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nSepsis Bundle\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"sepsis.mp4\"\r\n\
             Content-Type: video/mp4\r\n\r\nvideo-bytes\r\n--{b}--\r\n",
            b = boundary
        );

        let response = app
            .oneshot(
                Request::post("/api/v1/videos")
                    .header(header::AUTHORIZATION, bearer(DOCTOR_ROLE))
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={}", boundary),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["data"]["title"], "Sepsis Bundle");
        assert_eq!(body["data"]["category"], "Manual");
        assert_eq!(backend.row_count(), 2);
        assert_eq!(backend.object_count(), 2);
    }

    #[tokio::test]
    async fn upload_without_file_is_a_validation_error() {
        let (app, backend) = app().await;
        let boundary = "learninghubboundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nSepsis Bundle\r\n--{b}--\r\n",
            b = boundary
        );

        let response = app
            .oneshot(
                Request::post("/api/v1/videos")
                    .header(header::AUTHORIZATION, bearer(DOCTOR_ROLE))
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={}", boundary),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(backend.row_count(), 1);
    }
}
