//! API Version 1 endpoints

pub mod videos;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::{middleware, Router};

use crate::api::common::middleware::{auth_middleware, reject_non_doctor};
use crate::InnerState;

/// Largest accepted upload request, multipart framing included.
pub const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Creates the V1 API router
#[tracing::instrument(name = "create_v1_router", skip(state))]
pub fn create_v1_router(state: InnerState) -> Router {
    tracing::info!("Creating V1 API router");

    Router::new()
        .route(
            "/api/v1/videos",
            get(videos::list_videos).merge(
                post(videos::upload_video)
                    .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
                    .route_layer(middleware::from_fn(reject_non_doctor)),
            ),
        )
        .route("/api/v1/videos/reload", post(videos::reload_videos))
        .route(
            "/api/v1/videos/external",
            post(videos::add_external_video).route_layer(middleware::from_fn(reject_non_doctor)),
        )
        .route(
            "/api/v1/videos/:id",
            delete(videos::delete_video).route_layer(middleware::from_fn(reject_non_doctor)),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
