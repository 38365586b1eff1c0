mod api;
mod catalog;
mod config;
mod db;
mod errors;
mod storage;
mod system;

use std::error::Error;
use std::sync::Arc;

use axum::body::Body;
use axum::Router;
use axum_prometheus::PrometheusMetricLayer;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::api::common::tracing::{
    make_custom_span, on_custom_failure, on_custom_request, on_custom_response,
};
use crate::api::create_api_router;
use crate::catalog::{CatalogProjection, CatalogService, ExternalFeed};
use crate::config::Settings;
use crate::db::init_db;
use crate::storage::{PgVideoRepository, StorageClient};
use crate::system::create_system_router;

#[derive(Clone)]
pub struct InnerState {
    pub catalog: Arc<CatalogService>,
    pub projection: Arc<RwLock<CatalogProjection>>,
    pub settings: Arc<Settings>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "learning_hub_api=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;
    let db = init_db(&settings).await?;

    let objects = Arc::new(StorageClient::new(
        settings.storage_url.clone(),
        settings.storage_service_key.clone(),
    ));
    let metadata = Arc::new(PgVideoRepository::new(db));

    let catalog = CatalogService::new(
        objects,
        metadata,
        ExternalFeed::sample(),
        settings.video_bucket.clone(),
    )
    .with_orphan_policy(settings.orphan_policy.into_policy());

    tracing::info!(
        bucket = %settings.video_bucket,
        folder = %settings.upload_folder,
        orphan_policy = ?settings.orphan_policy,
        "Video catalog configured"
    );

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let bind_address = settings.bind_address.clone();
    let app_state = InnerState {
        catalog: Arc::new(catalog),
        projection: Arc::new(RwLock::new(CatalogProjection::new())),
        settings: Arc::new(settings),
    };

    let app = Router::new()
        .merge(create_system_router(metric_handle))
        .merge(create_api_router(app_state))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_custom_span::<Body>)
                .on_request(on_custom_request::<Body>)
                .on_response(on_custom_response::<Body>)
                .on_failure(on_custom_failure),
        )
        .layer(prometheus_layer);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    tracing::debug!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
