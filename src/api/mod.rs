//! HTTP surface of the learning hub.
//!
//! Endpoints are grouped by version so clients can migrate gradually.

pub mod common;
pub mod v1;

use axum::Router;

use crate::InnerState;

/// Creates the API router with all versions mounted.
#[tracing::instrument(name = "create_api_router", skip(state))]
pub fn create_api_router(state: InnerState) -> Router {
    tracing::info!("Creating API router with versioned endpoints");

    Router::new().merge(v1::create_v1_router(state))
}
