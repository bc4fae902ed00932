//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store backend selection and the request deadline
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use pvz_infra::config::AppConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = services::build_services(config).await?;
    Ok(router(services))
}

/// Router over already wired services.
pub fn router(services: services::AppServices) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::log_requests))
                .layer(Extension(Arc::new(services))),
        )
}
