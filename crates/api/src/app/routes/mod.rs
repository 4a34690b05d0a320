use axum::{Router, routing::get};

pub mod admin;
pub mod common;
pub mod courier;
pub mod cron;
pub mod ops;
pub mod payments;
pub mod storefront;
pub mod system;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/stream", get(system::stream))
        .merge(ops::router())
        .merge(courier::router())
        .nest("/admin", admin::router())
}

/// Storefront, payment and scheduler endpoints. No bearer token required.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .merge(storefront::router())
        .merge(payments::router())
        .merge(cron::router())
}
