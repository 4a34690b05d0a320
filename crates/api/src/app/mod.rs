//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: event store/bus, projection worker, dispatcher, notifications
//! - `routes/`: handlers, one file per surface
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent JSON error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use oysters_auth::Hs256JwtValidator;
use oysters_infra::config::AppConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build services and the full router from configuration.
pub fn build_app(config: AppConfig) -> std::io::Result<Router> {
    let services = Arc::new(services::build_services(config)?);
    Ok(router(services))
}

/// Full router over already-built services. Public routes get the services
/// only; protected routes also pass through bearer authentication.
pub fn router(services: Arc<AppServices>) -> Router {
    let jwt = Arc::new(Hs256JwtValidator::new(
        services.config().jwt_secret.clone().into_bytes(),
    ));
    let auth_state = middleware::AuthState { jwt };

    let protected = routes::router()
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    let public = routes::public_router().layer(Extension(services));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(ServiceBuilder::new())
}
