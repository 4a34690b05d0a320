//! The signed-in courier's deliveries.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::Utc;

use oysters_auth::Permission;
use oysters_infra::operations::courier_dashboard;
use oysters_orders::ActorRole;

use crate::app::{dto, errors, services::AppServices};
use crate::authz;
use crate::context::{PrincipalContext, TenantContext};

use super::common;

pub fn router() -> Router {
    Router::new()
        .route("/courier/orders", get(dashboard))
        .route("/courier/orders/:id/status", patch(change_status))
}

pub async fn dashboard(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = common::require(&tenant, &principal, vec![Permission::COURIER_READ]) {
        return resp;
    }
    if let Err(e) = authz::ensure_acts_as(&principal, ActorRole::Courier) {
        return errors::authz_error_to_response(e);
    }
    let orders = services.orders_list(tenant.tenant_id());
    let board = courier_dashboard(
        &orders,
        principal.user_id(),
        Utc::now(),
        services.config().delivery_offset,
    );
    (StatusCode::OK, Json(board)).into_response()
}

/// Couriers may act on their own orders and on unassigned ones, which they
/// take over in the same command.
pub async fn change_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::StatusChangeRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", e.body_text()),
    };

    common::change_status(
        &services,
        &tenant,
        &principal,
        &id,
        body,
        ActorRole::Courier,
        Permission::COURIER_TRANSITION,
    )
}
