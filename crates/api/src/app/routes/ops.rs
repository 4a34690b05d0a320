//! Kitchen and dispatch board for admin and staff.

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
use oysters_infra::operations::ops_dashboard;
use oysters_orders::ActorRole;

use crate::app::{dto, errors, services::AppServices};
use crate::context::{PrincipalContext, TenantContext};

use super::common;

pub fn router() -> Router {
    Router::new()
        .route("/ops/orders", get(dashboard))
        .route("/ops/orders/:id/status", patch(change_status))
}

pub async fn dashboard(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = common::require(&tenant, &principal, vec![Permission::OPS_READ]) {
        return resp;
    }
    let orders = services.orders_list(tenant.tenant_id());
    let board = ops_dashboard(&orders, Utc::now(), services.config().delivery_offset);
    (StatusCode::OK, Json(board)).into_response()
}

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
        ActorRole::Ops,
        Permission::OPS_TRANSITION,
    )
}
