//! Admin routes: order listing, bulk updates, notification settings.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::Utc;

use oysters_auth::Permission;
use oysters_infra::operations::{BulkRequest, OrderFilter, Pagination, bulk_update, list_orders};
use oysters_notifications::NotificationSettingsInput;

use crate::app::{dto, errors, services::AppServices};
use crate::context::{PrincipalContext, TenantContext};

use super::common;

const DEFAULT_OUTBOX_LIMIT: usize = 50;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router {
    Router::new()
        .route("/orders", get(list))
        .route("/orders/bulk", patch(bulk))
        .route(
            "/settings/notifications",
            get(get_notification_settings).put(put_notification_settings),
        )
        .route("/notifications/outbox", get(outbox))
}

// ─────────────────────────────────────────────────────────────────────────────
// Orders
// ─────────────────────────────────────────────────────────────────────────────

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::ListOrdersQuery>,
) -> axum::response::Response {
    if let Err(resp) = common::require(&tenant, &principal, vec![Permission::ORDERS_LIST]) {
        return resp;
    }
    let pagination = match Pagination::new(query.page, query.limit) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let filter = OrderFilter {
        status: query.status,
        courier_id: query.courier_id,
        search: query.search,
        created_from: query.from,
        created_to: query.to,
    };

    let page = list_orders(services.orders_list(tenant.tenant_id()), &filter, pagination);
    (StatusCode::OK, Json(page)).into_response()
}

pub async fn bulk(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<BulkRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", e.body_text()),
    };
    if let Err(resp) = common::require(&tenant, &principal, vec![Permission::ORDERS_BULK_UPDATE]) {
        return resp;
    }

    match bulk_update(
        services.dispatcher(),
        tenant.tenant_id(),
        &body,
        principal.user_id(),
        Utc::now(),
    ) {
        Ok(result) => {
            tracing::info!(
                tenant_id = %tenant.tenant_id(),
                updated = result.updated,
                failed = result.failed,
                "bulk order update"
            );
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Notifications
// ─────────────────────────────────────────────────────────────────────────────

/// Stored settings only; environment fallbacks are not echoed back.
pub async fn get_notification_settings(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = common::require(&tenant, &principal, vec![Permission::NOTIFICATION_SETTINGS_READ]) {
        return resp;
    }
    let settings = services.notification_config().stored(tenant.tenant_id());
    (StatusCode::OK, Json(settings)).into_response()
}

pub async fn put_notification_settings(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<NotificationSettingsInput>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", e.body_text()),
    };
    if let Err(resp) = common::require(&tenant, &principal, vec![Permission::NOTIFICATION_SETTINGS_WRITE]) {
        return resp;
    }

    match services.notification_config().save(tenant.tenant_id(), &body) {
        Ok(saved) => (StatusCode::OK, Json(saved)).into_response(),
        Err(e) => errors::settings_error_to_response(e),
    }
}

/// Most recent deliveries, newest first.
pub async fn outbox(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::OutboxQuery>,
) -> axum::response::Response {
    if let Err(resp) = common::require(&tenant, &principal, vec![Permission::NOTIFICATION_SETTINGS_READ]) {
        return resp;
    }
    let limit = query.limit.unwrap_or(DEFAULT_OUTBOX_LIMIT);
    (StatusCode::OK, Json(services.outbox().recent(limit))).into_response()
}
