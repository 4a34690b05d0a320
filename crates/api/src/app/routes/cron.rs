//! Scheduled jobs triggered over HTTP by an external scheduler.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use serde_json::json;

use oysters_infra::operations::due_reminders;

use crate::app::{dto, errors, services::AppServices};
use crate::middleware::extract_bearer;

pub fn router() -> Router {
    Router::new().route("/cron/notify-delivery", get(notify_delivery))
}

/// Send delivery reminders for orders starting about `hours` from now.
pub async fn notify_delivery(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Query(query): Query<dto::ReminderQuery>,
) -> axum::response::Response {
    if let Some(secret) = services.config().cron_secret.as_deref() {
        if extract_bearer(&headers) != Some(secret) {
            return errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized", "invalid cron secret");
        }
    }

    let hours = match parse_hours(query.hours.as_deref()) {
        Some(h) => h,
        None => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "hours must be a positive integer",
            );
        }
    };

    let tenant_id = services.storefront_tenant();
    let now = Utc::now();
    let due = due_reminders(
        &services.orders_list(tenant_id),
        now,
        hours,
        services.config().delivery_offset,
    );
    let report = services.notifications().send_reminders(tenant_id, &due, hours);
    tracing::info!(
        hours,
        total = report.total,
        sent = report.sent,
        skipped = report.skipped,
        failed = report.failed,
        "delivery reminders run"
    );

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "total": report.total,
            "sent": report.sent,
            "skipped": report.skipped,
            "failed": report.failed,
            "timestamp": now,
        })),
    )
        .into_response()
}

/// Missing means 1. Anything else must be an integer of at least 1.
fn parse_hours(raw: Option<&str>) -> Option<u16> {
    match raw.map(str::trim) {
        None | Some("") => Some(1),
        Some(s) => s.parse::<u16>().ok().filter(|h| *h >= 1),
    }
}
