//! Payment links and provider webhooks (public, storefront tenant).

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use chrono::Utc;
use serde_json::json;

use oysters_core::AggregateId;
use oysters_infra::command_dispatcher::DispatchError;
use oysters_orders::{OrderCommand, OrderId, PaymentMethod, PaymentProvider, RecordPayment};
use oysters_payments::{PaymentNotice, WebhookError, cloudpayments_widget_url, verify_signature};

use crate::app::{dto, errors, services::AppServices};

pub const CLOUDPAYMENTS_SIGNATURE_HEADER: &str = "x-cloudpayments-signature";
pub const YOOKASSA_SIGNATURE_HEADER: &str = "x-yoomoney-signature";

pub fn router() -> Router {
    Router::new()
        .route("/payments/create", post(create))
        .route("/payments/cloudpayments/webhook", post(cloudpayments_webhook))
        .route("/payments/yookassa/webhook", post(yookassa_webhook))
}

// ─────────────────────────────────────────────────────────────────────────────
// Payment links
// ─────────────────────────────────────────────────────────────────────────────

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreatePaymentRequest>, JsonRejection>,
) -> axum::response::Response {
    let payments = &services.config().payments;
    if !payments.online_enabled {
        return errors::json_error(StatusCode::FORBIDDEN, "feature_disabled", "online payments are disabled");
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", e.body_text()),
    };

    let order = match services.load_order(services.storefront_tenant(), body.order_id) {
        Ok(o) if o.is_placed() => o,
        Ok(_) => return errors::dispatch_error_to_response(DispatchError::NotFound),
        Err(e) => return errors::dispatch_error_to_response(e),
    };
    if order.payment_method() != PaymentMethod::Online {
        return errors::json_error(StatusCode::BAD_REQUEST, "not_online", "order is not paid online");
    }
    if order.payment().is_some() {
        return errors::json_error(StatusCode::CONFLICT, "already_paid", "order is already paid");
    }

    let url = match body.provider {
        PaymentProvider::CloudPayments => {
            let Some(public_id) = payments.cloudpayments_public_id.as_deref() else {
                return errors::json_error(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "provider_not_configured",
                    "cloudpayments is not configured",
                );
            };
            match cloudpayments_widget_url(public_id, order.id_typed(), order.total(), order.order_number()) {
                Ok(url) => url,
                Err(e) => {
                    return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "link_error", e.to_string());
                }
            }
        }
        PaymentProvider::YooKassa => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "unsupported_provider",
                "yookassa links are created by the provider checkout",
            );
        }
    };

    tracing::info!(order_id = %order.id_typed(), provider = %body.provider, "payment link created");
    (
        StatusCode::OK,
        Json(dto::CreatePaymentResponse {
            order_id: order.id_typed(),
            provider: body.provider,
            url,
        }),
    )
        .into_response()
}

// ─────────────────────────────────────────────────────────────────────────────
// Webhooks
// ─────────────────────────────────────────────────────────────────────────────

pub async fn cloudpayments_webhook(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    body: Bytes,
) -> axum::response::Response {
    let secret = services.config().payments.cloudpayments_secret.clone();
    handle_webhook(
        &services,
        &headers,
        &body,
        CLOUDPAYMENTS_SIGNATURE_HEADER,
        secret.as_deref(),
        oysters_payments::parse_cloudpayments,
        json!({ "code": 0 }),
    )
}

pub async fn yookassa_webhook(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    body: Bytes,
) -> axum::response::Response {
    let secret = services.config().payments.yookassa_secret.clone();
    handle_webhook(
        &services,
        &headers,
        &body,
        YOOKASSA_SIGNATURE_HEADER,
        secret.as_deref(),
        oysters_payments::parse_yookassa,
        json!({ "status": "ok" }),
    )
}

fn handle_webhook(
    services: &AppServices,
    headers: &HeaderMap,
    body: &[u8],
    signature_header: &str,
    secret: Option<&str>,
    parse: fn(&[u8]) -> Result<Option<PaymentNotice>, WebhookError>,
    ack: serde_json::Value,
) -> axum::response::Response {
    let signature = headers
        .get(signature_header)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !verify_signature(secret, body, signature) {
        tracing::warn!(header = signature_header, "webhook signature rejected");
        return errors::json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_signature",
            WebhookError::InvalidSignature.to_string(),
        );
    }

    let notice = match parse(body) {
        Ok(Some(n)) => n,
        Ok(None) => return (StatusCode::OK, Json(ack)).into_response(),
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", e.to_string()),
    };

    match reconcile(services, &notice) {
        Ok(()) | Err(DispatchError::NotFound) => (StatusCode::OK, Json(ack)).into_response(),
        Err(e) => {
            tracing::warn!(
                provider = %notice.provider,
                order_ref = %notice.order_ref,
                error = %e,
                "payment not recorded"
            );
            errors::dispatch_error_to_response(e)
        }
    }
}

/// Record the notice on the referenced order. Notices that can never apply
/// (unknown order, order not paid online, paid under another payment id) are
/// logged and treated as handled.
fn reconcile(services: &AppServices, notice: &PaymentNotice) -> Result<(), DispatchError> {
    let tenant_id = services.storefront_tenant();
    let Ok(id) = notice.order_ref.parse::<AggregateId>() else {
        tracing::warn!(provider = %notice.provider, order_ref = %notice.order_ref, "payment for unknown order");
        return Ok(());
    };
    let order_id = OrderId::new(id);

    let order = services.load_order(tenant_id, order_id)?;
    if !order.is_placed() {
        tracing::warn!(%order_id, provider = %notice.provider, "payment for unknown order");
        return Ok(());
    }
    if order.payment_method() != PaymentMethod::Online {
        tracing::warn!(
            %order_id,
            provider = %notice.provider,
            payment_id = %notice.payment_id,
            "payment for an order not paid online"
        );
        return Ok(());
    }
    if let Some(existing) = order.payment().filter(|p| p.payment_id != notice.payment_id.trim()) {
        tracing::warn!(
            %order_id,
            provider = %notice.provider,
            payment_id = %notice.payment_id,
            recorded_payment_id = %existing.payment_id,
            "order already paid by another payment"
        );
        return Ok(());
    }

    let cmd = OrderCommand::RecordPayment(RecordPayment {
        tenant_id,
        order_id,
        provider: notice.provider,
        payment_id: notice.payment_id.clone(),
        occurred_at: Utc::now(),
    });

    let committed = services.dispatch_order(tenant_id, cmd)?;
    tracing::info!(
        %order_id,
        provider = %notice.provider,
        payment_id = %notice.payment_id,
        recorded = !committed.is_empty(),
        "payment reconciled"
    );
    Ok(())
}
