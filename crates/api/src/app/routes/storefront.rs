//! Public checkout endpoints. They act on the storefront tenant.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use chrono::Utc;

use oysters_core::AggregateId;
use oysters_orders::{
    CustomerContact, DeliveryAddress, OrderCommand, OrderId, OrderKind, OrderLine, PaymentMethod, PlaceOrder,
};

use crate::app::{dto, errors, services::AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/orders", post(checkout))
        .route("/quick-order", post(quick_order))
}

pub async fn checkout(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CheckoutRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", e.body_text()),
    };
    let tenant_id = services.storefront_tenant();
    let order_id = OrderId::new(AggregateId::new());

    let cmd = OrderCommand::PlaceOrder(PlaceOrder {
        tenant_id,
        order_id,
        kind: OrderKind::Checkout,
        customer_id: None,
        customer: body.customer,
        address: body.address,
        delivery: body.delivery,
        lines: body.items,
        payment_method: body.payment_method,
        notify_before_hours: body.notify_before_hours,
        occurred_at: Utc::now(),
    });

    place(&services, order_id, cmd)
}

pub async fn quick_order(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::QuickOrderRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", e.body_text()),
    };
    let tenant_id = services.storefront_tenant();
    let order_id = OrderId::new(AggregateId::new());
    let now = Utc::now();

    let cmd = OrderCommand::PlaceOrder(PlaceOrder {
        tenant_id,
        order_id,
        kind: OrderKind::Quick,
        customer_id: None,
        customer: CustomerContact {
            name: body.name,
            phone: body.phone,
            email: None,
        },
        address: DeliveryAddress {
            comment: body.comment,
            ..Default::default()
        },
        delivery: dto::quick_delivery(services.today(now), body.delivery_slot),
        lines: vec![OrderLine {
            product_id: body.product_id,
            name: body.product_name,
            unit: body.unit,
            quantity: body.quantity,
            unit_price: body.unit_price,
        }],
        payment_method: PaymentMethod::Cash,
        notify_before_hours: None,
        occurred_at: now,
    });

    place(&services, order_id, cmd)
}

fn place(services: &Arc<AppServices>, order_id: OrderId, cmd: OrderCommand) -> axum::response::Response {
    let tenant_id = services.storefront_tenant();
    if let Err(e) = services.dispatch_order(tenant_id, cmd) {
        return errors::dispatch_error_to_response(e);
    }
    let order = match services.load_order(tenant_id, order_id) {
        Ok(o) => o,
        Err(e) => return errors::dispatch_error_to_response(e),
    };
    tracing::info!(
        %order_id,
        order_number = order.order_number(),
        kind = ?order.kind(),
        total = %order.total(),
        "order placed"
    );
    (StatusCode::CREATED, Json(dto::PlacedOrderResponse::from_order(&order))).into_response()
}
