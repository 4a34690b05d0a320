use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use oysters_core::{Money, UserId};
use oysters_infra::event_store::StoredEvent;
use oysters_orders::{
    CustomerContact, DeliveryAddress, DeliverySlot, DeliveryWindow, Order, OrderId, OrderKind, OrderLine,
    OrderStatus, PaymentMethod, PaymentProvider, StatusAction,
};

/// `POST /orders`. Anonymous, so it names no customer account.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub customer: CustomerContact,
    pub address: DeliveryAddress,
    pub delivery: DeliveryWindow,
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub notify_before_hours: Option<u16>,
}

/// `POST /quick-order`: one product, a name and a phone.
#[derive(Debug, Clone, Deserialize)]
pub struct QuickOrderRequest {
    pub product_id: String,
    pub product_name: String,
    #[serde(default)]
    pub unit: String,
    pub unit_price: Money,
    #[serde(default = "one")]
    pub quantity: u32,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub delivery_slot: DeliverySlot,
    #[serde(default)]
    pub comment: Option<String>,
}

fn one() -> u32 {
    1
}

/// `PATCH /ops/orders/:id/status` and `/courier/orders/:id/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusChangeRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrderResponse {
    pub id: OrderId,
    pub order_number: String,
    pub kind: OrderKind,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
}

impl PlacedOrderResponse {
    pub fn from_order(order: &Order) -> Self {
        Self {
            id: order.id_typed(),
            order_number: order.order_number().to_string(),
            kind: order.kind(),
            status: order.status(),
            total_amount: order.total(),
            payment_method: order.payment_method(),
        }
    }
}

/// Order state right after a command, with what the caller may do next.
#[derive(Debug, Clone, Serialize)]
pub struct OrderStateResponse {
    pub id: OrderId,
    pub status: OrderStatus,
    pub courier_id: Option<UserId>,
    pub events_committed: usize,
    pub actions: &'static [StatusAction],
}

impl OrderStateResponse {
    pub fn new(order: &Order, committed: &[StoredEvent], actions: &'static [StatusAction]) -> Self {
        Self {
            id: order.id_typed(),
            status: order.status(),
            courier_id: order.courier_id(),
            events_committed: committed.len(),
            actions,
        }
    }
}

/// `GET /admin/orders` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<OrderStatus>,
    pub courier_id: Option<UserId>,
    pub search: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// `POST /payments/create`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentRequest {
    pub order_id: OrderId,
    #[serde(default = "default_provider")]
    pub provider: PaymentProvider,
}

fn default_provider() -> PaymentProvider {
    PaymentProvider::CloudPayments
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePaymentResponse {
    pub order_id: OrderId,
    pub provider: PaymentProvider,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReminderQuery {
    pub hours: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutboxQuery {
    pub limit: Option<usize>,
}

/// Data for the quick order's delivery window: today, chosen slot.
pub fn quick_delivery(today: NaiveDate, slot: DeliverySlot) -> DeliveryWindow {
    DeliveryWindow {
        date: today,
        slot,
        hourly_slot: None,
    }
}
