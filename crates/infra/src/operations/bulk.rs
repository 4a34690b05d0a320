use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use oysters_core::{DomainError, TenantId, UserId};
use oysters_events::{EventBus, EventEnvelope};
use oysters_orders::{ActorRole, AssignCourier, ChangeStatus, OrderCommand, OrderId, OrderStatus};

use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::event_store::EventStore;

/// Admin bulk edit. `courier_id: Some(None)` unassigns.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BulkRequest {
    pub order_ids: Vec<OrderId>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub courier_id: Option<Option<UserId>>,
    #[serde(default)]
    pub note: Option<String>,
}

fn double_option<'de, D>(de: D) -> Result<Option<Option<UserId>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<UserId>::deserialize(de).map(Some)
}

impl BulkRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.order_ids.is_empty() {
            return Err(DomainError::validation("order_ids must not be empty"));
        }
        if self.status.is_none() && self.courier_id.is_none() {
            return Err(DomainError::validation("choose a status or a courier"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BulkOutcome {
    Updated { order_id: OrderId, events: usize },
    Failed { order_id: OrderId, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkResult {
    pub updated: usize,
    pub failed: usize,
    pub outcomes: Vec<BulkOutcome>,
}

/// Apply the request to each order through the aggregate gate, courier first.
/// One order failing does not stop the others.
pub fn bulk_update<S, B>(
    dispatcher: &CommandDispatcher<S, B>,
    tenant_id: TenantId,
    request: &BulkRequest,
    changed_by: UserId,
    now: DateTime<Utc>,
) -> Result<BulkResult, DomainError>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    request.validate()?;

    let mut outcomes = Vec::with_capacity(request.order_ids.len());
    for &order_id in &request.order_ids {
        let outcome = match apply_one(dispatcher, tenant_id, order_id, request, changed_by, now) {
            Ok(events) => BulkOutcome::Updated { order_id, events },
            Err(err) => {
                tracing::warn!(%order_id, error = %err, "bulk update skipped order");
                BulkOutcome::Failed {
                    order_id,
                    error: err.to_string(),
                }
            }
        };
        outcomes.push(outcome);
    }

    let updated = outcomes
        .iter()
        .filter(|o| matches!(o, BulkOutcome::Updated { .. }))
        .count();
    tracing::info!(%tenant_id, updated, total = outcomes.len(), "bulk order update finished");

    Ok(BulkResult {
        updated,
        failed: outcomes.len() - updated,
        outcomes,
    })
}

fn apply_one<S, B>(
    dispatcher: &CommandDispatcher<S, B>,
    tenant_id: TenantId,
    order_id: OrderId,
    request: &BulkRequest,
    changed_by: UserId,
    now: DateTime<Utc>,
) -> Result<usize, DispatchError>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    let mut events = 0;

    if let Some(courier_id) = request.courier_id {
        events += dispatcher
            .dispatch_order(
                tenant_id,
                OrderCommand::AssignCourier(AssignCourier {
                    tenant_id,
                    order_id,
                    courier_id,
                    assigned_by: Some(changed_by),
                    occurred_at: now,
                }),
            )?
            .len();
    }

    if let Some(status) = request.status {
        events += dispatcher
            .dispatch_order(
                tenant_id,
                OrderCommand::ChangeStatus(ChangeStatus {
                    tenant_id,
                    order_id,
                    status,
                    changed_by,
                    role: ActorRole::Ops,
                    note: request.note.clone(),
                    occurred_at: now,
                }),
            )?
            .len();
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use oysters_core::{AggregateId, Money};
    use oysters_events::InMemoryEventBus;
    use oysters_orders::{
        CustomerContact, DeliveryAddress, DeliverySlot, DeliveryWindow, OrderKind, OrderLine, PaymentMethod,
        PlaceOrder,
    };

    use crate::event_store::InMemoryEventStore;

    type Dispatcher = CommandDispatcher<InMemoryEventStore, InMemoryEventBus<EventEnvelope<JsonValue>>>;

    fn placed(d: &Dispatcher, tenant_id: TenantId) -> OrderId {
        let order_id = OrderId::new(AggregateId::new());
        d.dispatch_order(
            tenant_id,
            OrderCommand::PlaceOrder(PlaceOrder {
                tenant_id,
                order_id,
                kind: OrderKind::Quick,
                customer_id: None,
                customer: CustomerContact {
                    name: "Anna".to_string(),
                    phone: "+79991112233".to_string(),
                    email: None,
                },
                address: DeliveryAddress::default(),
                delivery: DeliveryWindow {
                    date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
                    slot: DeliverySlot::Evening,
                    hourly_slot: None,
                },
                lines: vec![OrderLine {
                    product_id: "fine-de-claire-3".to_string(),
                    name: "Fine de Claire No.3".to_string(),
                    unit: "pcs".to_string(),
                    quantity: 12,
                    unit_price: Money::from_minor(32_000),
                }],
                payment_method: PaymentMethod::Cash,
                notify_before_hours: None,
                occurred_at: Utc::now(),
            }),
        )
        .unwrap();
        order_id
    }

    #[test]
    fn requires_status_or_courier() {
        let request = BulkRequest {
            order_ids: vec![OrderId::new(AggregateId::new())],
            status: None,
            courier_id: None,
            note: None,
        };
        assert!(matches!(request.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn null_courier_means_unassign() {
        let request: BulkRequest = serde_json::from_value(serde_json::json!({
            "order_ids": [AggregateId::new()],
            "courier_id": null
        }))
        .unwrap();
        assert_eq!(request.courier_id, Some(None));

        let absent: BulkRequest = serde_json::from_value(serde_json::json!({
            "order_ids": [AggregateId::new()],
            "status": "CONFIRMED"
        }))
        .unwrap();
        assert_eq!(absent.courier_id, None);
    }

    #[test]
    fn failures_are_reported_per_order() {
        let d = Dispatcher::new(InMemoryEventStore::new(), InMemoryEventBus::new());
        let tenant_id = TenantId::new();
        let first = placed(&d, tenant_id);
        let second = placed(&d, tenant_id);
        let missing = OrderId::new(AggregateId::new());
        let admin = UserId::new();

        // Asking for CONFIRMED again is a rejected self transition.
        let confirm = BulkRequest {
            order_ids: vec![second],
            status: Some(OrderStatus::Confirmed),
            courier_id: None,
            note: None,
        };
        bulk_update(&d, tenant_id, &confirm, admin, Utc::now()).unwrap();

        let courier = UserId::new();
        let request = BulkRequest {
            order_ids: vec![first, second, missing],
            status: Some(OrderStatus::Confirmed),
            courier_id: Some(Some(courier)),
            note: Some("evening run".to_string()),
        };
        let result = bulk_update(&d, tenant_id, &request, admin, Utc::now()).unwrap();

        assert_eq!(result.updated, 1);
        assert_eq!(result.failed, 2);
        assert!(matches!(result.outcomes[0], BulkOutcome::Updated { events: 2, .. }));
        assert!(matches!(result.outcomes[1], BulkOutcome::Failed { .. }));
        assert!(matches!(result.outcomes[2], BulkOutcome::Failed { .. }));

        let order = d.load_order(tenant_id, first).unwrap();
        assert_eq!(order.status(), OrderStatus::Confirmed);
        assert_eq!(order.courier_id(), Some(courier));
    }
}
