use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use oysters_core::{AggregateId, Money, TenantId, UserId};
use oysters_events::EventEnvelope;
use oysters_notifications::OrderNotice;
use oysters_orders::{
    CustomerContact, DeliveryAddress, DeliveryWindow, HistoryEntry, ORDER_AGGREGATE_TYPE,
    OrderEvent, OrderId, OrderKind, OrderLine, OrderStatus, PaymentMethod, PaymentRecord,
};

use crate::read_model::TenantStore;

/// Query-side view of one order, as the dashboards and listings show it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderReadModel {
    pub id: OrderId,
    pub order_number: String,
    pub kind: OrderKind,
    pub status: OrderStatus,
    pub customer_id: Option<UserId>,
    pub customer: CustomerContact,
    pub address: DeliveryAddress,
    pub delivery: DeliveryWindow,
    pub items: Vec<OrderLine>,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub payment: Option<PaymentRecord>,
    pub courier_id: Option<UserId>,
    pub notify_before_hours: u16,
    pub history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderReadModel {
    /// Facts the notification planner renders messages from.
    pub fn notice(&self) -> OrderNotice {
        OrderNotice {
            order_id: self.id,
            order_number: self.order_number.clone(),
            status: self.status,
            total: self.total_amount,
            customer_phone: self.customer.phone.clone(),
            customer_email: self.customer.email.clone(),
            courier_id: self.courier_id,
            delivery_date: self.delivery.date,
            slot: self.delivery.slot,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct CursorKey {
    tenant_id: TenantId,
    aggregate_id: AggregateId,
}

#[derive(Debug, Error)]
pub enum OrderProjectionError {
    #[error("failed to deserialize order event: {0}")]
    Deserialize(String),
    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),
    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
}

/// Builds [`OrderReadModel`]s from order envelopes.
///
/// A per-stream cursor makes redelivered envelopes no-ops.
#[derive(Debug)]
pub struct OrdersProjection<S>
where
    S: TenantStore<OrderId, OrderReadModel>,
{
    store: S,
    cursors: RwLock<HashMap<CursorKey, u64>>,
}

impl<S> OrdersProjection<S>
where
    S: TenantStore<OrderId, OrderReadModel>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: RwLock::new(HashMap::new()),
        }
    }

    fn get_cursor(&self, tenant_id: TenantId, aggregate_id: AggregateId) -> u64 {
        match self.cursors.read() {
            Ok(cursors) => cursors
                .get(&CursorKey {
                    tenant_id,
                    aggregate_id,
                })
                .copied()
                .unwrap_or(0),
            Err(_) => 0,
        }
    }

    fn update_cursor(&self, tenant_id: TenantId, aggregate_id: AggregateId, seq: u64) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.insert(
                CursorKey {
                    tenant_id,
                    aggregate_id,
                },
                seq,
            );
        }
    }

    fn clear_cursors(&self, tenant_id: TenantId) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.retain(|k, _| k.tenant_id != tenant_id);
        }
    }

    pub fn get(&self, tenant_id: TenantId, order_id: &OrderId) -> Option<OrderReadModel> {
        self.store.get(tenant_id, order_id)
    }

    pub fn list(&self, tenant_id: TenantId) -> Vec<OrderReadModel> {
        self.store.list(tenant_id)
    }

    /// Apply one envelope. Returns the updated read model, or `None` when the
    /// envelope was foreign or already applied.
    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<Option<OrderReadModel>, OrderProjectionError> {
        if envelope.aggregate_type() != ORDER_AGGREGATE_TYPE {
            return Ok(None);
        }

        let tenant_id = envelope.tenant_id();
        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();

        let last = self.get_cursor(tenant_id, aggregate_id);
        if seq == 0 {
            return Err(OrderProjectionError::NonMonotonicSequence { last, found: seq });
        }
        if seq <= last {
            return Ok(None);
        }
        if seq != last + 1 && last != 0 {
            return Err(OrderProjectionError::NonMonotonicSequence { last, found: seq });
        }

        let ev: OrderEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| OrderProjectionError::Deserialize(e.to_string()))?;

        let event_tenant = match &ev {
            OrderEvent::OrderPlaced(e) => e.tenant_id,
            OrderEvent::StatusChanged(e) => e.tenant_id,
            OrderEvent::CourierAssigned(e) => e.tenant_id,
            OrderEvent::CourierUnassigned(e) => e.tenant_id,
            OrderEvent::PaymentReceived(e) => e.tenant_id,
        };
        if event_tenant != tenant_id {
            return Err(OrderProjectionError::TenantIsolation(
                "event tenant_id does not match envelope tenant_id".to_string(),
            ));
        }
        let order_id = ev.order_id();
        if order_id.0 != aggregate_id {
            return Err(OrderProjectionError::TenantIsolation(
                "event order_id does not match envelope aggregate_id".to_string(),
            ));
        }

        let updated = match ev {
            OrderEvent::OrderPlaced(e) => Some(OrderReadModel {
                id: e.order_id,
                order_number: e.order_number,
                kind: e.kind,
                status: OrderStatus::New,
                customer_id: e.customer_id,
                customer: e.customer,
                address: e.address,
                delivery: e.delivery,
                items: e.lines,
                total_amount: e.total,
                payment_method: e.payment_method,
                payment: None,
                courier_id: None,
                notify_before_hours: e.notify_before_hours,
                history: vec![HistoryEntry {
                    from: None,
                    to: OrderStatus::New,
                    changed_by: e.customer_id,
                    role: None,
                    note: None,
                    at: e.occurred_at,
                }],
                created_at: e.occurred_at,
                updated_at: e.occurred_at,
            }),
            other => self.store.get(tenant_id, &order_id).map(|mut rm| {
                match other {
                    OrderEvent::StatusChanged(e) => {
                        rm.status = e.to;
                        rm.history.push(HistoryEntry {
                            from: Some(e.from),
                            to: e.to,
                            changed_by: Some(e.changed_by),
                            role: Some(e.role),
                            note: e.note,
                            at: e.occurred_at,
                        });
                        rm.updated_at = e.occurred_at;
                    }
                    OrderEvent::CourierAssigned(e) => {
                        rm.courier_id = Some(e.courier_id);
                        rm.updated_at = e.occurred_at;
                    }
                    OrderEvent::CourierUnassigned(e) => {
                        rm.courier_id = None;
                        rm.updated_at = e.occurred_at;
                    }
                    OrderEvent::PaymentReceived(e) => {
                        rm.payment = Some(PaymentRecord {
                            provider: e.provider,
                            payment_id: e.payment_id,
                            paid_at: e.occurred_at,
                        });
                        rm.updated_at = e.occurred_at;
                    }
                    OrderEvent::OrderPlaced(_) => {}
                }
                rm
            }),
        };

        match &updated {
            Some(rm) => self.store.upsert(tenant_id, order_id, rm.clone()),
            None => tracing::warn!(%tenant_id, %order_id, seq, "order event for unknown read model skipped"),
        }

        self.update_cursor(tenant_id, aggregate_id, seq);
        Ok(updated)
    }

    /// Drop the tenants' read models and replay `envelopes` in stream order.
    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), OrderProjectionError> {
        let mut envs: Vec<_> = envelopes.into_iter().collect();

        let mut tenants = envs.iter().map(|e| e.tenant_id()).collect::<Vec<_>>();
        tenants.sort_by_key(|t| *t.as_uuid());
        tenants.dedup();
        for t in tenants {
            self.store.clear_tenant(t);
            self.clear_cursors(t);
        }

        envs.sort_by_key(|e| (*e.tenant_id().as_uuid(), *e.aggregate_id().as_uuid(), e.sequence_number()));
        for env in &envs {
            self.apply_envelope(env)?;
        }
        Ok(())
    }
}
