use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as JsonValue;

use oysters_core::TenantId;
use oysters_notifications::{Delivery, Notifier, NotifyError, OrderNotice, Trigger, plan};
use oysters_orders::OrderEvent;

use crate::notification_config::NotificationConfigService;
use crate::projections::OrderReadModel;
use crate::read_model::TenantStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DeliveryReport {
    pub sent: usize,
    /// Planned for a channel that has no settings.
    pub skipped: usize,
    pub failed: usize,
}

impl DeliveryReport {
    fn absorb(&mut self, other: DeliveryReport) {
        self.sent += other.sent;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Per-order outcome counts of one reminder run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReminderReport {
    pub total: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
    pub deliveries: DeliveryReport,
}

/// Turns committed order events into deliveries on the configured channels.
pub struct NotificationDispatcher<S>
where
    S: TenantStore<String, JsonValue>,
{
    config: Arc<NotificationConfigService<S>>,
    notifier: Arc<dyn Notifier>,
}

impl<S> NotificationDispatcher<S>
where
    S: TenantStore<String, JsonValue>,
{
    pub fn new(config: Arc<NotificationConfigService<S>>, notifier: Arc<dyn Notifier>) -> Self {
        Self { config, notifier }
    }

    /// React to one order event, given the read model it produced.
    pub fn on_order_event(&self, tenant_id: TenantId, event: &OrderEvent, order: &OrderReadModel) -> DeliveryReport {
        let trigger = match event {
            OrderEvent::OrderPlaced(_) => Trigger::Placed,
            OrderEvent::StatusChanged(e) => Trigger::StatusChanged { to: e.to },
            OrderEvent::CourierAssigned(_) | OrderEvent::CourierUnassigned(_) | OrderEvent::PaymentReceived(_) => {
                return DeliveryReport::default();
            }
        };
        self.deliver(tenant_id, trigger, &order.notice())
    }

    /// Send delivery reminders for the given (already selected) orders.
    pub fn send_reminders(&self, tenant_id: TenantId, orders: &[OrderReadModel], hours: u16) -> ReminderReport {
        let mut report = ReminderReport {
            total: orders.len(),
            ..Default::default()
        };
        for order in orders {
            let r = self.deliver(tenant_id, Trigger::Reminder { hours }, &order.notice());
            if r.sent > 0 {
                report.sent += 1;
            } else if r.failed > 0 {
                report.failed += 1;
            } else {
                report.skipped += 1;
            }
            report.deliveries.absorb(r);
        }
        tracing::info!(
            %tenant_id,
            hours,
            total = report.total,
            sent = report.sent,
            skipped = report.skipped,
            failed = report.failed,
            "delivery reminders processed"
        );
        report
    }

    fn deliver(&self, tenant_id: TenantId, trigger: Trigger, notice: &OrderNotice) -> DeliveryReport {
        let settings = self.config.load(tenant_id, false);
        let mut report = DeliveryReport::default();

        for delivery in plan(trigger, notice) {
            if !delivery.channel.is_configured(&settings) {
                tracing::warn!(
                    order_id = %delivery.order_id,
                    channel = %delivery.channel,
                    "notification channel not configured; skipping"
                );
                report.skipped += 1;
                continue;
            }
            match self.notifier.send(&delivery, &settings) {
                Ok(()) => report.sent += 1,
                Err(NotifyError::NotConfigured(channel)) => {
                    tracing::warn!(order_id = %delivery.order_id, channel, "notifier reports channel not configured");
                    report.skipped += 1;
                }
                Err(err) => {
                    log_failure(&delivery, &err);
                    report.failed += 1;
                }
            }
        }
        report
    }
}

fn log_failure(delivery: &Delivery, err: &NotifyError) {
    tracing::error!(
        order_id = %delivery.order_id,
        channel = %delivery.channel,
        error = %err,
        "notification delivery failed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use oysters_core::UserId;
    use oysters_notifications::{Channel, EnvChannels, NotificationSettings, OutboxNotifier};
    use oysters_orders::{DeliverySlot, OrderStatus, StatusChanged};

    use crate::operations::dashboard::fixtures::order;
    use crate::read_model::InMemoryTenantStore;

    struct Failing;

    impl Notifier for Failing {
        fn send(&self, _: &Delivery, _: &NotificationSettings) -> Result<(), NotifyError> {
            Err(NotifyError::Transport("gateway down".to_string()))
        }
    }

    fn config(env: EnvChannels) -> Arc<NotificationConfigService<InMemoryTenantStore<String, JsonValue>>> {
        Arc::new(NotificationConfigService::new(InMemoryTenantStore::new(), env))
    }

    fn sms_only() -> EnvChannels {
        EnvChannels {
            sms_api_key: Some("sms-key-123".to_string()),
            ..Default::default()
        }
    }

    fn status_changed(rm: &OrderReadModel, to: OrderStatus) -> OrderEvent {
        OrderEvent::StatusChanged(StatusChanged {
            tenant_id: TenantId::new(),
            order_id: rm.id,
            from: rm.status,
            to,
            changed_by: UserId::new(),
            role: oysters_orders::ActorRole::Ops,
            note: None,
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn unconfigured_channels_are_skipped() {
        let outbox = Arc::new(OutboxNotifier::default());
        let dispatcher = NotificationDispatcher::new(config(sms_only()), outbox.clone());
        let rm = order(
            "ORD-1",
            OrderStatus::Confirmed,
            NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(),
            DeliverySlot::Day,
            Utc::now(),
        );

        let report = dispatcher.on_order_event(TenantId::new(), &status_changed(&rm, OrderStatus::Confirmed), &rm);

        // Telegram alert and customer email have no settings.
        assert_eq!(report, DeliveryReport { sent: 1, skipped: 2, failed: 0 });
        let sent = outbox.recent(10);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].delivery.channel, Channel::Sms);
    }

    #[test]
    fn courier_assignment_sends_nothing() {
        let outbox = Arc::new(OutboxNotifier::default());
        let dispatcher = NotificationDispatcher::new(config(sms_only()), outbox.clone());
        let rm = order(
            "ORD-2",
            OrderStatus::New,
            NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(),
            DeliverySlot::Day,
            Utc::now(),
        );
        let event = OrderEvent::CourierUnassigned(oysters_orders::CourierUnassigned {
            tenant_id: TenantId::new(),
            order_id: rm.id,
            previous_courier_id: UserId::new(),
            occurred_at: Utc::now(),
        });
        assert_eq!(dispatcher.on_order_event(TenantId::new(), &event, &rm), DeliveryReport::default());
        assert!(outbox.is_empty());
    }

    #[test]
    fn reminder_report_counts_orders() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        let orders = vec![
            order("A", OrderStatus::Confirmed, date, DeliverySlot::Day, Utc::now()),
            order("B", OrderStatus::Prep, date, DeliverySlot::Day, Utc::now()),
        ];

        let ok = NotificationDispatcher::new(config(sms_only()), Arc::new(OutboxNotifier::default()));
        let report = ok.send_reminders(TenantId::new(), &orders, 2);
        assert_eq!((report.total, report.sent, report.skipped, report.failed), (2, 2, 0, 0));

        let none = NotificationDispatcher::new(config(EnvChannels::default()), Arc::new(OutboxNotifier::default()));
        let report = none.send_reminders(TenantId::new(), &orders, 2);
        assert_eq!((report.sent, report.skipped), (0, 2));

        let failing = NotificationDispatcher::new(config(sms_only()), Arc::new(Failing));
        let report = failing.send_reminders(TenantId::new(), &orders, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(report.deliveries.skipped, 2);
    }
}
