use std::{
    convert::Infallible,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value as JsonValue;
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

use oysters_core::TenantId;
use oysters_events::{EventEnvelope, InMemoryEventBus};
use oysters_infra::{
    command_dispatcher::{CommandDispatcher, DispatchError},
    config::AppConfig,
    event_store::{InMemoryEventStore, StoredEvent},
    notification_config::NotificationConfigService,
    operations::local_date,
    projections::{OrderReadModel, OrdersProjection},
    read_model::InMemoryTenantStore,
    workers::{NotificationDispatcher, ProjectionWorker, WorkerHandle},
};
use oysters_notifications::{FanoutNotifier, LoggingNotifier, Notifier, OutboxNotifier};
use oysters_orders::{ORDER_AGGREGATE_TYPE, Order, OrderCommand, OrderEvent, OrderId};

type Envelope = EventEnvelope<JsonValue>;
pub type Dispatcher = CommandDispatcher<Arc<InMemoryEventStore>, Arc<InMemoryEventBus<Envelope>>>;
pub type OrdersStore = Arc<InMemoryTenantStore<OrderId, OrderReadModel>>;
pub type SettingsStore = Arc<InMemoryTenantStore<String, JsonValue>>;

/// Realtime message broadcast over SSE.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RealtimeMessage {
    pub tenant_id: TenantId,
    pub topic: String,
    pub payload: JsonValue,
}

pub struct AppServices {
    config: AppConfig,
    dispatcher: Arc<Dispatcher>,
    orders: Arc<OrdersProjection<OrdersStore>>,
    notification_config: Arc<NotificationConfigService<SettingsStore>>,
    notifications: Arc<NotificationDispatcher<SettingsStore>>,
    outbox: Arc<OutboxNotifier>,
    realtime_tx: broadcast::Sender<RealtimeMessage>,
    worker: Mutex<Option<WorkerHandle>>,
}

/// In-memory wiring: store + bus, then one worker that feeds the order
/// projection and fans the result out to notifications and SSE.
pub fn build_services(config: AppConfig) -> std::io::Result<AppServices> {
    let store = Arc::new(InMemoryEventStore::new());
    let bus: Arc<InMemoryEventBus<Envelope>> = Arc::new(InMemoryEventBus::new());
    let dispatcher = Arc::new(CommandDispatcher::new(store, bus.clone()));

    let orders_store: OrdersStore = Arc::new(InMemoryTenantStore::new());
    let orders = Arc::new(OrdersProjection::new(orders_store));

    let settings_store: SettingsStore = Arc::new(InMemoryTenantStore::new());
    let notification_config = Arc::new(NotificationConfigService::new(
        settings_store,
        config.notifications.clone(),
    ));

    let outbox = Arc::new(OutboxNotifier::default());
    let notifier: Arc<dyn Notifier> = Arc::new(FanoutNotifier::new(vec![Arc::new(LoggingNotifier), outbox.clone()]));
    let notifications = Arc::new(NotificationDispatcher::new(notification_config.clone(), notifier));

    // Realtime channel (SSE): lossy broadcast, tenant-filtered in handlers.
    let (realtime_tx, _realtime_rx) = broadcast::channel::<RealtimeMessage>(256);

    let worker = {
        let orders = orders.clone();
        let notifications = notifications.clone();
        let realtime_tx = realtime_tx.clone();
        ProjectionWorker::spawn("orders.pipeline", &bus, None, move |env: Envelope| {
            on_envelope(&orders, &notifications, &realtime_tx, &env)
        })?
    };

    Ok(AppServices {
        config,
        dispatcher,
        orders,
        notification_config,
        notifications,
        outbox,
        realtime_tx,
        worker: Mutex::new(Some(worker)),
    })
}

fn on_envelope(
    orders: &OrdersProjection<OrdersStore>,
    notifications: &NotificationDispatcher<SettingsStore>,
    realtime_tx: &broadcast::Sender<RealtimeMessage>,
    env: &Envelope,
) -> Result<(), String> {
    if env.aggregate_type() != ORDER_AGGREGATE_TYPE {
        return Ok(());
    }
    let Some(updated) = orders.apply_envelope(env).map_err(|e| e.to_string())? else {
        return Ok(());
    };

    let event: OrderEvent = serde_json::from_value(env.payload().clone()).map_err(|e| e.to_string())?;
    let report = notifications.on_order_event(env.tenant_id(), &event, &updated);
    tracing::debug!(
        order_id = %updated.id,
        event_type = env.event_type(),
        status = %updated.status,
        sent = report.sent,
        skipped = report.skipped,
        failed = report.failed,
        "order event processed"
    );

    // Lossy; nobody listening is fine.
    let _ = realtime_tx.send(RealtimeMessage {
        tenant_id: env.tenant_id(),
        topic: format!("{ORDER_AGGREGATE_TYPE}.projection_updated"),
        payload: serde_json::json!({
            "kind": "projection_update",
            "aggregate_type": ORDER_AGGREGATE_TYPE,
            "aggregate_id": env.aggregate_id().to_string(),
            "sequence_number": env.sequence_number(),
            "event_type": env.event_type(),
            "order_number": updated.order_number,
            "status": updated.status,
            "courier_id": updated.courier_id,
        }),
    });
    Ok(())
}

impl AppServices {
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn storefront_tenant(&self) -> TenantId {
        self.config.storefront_tenant_id
    }

    /// Calendar date in the delivery time zone.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        local_date(now, self.config.delivery_offset)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn dispatch_order(&self, tenant_id: TenantId, command: OrderCommand) -> Result<Vec<StoredEvent>, DispatchError> {
        self.dispatcher.dispatch_order(tenant_id, command)
    }

    pub fn load_order(&self, tenant_id: TenantId, order_id: OrderId) -> Result<Order, DispatchError> {
        self.dispatcher.load_order(tenant_id, order_id)
    }

    pub fn orders_get(&self, tenant_id: TenantId, order_id: &OrderId) -> Option<OrderReadModel> {
        self.orders.get(tenant_id, order_id)
    }

    pub fn orders_list(&self, tenant_id: TenantId) -> Vec<OrderReadModel> {
        self.orders.list(tenant_id)
    }

    pub fn notification_config(&self) -> &NotificationConfigService<SettingsStore> {
        &self.notification_config
    }

    pub fn notifications(&self) -> &NotificationDispatcher<SettingsStore> {
        &self.notifications
    }

    pub fn outbox(&self) -> &OutboxNotifier {
        &self.outbox
    }

    pub fn realtime_tx(&self) -> &broadcast::Sender<RealtimeMessage> {
        &self.realtime_tx
    }

    /// Stop the background worker. Later calls do nothing.
    pub fn shutdown(&self) {
        let handle = self.worker.lock().ok().and_then(|mut w| w.take());
        if let Some(handle) = handle {
            tracing::info!(worker = handle.name(), "stopping worker");
            handle.shutdown();
        }
    }
}

pub fn tenant_sse_stream(
    services: Arc<AppServices>,
    tenant_id: TenantId,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.realtime_tx().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |msg| match msg {
        Ok(m) if m.tenant_id == tenant_id => {
            let data = serde_json::to_string(&m.payload).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default().event(m.topic).data(data)))
        }
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
