use chrono::{DateTime, Utc};

use oysters_core::TenantId;

use crate::EventEnvelope;

/// A fact an aggregate decided. Never edited after it is committed.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// `<context>.<aggregate>.<fact>`, e.g. `orders.order.payment_received`.
    fn event_type(&self) -> &'static str;

    /// Payload schema version; bump on incompatible changes.
    fn version(&self) -> u32;

    /// When it happened in the business, not when it was stored.
    fn occurred_at(&self) -> DateTime<Utc>;
}

/// Messages owned by exactly one tenant. Workers pinned to a tenant skip the rest.
pub trait TenantScoped {
    fn tenant_id(&self) -> TenantId;
}

impl<E> TenantScoped for EventEnvelope<E> {
    fn tenant_id(&self) -> TenantId {
        EventEnvelope::tenant_id(self)
    }
}
