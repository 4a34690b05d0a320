//! Projections (read model builders).
//!
//! Rebuildable from the event store, tenant-isolated and idempotent under
//! at-least-once delivery.

pub mod orders;

pub use orders::{OrderProjectionError, OrderReadModel, OrdersProjection};
