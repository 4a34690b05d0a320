//! Domain events and their distribution.
//!
//! Aggregates emit typed events; infrastructure persists them as envelopes and
//! fans them out over an [`EventBus`] to projections and notification workers.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Next, Subscription};
pub use envelope::{EventEnvelope, StreamPosition};
pub use event::{Event, TenantScoped};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
