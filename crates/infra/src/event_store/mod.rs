//! Append-only event store boundary.
//!
//! Tenant-scoped event streams without storage assumptions. Only the
//! in-memory backend ships; the trait is the seam for a durable one.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
