//! Background workers fed by the event bus.

pub mod notification_worker;
pub mod projection_worker;

pub use notification_worker::{DeliveryReport, NotificationDispatcher, ReminderReport};
pub use projection_worker::{ProjectionWorker, WorkerHandle};
