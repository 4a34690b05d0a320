//! Infrastructure layer: event store, dispatch, read models, workers, config.
//!
//! Everything runs in-process: the event store and read model stores are
//! in-memory and the bus fans out over std channels.

pub mod command_dispatcher;
pub mod config;
pub mod event_store;
pub mod notification_config;
pub mod operations;
pub mod projections;
pub mod read_model;
pub mod workers;
