//! Order lifecycle domain module (event-sourced).
//!
//! Business rules for storefront orders as deterministic domain logic (no IO,
//! no HTTP, no storage). The role-gated transition tables live in [`workflow`].

pub mod order;
pub mod status;
pub mod workflow;

pub use order::{
    AssignCourier, ChangeStatus, CourierAssigned, CourierUnassigned, CustomerContact,
    DeliveryAddress, DeliveryWindow, HistoryEntry, ORDER_AGGREGATE_TYPE, Order, OrderCommand,
    OrderEvent, OrderId, OrderLine, OrderPlaced, PaymentReceived, PaymentRecord, PlaceOrder,
    RecordPayment, StatusChanged, order_number,
};
pub use status::{DeliverySlot, OrderKind, OrderStatus, PaymentMethod, PaymentProvider};
pub use workflow::{
    ActorRole, CourierPolicy, OpsPolicy, StatusAction, Tone, TransitionPolicy, TransitionRejected,
    allowed_actions, allowed_statuses, ensure_transition, policy_for,
};
