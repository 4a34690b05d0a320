//! Role-gated order status workflow.
//!
//! Each acting role has its own transition table. Couriers drive the delivery
//! leg; ops (admin and staff) confirm, prepare, hand over and cancel. Anything
//! outside a role's table is rejected before an event is emitted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::status::OrderStatus;

/// Role a status change is performed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Courier,
    /// Admin or staff.
    Ops,
}

impl core::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ActorRole::Courier => f.write_str("courier"),
            ActorRole::Ops => f.write_str("ops"),
        }
    }
}

/// Visual weight of an action button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Primary,
    Success,
    Danger,
}

/// One allowed next step from a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusAction {
    pub status: OrderStatus,
    pub label: &'static str,
    pub tone: Tone,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

const fn action(status: OrderStatus, label: &'static str, tone: Tone) -> StatusAction {
    StatusAction {
        status,
        label,
        tone,
        hint: None,
    }
}

const fn hinted(status: OrderStatus, label: &'static str, tone: Tone, hint: &'static str) -> StatusAction {
    StatusAction {
        status,
        label,
        tone,
        hint: Some(hint),
    }
}

/// A role-scoped transition table.
pub trait TransitionPolicy: Send + Sync {
    fn role(&self) -> ActorRole;

    /// Allowed next actions from `from`. Empty for statuses without rows.
    fn actions(&self, from: OrderStatus) -> &'static [StatusAction];

    fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        self.actions(from).iter().any(|a| a.status == to)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CourierPolicy;

#[derive(Debug, Clone, Copy, Default)]
pub struct OpsPolicy;

const COURIER_FROM_NEW: &[StatusAction] = &[
    action(OrderStatus::Confirmed, "Accept order", Tone::Primary),
    action(OrderStatus::Prep, "Start packing", Tone::Primary),
];
const COURIER_FROM_CONFIRMED: &[StatusAction] = &[hinted(
    OrderStatus::InTransit,
    "Picked up, on my way",
    Tone::Primary,
    "Moves the order into delivery",
)];
const COURIER_FROM_PREP: &[StatusAction] =
    &[action(OrderStatus::InTransit, "Handed over, in transit", Tone::Primary)];
const COURIER_FROM_IN_TRANSIT: &[StatusAction] = &[
    action(OrderStatus::Delivered, "Delivered", Tone::Success),
    hinted(OrderStatus::Cancelled, "Cancel", Tone::Danger, "Contact the dispatcher first"),
];

const OPS_FROM_NEW: &[StatusAction] = &[
    action(OrderStatus::Confirmed, "Confirm", Tone::Primary),
    action(OrderStatus::Prep, "Start work", Tone::Primary),
];
const OPS_FROM_CONFIRMED: &[StatusAction] = &[
    action(OrderStatus::Prep, "Packing", Tone::Primary),
    action(OrderStatus::Cancelled, "Cancel", Tone::Danger),
];
const OPS_FROM_PREP: &[StatusAction] = &[
    action(OrderStatus::InTransit, "Handed to courier", Tone::Success),
    action(OrderStatus::Cancelled, "Cancel", Tone::Danger),
];

impl TransitionPolicy for CourierPolicy {
    fn role(&self) -> ActorRole {
        ActorRole::Courier
    }

    fn actions(&self, from: OrderStatus) -> &'static [StatusAction] {
        match from {
            OrderStatus::New => COURIER_FROM_NEW,
            OrderStatus::Confirmed => COURIER_FROM_CONFIRMED,
            OrderStatus::Prep => COURIER_FROM_PREP,
            OrderStatus::InTransit => COURIER_FROM_IN_TRANSIT,
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }
}

impl TransitionPolicy for OpsPolicy {
    fn role(&self) -> ActorRole {
        ActorRole::Ops
    }

    fn actions(&self, from: OrderStatus) -> &'static [StatusAction] {
        match from {
            OrderStatus::New => OPS_FROM_NEW,
            OrderStatus::Confirmed => OPS_FROM_CONFIRMED,
            OrderStatus::Prep => OPS_FROM_PREP,
            OrderStatus::InTransit | OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }
}

pub fn policy_for(role: ActorRole) -> &'static dyn TransitionPolicy {
    match role {
        ActorRole::Courier => &CourierPolicy,
        ActorRole::Ops => &OpsPolicy,
    }
}

pub fn allowed_actions(role: ActorRole, status: OrderStatus) -> &'static [StatusAction] {
    policy_for(role).actions(status)
}

pub fn allowed_statuses(role: ActorRole, status: OrderStatus) -> Vec<OrderStatus> {
    allowed_actions(role, status).iter().map(|a| a.status).collect()
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{role} may not move an order from {from} to {to}")]
pub struct TransitionRejected {
    pub role: ActorRole,
    pub from: OrderStatus,
    pub to: OrderStatus,
}

pub fn ensure_transition(
    role: ActorRole,
    from: OrderStatus,
    to: OrderStatus,
) -> Result<(), TransitionRejected> {
    if policy_for(role).allows(from, to) {
        Ok(())
    } else {
        Err(TransitionRejected { role, from, to })
    }
}
