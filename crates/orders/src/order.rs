use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use oysters_core::contact::{is_email, is_phone};
use oysters_core::{Aggregate, AggregateId, AggregateRoot, DomainError, Money, TenantId, UserId, ValueObject};
use oysters_events::Event;

use crate::status::{DeliverySlot, OrderKind, OrderStatus, PaymentMethod, PaymentProvider};
use crate::workflow::{ActorRole, ensure_transition};

/// Aggregate type name carried in envelopes.
pub const ORDER_AGGREGATE_TYPE: &str = "orders.order";

const MAX_COMMENT_LEN: usize = 500;
const MAX_NOTE_LEN: usize = 280;
const NOTIFY_BEFORE_HOURS: core::ops::RangeInclusive<u16> = 1..=168;

/// Order identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub AggregateId);

impl OrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Delivery address. Quick orders carry only an optional comment; the
/// operator calls the customer back for the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub house: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub porch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryWindow {
    pub date: NaiveDate,
    pub slot: DeliverySlot,
    /// Narrower `HH:MM-HH:MM` window inside the slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_slot: Option<String>,
}

/// Order line: catalog product snapshot, quantity, unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: String,
    pub name: String,
    #[serde(default)]
    pub unit: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl ValueObject for CustomerContact {}
impl ValueObject for DeliveryAddress {}
impl ValueObject for DeliveryWindow {}
impl ValueObject for OrderLine {}

impl OrderLine {
    pub fn subtotal(&self) -> Result<Money, DomainError> {
        self.unit_price.checked_mul(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub provider: PaymentProvider,
    pub payment_id: String,
    pub paid_at: DateTime<Utc>,
}

/// One row of the order history. The placement row has no `from`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub from: Option<OrderStatus>,
    pub to: OrderStatus,
    pub changed_by: Option<UserId>,
    pub role: Option<ActorRole>,
    pub note: Option<String>,
    pub at: DateTime<Utc>,
}

/// `ORD-<millis>-<nnn>` / `QO-<millis>-<nnn>`.
///
/// The three-digit suffix comes from the random tail of the (UUIDv7) order id,
/// keeping `handle` deterministic.
pub fn order_number(kind: OrderKind, order_id: OrderId, placed_at: DateTime<Utc>) -> String {
    let bytes = order_id.0.as_uuid().as_bytes();
    let suffix = u16::from_be_bytes([bytes[14], bytes[15]]) % 1000;
    format!(
        "{}-{}-{:03}",
        kind.number_prefix(),
        placed_at.timestamp_millis(),
        suffix
    )
}

/// Aggregate root: Order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    tenant_id: Option<TenantId>,
    order_number: String,
    kind: OrderKind,
    status: OrderStatus,
    customer: Option<CustomerContact>,
    address: DeliveryAddress,
    delivery: Option<DeliveryWindow>,
    lines: Vec<OrderLine>,
    total: Money,
    payment_method: PaymentMethod,
    payment: Option<PaymentRecord>,
    courier_id: Option<UserId>,
    notify_before_hours: u16,
    history: Vec<HistoryEntry>,
    version: u64,
    created: bool,
}

impl Order {
    /// Create an empty, not-yet-placed aggregate instance for rehydration.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            tenant_id: None,
            order_number: String::new(),
            kind: OrderKind::Checkout,
            status: OrderStatus::New,
            customer: None,
            address: DeliveryAddress::default(),
            delivery: None,
            lines: Vec::new(),
            total: Money::ZERO,
            payment_method: PaymentMethod::Cash,
            payment: None,
            courier_id: None,
            notify_before_hours: 1,
            history: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn kind(&self) -> OrderKind {
        self.kind
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn customer(&self) -> Option<&CustomerContact> {
        self.customer.as_ref()
    }

    pub fn address(&self) -> &DeliveryAddress {
        &self.address
    }

    pub fn delivery(&self) -> Option<&DeliveryWindow> {
        self.delivery.as_ref()
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn payment(&self) -> Option<&PaymentRecord> {
        self.payment.as_ref()
    }

    pub fn courier_id(&self) -> Option<UserId> {
        self.courier_id
    }

    pub fn notify_before_hours(&self) -> u16 {
        self.notify_before_hours
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn is_placed(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: PlaceOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub kind: OrderKind,
    /// Signed-in storefront user, when there is one.
    pub customer_id: Option<UserId>,
    pub customer: CustomerContact,
    pub address: DeliveryAddress,
    pub delivery: DeliveryWindow,
    pub lines: Vec<OrderLine>,
    pub payment_method: PaymentMethod,
    pub notify_before_hours: Option<u16>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ChangeStatus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStatus {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub changed_by: UserId,
    pub role: ActorRole,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AssignCourier (`None` unassigns).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignCourier {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub courier_id: Option<UserId>,
    pub assigned_by: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordPayment (from a verified provider webhook).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayment {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub provider: PaymentProvider,
    pub payment_id: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    PlaceOrder(PlaceOrder),
    ChangeStatus(ChangeStatus),
    AssignCourier(AssignCourier),
    RecordPayment(RecordPayment),
}

impl OrderCommand {
    pub fn order_id(&self) -> OrderId {
        match self {
            OrderCommand::PlaceOrder(c) => c.order_id,
            OrderCommand::ChangeStatus(c) => c.order_id,
            OrderCommand::AssignCourier(c) => c.order_id,
            OrderCommand::RecordPayment(c) => c.order_id,
        }
    }
}

/// Event: OrderPlaced. Carries the full placement snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub order_number: String,
    pub kind: OrderKind,
    pub customer_id: Option<UserId>,
    pub customer: CustomerContact,
    pub address: DeliveryAddress,
    pub delivery: DeliveryWindow,
    pub lines: Vec<OrderLine>,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub notify_before_hours: u16,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChanged {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub changed_by: UserId,
    pub role: ActorRole,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CourierAssigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourierAssigned {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub courier_id: UserId,
    pub assigned_by: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CourierUnassigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourierUnassigned {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub previous_courier_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentReceived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceived {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub provider: PaymentProvider,
    pub payment_id: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderPlaced(OrderPlaced),
    StatusChanged(StatusChanged),
    CourierAssigned(CourierAssigned),
    CourierUnassigned(CourierUnassigned),
    PaymentReceived(PaymentReceived),
}

impl OrderEvent {
    pub fn order_id(&self) -> OrderId {
        match self {
            OrderEvent::OrderPlaced(e) => e.order_id,
            OrderEvent::StatusChanged(e) => e.order_id,
            OrderEvent::CourierAssigned(e) => e.order_id,
            OrderEvent::CourierUnassigned(e) => e.order_id,
            OrderEvent::PaymentReceived(e) => e.order_id,
        }
    }
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "orders.order.placed",
            OrderEvent::StatusChanged(_) => "orders.order.status_changed",
            OrderEvent::CourierAssigned(_) => "orders.order.courier_assigned",
            OrderEvent::CourierUnassigned(_) => "orders.order.courier_unassigned",
            OrderEvent::PaymentReceived(_) => "orders.order.payment_received",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderPlaced(e) => e.occurred_at,
            OrderEvent::StatusChanged(e) => e.occurred_at,
            OrderEvent::CourierAssigned(e) => e.occurred_at,
            OrderEvent::CourierUnassigned(e) => e.occurred_at,
            OrderEvent::PaymentReceived(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Order {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::OrderPlaced(e) => {
                self.id = e.order_id;
                self.tenant_id = Some(e.tenant_id);
                self.order_number = e.order_number.clone();
                self.kind = e.kind;
                self.status = OrderStatus::New;
                self.customer = Some(e.customer.clone());
                self.address = e.address.clone();
                self.delivery = Some(e.delivery.clone());
                self.lines = e.lines.clone();
                self.total = e.total;
                self.payment_method = e.payment_method;
                self.notify_before_hours = e.notify_before_hours;
                self.history = vec![HistoryEntry {
                    from: None,
                    to: OrderStatus::New,
                    changed_by: e.customer_id,
                    role: None,
                    note: None,
                    at: e.occurred_at,
                }];
                self.created = true;
            }
            OrderEvent::StatusChanged(e) => {
                self.status = e.to;
                self.history.push(HistoryEntry {
                    from: Some(e.from),
                    to: e.to,
                    changed_by: Some(e.changed_by),
                    role: Some(e.role),
                    note: e.note.clone(),
                    at: e.occurred_at,
                });
            }
            OrderEvent::CourierAssigned(e) => {
                self.courier_id = Some(e.courier_id);
            }
            OrderEvent::CourierUnassigned(_) => {
                self.courier_id = None;
            }
            OrderEvent::PaymentReceived(e) => {
                self.payment = Some(PaymentRecord {
                    provider: e.provider,
                    payment_id: e.payment_id.clone(),
                    paid_at: e.occurred_at,
                });
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::PlaceOrder(cmd) => self.handle_place(cmd),
            OrderCommand::ChangeStatus(cmd) => self.handle_change_status(cmd),
            OrderCommand::AssignCourier(cmd) => self.handle_assign_courier(cmd),
            OrderCommand::RecordPayment(cmd) => self.handle_record_payment(cmd),
        }
    }
}

fn is_hourly_slot(value: &str) -> bool {
    let b = value.as_bytes();
    b.len() == 11
        && b[2] == b':'
        && b[5] == b'-'
        && b[8] == b':'
        && [0, 1, 3, 4, 6, 7, 9, 10].iter().all(|&i| b[i].is_ascii_digit())
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

impl Order {
    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_order_id(&self, order_id: OrderId) -> Result<(), DomainError> {
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn ensure_placed(&self, tenant_id: TenantId, order_id: OrderId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(tenant_id)?;
        self.ensure_order_id(order_id)
    }

    fn validate_placement(cmd: &PlaceOrder) -> Result<Money, DomainError> {
        if cmd.lines.is_empty() {
            return Err(DomainError::validation("order needs at least one line"));
        }

        let mut total = Money::ZERO;
        for line in &cmd.lines {
            if blank(&line.product_id) {
                return Err(DomainError::validation("line product_id is required"));
            }
            if line.quantity == 0 {
                return Err(DomainError::validation("quantity must be positive"));
            }
            if line.unit_price == Money::ZERO {
                return Err(DomainError::validation("unit_price must be positive"));
            }
            total = total.checked_add(line.subtotal()?)?;
        }

        if cmd.customer.name.trim().chars().count() < 2 {
            return Err(DomainError::validation("customer name is too short"));
        }
        if !is_phone(&cmd.customer.phone) {
            return Err(DomainError::validation("invalid phone number"));
        }
        if cmd.customer.email.as_deref().is_some_and(|e| !is_email(e.trim())) {
            return Err(DomainError::validation("invalid email"));
        }

        if cmd.kind == OrderKind::Checkout && (blank(&cmd.address.street) || blank(&cmd.address.house)) {
            return Err(DomainError::validation("street and house are required"));
        }
        if cmd
            .address
            .comment
            .as_deref()
            .is_some_and(|c| c.chars().count() > MAX_COMMENT_LEN)
        {
            return Err(DomainError::validation("comment is too long"));
        }

        if cmd
            .notify_before_hours
            .is_some_and(|h| !NOTIFY_BEFORE_HOURS.contains(&h))
        {
            return Err(DomainError::validation("notify_before_hours must be within 1..=168"));
        }
        if cmd.delivery.hourly_slot.as_deref().is_some_and(|s| !is_hourly_slot(s)) {
            return Err(DomainError::validation("hourly_slot must look like HH:MM-HH:MM"));
        }

        Ok(total)
    }

    fn handle_place(&self, cmd: &PlaceOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("order already exists"));
        }
        self.ensure_order_id(cmd.order_id)?;
        let total = Self::validate_placement(cmd)?;

        let customer = CustomerContact {
            name: cmd.customer.name.trim().to_string(),
            phone: cmd.customer.phone.trim().to_string(),
            email: cmd
                .customer
                .email
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
        };

        Ok(vec![OrderEvent::OrderPlaced(OrderPlaced {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            order_number: order_number(cmd.kind, cmd.order_id, cmd.occurred_at),
            kind: cmd.kind,
            customer_id: cmd.customer_id,
            customer,
            address: cmd.address.clone(),
            delivery: cmd.delivery.clone(),
            lines: cmd.lines.clone(),
            total,
            payment_method: cmd.payment_method,
            notify_before_hours: cmd.notify_before_hours.unwrap_or(1),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_change_status(&self, cmd: &ChangeStatus) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_placed(cmd.tenant_id, cmd.order_id)?;

        if cmd.note.as_deref().is_some_and(|n| n.chars().count() > MAX_NOTE_LEN) {
            return Err(DomainError::validation("note is too long"));
        }

        let mut events = Vec::with_capacity(2);
        if cmd.role == ActorRole::Courier {
            match self.courier_id {
                Some(assigned) if assigned != cmd.changed_by => {
                    return Err(DomainError::forbidden("order is assigned to another courier"));
                }
                Some(_) => {}
                None => events.push(OrderEvent::CourierAssigned(CourierAssigned {
                    tenant_id: cmd.tenant_id,
                    order_id: cmd.order_id,
                    courier_id: cmd.changed_by,
                    assigned_by: Some(cmd.changed_by),
                    occurred_at: cmd.occurred_at,
                })),
            }
        }

        ensure_transition(cmd.role, self.status, cmd.status)
            .map_err(|e| DomainError::rejected(e.to_string()))?;

        events.push(OrderEvent::StatusChanged(StatusChanged {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            from: self.status,
            to: cmd.status,
            changed_by: cmd.changed_by,
            role: cmd.role,
            note: cmd
                .note
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            occurred_at: cmd.occurred_at,
        }));
        Ok(events)
    }

    fn handle_assign_courier(&self, cmd: &AssignCourier) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_placed(cmd.tenant_id, cmd.order_id)?;

        if self.courier_id == cmd.courier_id {
            return Ok(Vec::new());
        }
        if self.status.is_terminal() {
            return Err(DomainError::invariant(format!(
                "cannot reassign courier on a {} order",
                self.status
            )));
        }

        let event = match (cmd.courier_id, self.courier_id) {
            (Some(courier_id), _) => OrderEvent::CourierAssigned(CourierAssigned {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                courier_id,
                assigned_by: cmd.assigned_by,
                occurred_at: cmd.occurred_at,
            }),
            (None, Some(previous_courier_id)) => OrderEvent::CourierUnassigned(CourierUnassigned {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                previous_courier_id,
                occurred_at: cmd.occurred_at,
            }),
            (None, None) => return Ok(Vec::new()),
        };
        Ok(vec![event])
    }

    fn handle_record_payment(&self, cmd: &RecordPayment) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_placed(cmd.tenant_id, cmd.order_id)?;

        let payment_id = cmd.payment_id.trim();
        if payment_id.is_empty() {
            return Err(DomainError::validation("payment_id is required"));
        }
        if self.payment_method != PaymentMethod::Online {
            return Err(DomainError::invariant("order is not paid online"));
        }
        match &self.payment {
            Some(existing) if existing.payment_id == payment_id => return Ok(Vec::new()),
            Some(existing) => {
                return Err(DomainError::conflict(format!(
                    "order already paid by {}",
                    existing.payment_id
                )));
            }
            None => {}
        }

        Ok(vec![OrderEvent::PaymentReceived(PaymentReceived {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            provider: cmd.provider,
            payment_id: payment_id.to_string(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_order_id() -> OrderId {
        OrderId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn line(quantity: u32, unit_price: u64) -> OrderLine {
        OrderLine {
            product_id: "oyster-fine-de-claire".to_string(),
            name: "Fine de Claire No.3".to_string(),
            unit: "pcs".to_string(),
            quantity,
            unit_price: Money::from_minor(unit_price),
        }
    }

    fn place_cmd(tenant_id: TenantId, order_id: OrderId) -> PlaceOrder {
        PlaceOrder {
            tenant_id,
            order_id,
            kind: OrderKind::Checkout,
            customer_id: None,
            customer: CustomerContact {
                name: " Anna ".to_string(),
                phone: "+79991234567".to_string(),
                email: Some("anna@example.com".to_string()),
            },
            address: DeliveryAddress {
                street: "Nevsky".to_string(),
                house: "1".to_string(),
                ..Default::default()
            },
            delivery: DeliveryWindow {
                date: NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(),
                slot: DeliverySlot::Evening,
                hourly_slot: Some("18:00-19:00".to_string()),
            },
            lines: vec![line(12, 45_000), line(1, 90_000)],
            payment_method: PaymentMethod::Online,
            notify_before_hours: None,
            occurred_at: test_time(),
        }
    }

    fn placed(tenant_id: TenantId, order_id: OrderId) -> Order {
        let mut order = Order::empty(order_id);
        let events = order
            .handle(&OrderCommand::PlaceOrder(place_cmd(tenant_id, order_id)))
            .unwrap();
        for e in &events {
            order.apply(e);
        }
        order
    }

    fn run(order: &mut Order, cmd: OrderCommand) -> Result<Vec<OrderEvent>, DomainError> {
        let events = order.handle(&cmd)?;
        for e in &events {
            order.apply(e);
        }
        Ok(events)
    }

    fn change(tenant_id: TenantId, order_id: OrderId, status: OrderStatus, by: UserId, role: ActorRole) -> OrderCommand {
        OrderCommand::ChangeStatus(ChangeStatus {
            tenant_id,
            order_id,
            status,
            changed_by: by,
            role,
            note: None,
            occurred_at: test_time(),
        })
    }

    #[test]
    fn place_computes_total_and_number() {
        let tenant_id = TenantId::new();
        let order_id = test_order_id();
        let order = placed(tenant_id, order_id);

        assert!(order.is_placed());
        assert_eq!(order.status(), OrderStatus::New);
        assert_eq!(order.total(), Money::from_minor(12 * 45_000 + 90_000));
        assert!(order.order_number().starts_with("ORD-"));
        assert_eq!(order.customer().unwrap().name, "Anna");
        assert_eq!(order.address().street, "Nevsky");
        assert_eq!(order.delivery().unwrap().slot, DeliverySlot::Evening);
        assert_eq!(order.notify_before_hours(), 1);
        assert_eq!(order.history().len(), 1);
        assert_eq!(order.version(), 1);
    }

    #[test]
    fn order_number_has_millis_and_three_digit_suffix() {
        let at = DateTime::from_timestamp_millis(1_760_000_000_123).unwrap();
        let number = order_number(OrderKind::Quick, test_order_id(), at);
        let parts: Vec<_> = number.split('-').collect();
        assert_eq!(parts[0], "QO");
        assert_eq!(parts[1], "1760000000123");
        assert_eq!(parts[2].len(), 3);
    }

    #[test]
    fn place_rejects_bad_input() {
        let tenant_id = TenantId::new();
        let order_id = test_order_id();
        let order = Order::empty(order_id);

        let mut cmd = place_cmd(tenant_id, order_id);
        cmd.lines.clear();
        assert!(matches!(order.handle(&OrderCommand::PlaceOrder(cmd)), Err(DomainError::Validation(_))));

        let mut cmd = place_cmd(tenant_id, order_id);
        cmd.customer.phone = "12345".to_string();
        assert!(matches!(order.handle(&OrderCommand::PlaceOrder(cmd)), Err(DomainError::Validation(_))));

        let mut cmd = place_cmd(tenant_id, order_id);
        cmd.address.house = "  ".to_string();
        assert!(matches!(order.handle(&OrderCommand::PlaceOrder(cmd)), Err(DomainError::Validation(_))));

        let mut cmd = place_cmd(tenant_id, order_id);
        cmd.notify_before_hours = Some(169);
        assert!(matches!(order.handle(&OrderCommand::PlaceOrder(cmd)), Err(DomainError::Validation(_))));

        let mut cmd = place_cmd(tenant_id, order_id);
        cmd.delivery.hourly_slot = Some("18-19".to_string());
        assert!(matches!(order.handle(&OrderCommand::PlaceOrder(cmd)), Err(DomainError::Validation(_))));

        let mut cmd = place_cmd(tenant_id, order_id);
        cmd.lines[0].unit_price = Money::from_minor(u64::MAX);
        assert!(matches!(order.handle(&OrderCommand::PlaceOrder(cmd)), Err(DomainError::Validation(_))));
    }

    #[test]
    fn quick_order_needs_no_address() {
        let tenant_id = TenantId::new();
        let order_id = test_order_id();
        let mut cmd = place_cmd(tenant_id, order_id);
        cmd.kind = OrderKind::Quick;
        cmd.address = DeliveryAddress::default();

        let events = Order::empty(order_id).handle(&OrderCommand::PlaceOrder(cmd)).unwrap();
        match &events[0] {
            OrderEvent::OrderPlaced(e) => assert!(e.order_number.starts_with("QO-")),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn placing_twice_conflicts() {
        let tenant_id = TenantId::new();
        let order_id = test_order_id();
        let order = placed(tenant_id, order_id);
        let err = order
            .handle(&OrderCommand::PlaceOrder(place_cmd(tenant_id, order_id)))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn ops_walks_the_happy_path_and_courier_delivers() {
        let tenant_id = TenantId::new();
        let order_id = test_order_id();
        let mut order = placed(tenant_id, order_id);
        let staff = UserId::new();
        let courier = UserId::new();

        run(&mut order, change(tenant_id, order_id, OrderStatus::Confirmed, staff, ActorRole::Ops)).unwrap();
        run(&mut order, change(tenant_id, order_id, OrderStatus::Prep, staff, ActorRole::Ops)).unwrap();
        run(
            &mut order,
            OrderCommand::AssignCourier(AssignCourier {
                tenant_id,
                order_id,
                courier_id: Some(courier),
                assigned_by: Some(staff),
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        run(&mut order, change(tenant_id, order_id, OrderStatus::InTransit, staff, ActorRole::Ops)).unwrap();
        run(&mut order, change(tenant_id, order_id, OrderStatus::Delivered, courier, ActorRole::Courier)).unwrap();

        assert_eq!(order.status(), OrderStatus::Delivered);
        let trail: Vec<_> = order.history().iter().map(|h| h.to).collect();
        assert_eq!(
            trail,
            vec![
                OrderStatus::New,
                OrderStatus::Confirmed,
                OrderStatus::Prep,
                OrderStatus::InTransit,
                OrderStatus::Delivered
            ]
        );
        assert_eq!(order.history()[4].role, Some(ActorRole::Courier));
    }

    #[test]
    fn transition_outside_role_table_is_rejected() {
        let tenant_id = TenantId::new();
        let order_id = test_order_id();
        let order = placed(tenant_id, order_id);

        let err = order
            .handle(&change(tenant_id, order_id, OrderStatus::Delivered, UserId::new(), ActorRole::Ops))
            .unwrap_err();
        assert!(matches!(err, DomainError::Rejected(_)));
    }

    #[test]
    fn courier_taking_unassigned_order_is_assigned() {
        let tenant_id = TenantId::new();
        let order_id = test_order_id();
        let mut order = placed(tenant_id, order_id);
        let courier = UserId::new();

        let events = run(&mut order, change(tenant_id, order_id, OrderStatus::Confirmed, courier, ActorRole::Courier)).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], OrderEvent::CourierAssigned(_)));
        assert_eq!(order.courier_id(), Some(courier));
        assert_eq!(order.status(), OrderStatus::Confirmed);
    }

    #[test]
    fn courier_cannot_touch_another_couriers_order() {
        let tenant_id = TenantId::new();
        let order_id = test_order_id();
        let mut order = placed(tenant_id, order_id);
        let owner = UserId::new();
        run(&mut order, change(tenant_id, order_id, OrderStatus::Confirmed, owner, ActorRole::Courier)).unwrap();

        let err = order
            .handle(&change(tenant_id, order_id, OrderStatus::InTransit, UserId::new(), ActorRole::Courier))
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[test]
    fn rejected_courier_transition_does_not_assign() {
        let tenant_id = TenantId::new();
        let order_id = test_order_id();
        let order = placed(tenant_id, order_id);

        let err = order
            .handle(&change(tenant_id, order_id, OrderStatus::Delivered, UserId::new(), ActorRole::Courier))
            .unwrap_err();
        assert!(matches!(err, DomainError::Rejected(_)));
        assert_eq!(order.courier_id(), None);
    }

    #[test]
    fn assign_courier_is_noop_when_unchanged_and_blocked_when_terminal() {
        let tenant_id = TenantId::new();
        let order_id = test_order_id();
        let mut order = placed(tenant_id, order_id);
        let assign = |courier_id| {
            OrderCommand::AssignCourier(AssignCourier {
                tenant_id,
                order_id,
                courier_id,
                assigned_by: None,
                occurred_at: test_time(),
            })
        };

        assert!(run(&mut order, assign(None)).unwrap().is_empty());
        let courier = UserId::new();
        assert_eq!(run(&mut order, assign(Some(courier))).unwrap().len(), 1);
        assert!(run(&mut order, assign(Some(courier))).unwrap().is_empty());
        assert!(matches!(
            run(&mut order, assign(None)).unwrap()[0],
            OrderEvent::CourierUnassigned(_)
        ));

        run(&mut order, change(tenant_id, order_id, OrderStatus::Confirmed, UserId::new(), ActorRole::Ops)).unwrap();
        run(&mut order, change(tenant_id, order_id, OrderStatus::Cancelled, UserId::new(), ActorRole::Ops)).unwrap();
        assert!(matches!(
            order.handle(&assign(Some(courier))),
            Err(DomainError::InvariantViolation(_))
        ));
    }

    #[test]
    fn record_payment_is_idempotent_per_payment_id() {
        let tenant_id = TenantId::new();
        let order_id = test_order_id();
        let mut order = placed(tenant_id, order_id);
        let pay = |payment_id: &str| {
            OrderCommand::RecordPayment(RecordPayment {
                tenant_id,
                order_id,
                provider: PaymentProvider::CloudPayments,
                payment_id: payment_id.to_string(),
                occurred_at: test_time(),
            })
        };

        assert_eq!(run(&mut order, pay("tx-1")).unwrap().len(), 1);
        assert_eq!(order.payment().unwrap().payment_id, "tx-1");
        assert!(run(&mut order, pay("tx-1")).unwrap().is_empty());
        assert!(matches!(run(&mut order, pay("tx-2")), Err(DomainError::Conflict(_))));
        assert_eq!(order.status(), OrderStatus::New);
    }

    #[test]
    fn cash_orders_do_not_take_online_payments() {
        let tenant_id = TenantId::new();
        let order_id = test_order_id();
        let mut cmd = place_cmd(tenant_id, order_id);
        cmd.payment_method = PaymentMethod::Cash;
        let mut order = Order::empty(order_id);
        run(&mut order, OrderCommand::PlaceOrder(cmd)).unwrap();

        let err = order
            .handle(&OrderCommand::RecordPayment(RecordPayment {
                tenant_id,
                order_id,
                provider: PaymentProvider::YooKassa,
                payment_id: "pay-1".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn commands_on_missing_order_are_not_found() {
        let order_id = test_order_id();
        let err = Order::empty(order_id)
            .handle(&change(TenantId::new(), order_id, OrderStatus::Confirmed, UserId::new(), ActorRole::Ops))
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn other_tenant_cannot_change_order() {
        let order_id = test_order_id();
        let order = placed(TenantId::new(), order_id);
        let err = order
            .handle(&change(TenantId::new(), order_id, OrderStatus::Confirmed, UserId::new(), ActorRole::Ops))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn events_serialize_with_wire_names() {
        let tenant_id = TenantId::new();
        let order_id = test_order_id();
        let events = Order::empty(order_id)
            .handle(&OrderCommand::PlaceOrder(place_cmd(tenant_id, order_id)))
            .unwrap();
        assert_eq!(events[0].event_type(), "orders.order.placed");
        let json = serde_json::to_value(&events[0]).unwrap();
        assert_eq!(json["OrderPlaced"]["delivery"]["slot"], "EVENING");
        assert_eq!(json["OrderPlaced"]["payment_method"], "ONLINE");
    }
}
