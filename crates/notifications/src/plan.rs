//! Which messages an order event fans out to.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use oysters_core::{Money, UserId};
use oysters_orders::{DeliverySlot, OrderId, OrderStatus};

use crate::settings::NotificationSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Sms,
    Email,
    Telegram,
    Push,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Sms => "sms",
            Channel::Email => "email",
            Channel::Telegram => "telegram",
            Channel::Push => "push",
        }
    }

    pub fn is_configured(self, settings: &NotificationSettings) -> bool {
        match self {
            Channel::Sms => settings.sms.is_some(),
            Channel::Email => settings.email.is_some(),
            Channel::Telegram => settings.telegram.is_some(),
            Channel::Push => settings.push.is_some(),
        }
    }
}

impl core::fmt::Display for Channel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Recipient {
    Phone(String),
    Email(String),
    /// The configured Telegram alert chat.
    AlertChat,
    /// Every active staff member.
    Staff,
    /// A back-office user reached through their own contact details.
    User(UserId),
}

/// One message to hand to a [`crate::Notifier`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub order_id: OrderId,
    pub channel: Channel,
    pub recipient: Recipient,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub body: String,
}

/// The order facts messages are rendered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderNotice {
    pub order_id: OrderId,
    pub order_number: String,
    pub status: OrderStatus,
    pub total: Money,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub courier_id: Option<UserId>,
    pub delivery_date: NaiveDate,
    pub slot: DeliverySlot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Placed,
    StatusChanged { to: OrderStatus },
    Reminder { hours: u16 },
}

struct Builder<'a> {
    notice: &'a OrderNotice,
    out: Vec<Delivery>,
}

impl Builder<'_> {
    fn push(&mut self, channel: Channel, recipient: Recipient, subject: Option<String>, body: String) {
        self.out.push(Delivery {
            order_id: self.notice.order_id,
            channel,
            recipient,
            subject,
            body,
        });
    }

    fn customer(&mut self, sms: String, subject: String, email_body: String) {
        self.push(
            Channel::Sms,
            Recipient::Phone(self.notice.customer_phone.clone()),
            None,
            sms,
        );
        if let Some(email) = self.notice.customer_email.clone() {
            self.push(Channel::Email, Recipient::Email(email), Some(subject), email_body);
        }
    }
}

fn summary(n: &OrderNotice) -> String {
    format!(
        "Order {}\nTotal: {}\nStatus: {}",
        n.order_number,
        n.total,
        n.status.label()
    )
}

/// Plan deliveries for `trigger`. Channels are not filtered here; callers
/// drop the ones that are not configured.
pub fn plan(trigger: Trigger, notice: &OrderNotice) -> Vec<Delivery> {
    let mut b = Builder {
        notice,
        out: Vec::new(),
    };
    let number = &notice.order_number;

    match trigger {
        Trigger::Placed => {
            b.push(
                Channel::Telegram,
                Recipient::AlertChat,
                None,
                format!("New order {number}\nStatus: {}\nTotal: {}", notice.status, notice.total),
            );
            b.push(
                Channel::Push,
                Recipient::Staff,
                Some("New order".to_string()),
                format!(
                    "New order {number} for {}, {}",
                    notice.delivery_date.format("%d.%m.%Y"),
                    notice.slot.label()
                ),
            );
            b.customer(
                format!("Your order {number} has been received. We will call you to confirm."),
                format!("Order {number} received"),
                format!("Thank you for your order!\n\n{}", summary(notice)),
            );
        }
        Trigger::StatusChanged { to } => {
            b.push(
                Channel::Telegram,
                Recipient::AlertChat,
                None,
                format!("Order {number} update: {to}"),
            );
            b.customer(
                format!("Order {number} status: {}", to.label()),
                format!("Order {number} status"),
                format!("Status updated: {}\n\n{}", to.label(), summary(notice)),
            );
            if let (OrderStatus::Prep | OrderStatus::InTransit, Some(courier)) = (to, notice.courier_id) {
                let text = format!("Order {number} is {}, {}", to.label().to_lowercase(), notice.slot.label());
                b.push(Channel::Push, Recipient::User(courier), Some("Delivery".to_string()), text.clone());
                b.push(Channel::Sms, Recipient::User(courier), None, text);
            }
            if to == OrderStatus::Prep {
                b.push(
                    Channel::Push,
                    Recipient::Staff,
                    Some("Start packing".to_string()),
                    format!("Order {number} moved to preparation"),
                );
            }
        }
        Trigger::Reminder { hours } => {
            let when = format!(
                "{} {}",
                notice.delivery_date.format("%d.%m.%Y"),
                notice.slot.label()
            );
            b.customer(
                format!("Reminder: order {number} arrives in about {hours} h ({when})."),
                format!("Order {number} delivery reminder"),
                format!("Your order arrives in about {hours} h ({when}).\n\n{}", summary(notice)),
            );
        }
    }

    b.out
}
