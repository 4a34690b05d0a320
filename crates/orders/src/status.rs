use core::str::FromStr;

use serde::{Deserialize, Serialize};

use oysters_core::DomainError;

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    Confirmed,
    Prep,
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::New,
        OrderStatus::Confirmed,
        OrderStatus::Prep,
        OrderStatus::InTransit,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Wire name (`"IN_TRANSIT"`).
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Prep => "PREP",
            OrderStatus::InTransit => "IN_TRANSIT",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::New => "New",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Prep => "Preparing",
            OrderStatus::InTransit => "In transit",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Statuses a courier still has work on.
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::validation(format!("unknown order status '{s}'")))
    }
}

/// Delivery time window of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliverySlot {
    Morning,
    #[default]
    Day,
    Evening,
}

impl DeliverySlot {
    pub const ALL: [DeliverySlot; 3] = [DeliverySlot::Morning, DeliverySlot::Day, DeliverySlot::Evening];

    /// Hour (local delivery time) the window opens.
    pub fn start_hour(self) -> u32 {
        match self {
            DeliverySlot::Morning => 8,
            DeliverySlot::Day => 12,
            DeliverySlot::Evening => 17,
        }
    }

    pub fn end_hour(self) -> u32 {
        match self {
            DeliverySlot::Morning => 12,
            DeliverySlot::Day => 17,
            DeliverySlot::Evening => 22,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DeliverySlot::Morning => "Morning 08:00-12:00",
            DeliverySlot::Day => "Day 12:00-17:00",
            DeliverySlot::Evening => "Evening 17:00-22:00",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Online,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentProvider {
    #[serde(rename = "cloudpayments")]
    CloudPayments,
    #[serde(rename = "yookassa")]
    YooKassa,
}

impl PaymentProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentProvider::CloudPayments => "cloudpayments",
            PaymentProvider::YooKassa => "yookassa",
        }
    }
}

impl core::fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the order came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    /// Full cart checkout with a delivery address.
    Checkout,
    /// One-product call-back order from the storefront.
    Quick,
}

impl OrderKind {
    pub fn number_prefix(self) -> &'static str {
        match self {
            OrderKind::Checkout => "ORD",
            OrderKind::Quick => "QO",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names_match_serde() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn only_delivered_and_cancelled_are_terminal() {
        let terminal: Vec<_> = OrderStatus::ALL.into_iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(terminal, vec![OrderStatus::Delivered, OrderStatus::Cancelled]);
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        assert!(matches!("SHIPPED".parse::<OrderStatus>(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn slots_do_not_overlap() {
        for pair in DeliverySlot::ALL.windows(2) {
            assert_eq!(pair[0].end_hour(), pair[1].start_hour());
        }
    }
}
