use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use oysters_core::{DomainError, UserId};
use oysters_orders::OrderStatus;

use crate::projections::OrderReadModel;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Admin listing filters. Every field is optional and they combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub courier_id: Option<UserId>,
    /// Case-insensitive match on order number and customer contact fields.
    pub search: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl OrderFilter {
    fn matches(&self, order: &OrderReadModel, needle: Option<&str>) -> bool {
        if self.status.is_some_and(|s| s != order.status) {
            return false;
        }
        if self.courier_id.is_some() && self.courier_id != order.courier_id {
            return false;
        }
        if self.created_from.is_some_and(|from| order.created_at < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| order.created_at > to) {
            return false;
        }
        match needle {
            None => true,
            Some(needle) => {
                let hit = |value: &str| value.to_lowercase().contains(needle);
                hit(&order.order_number)
                    || hit(&order.customer.name)
                    || hit(&order.customer.phone)
                    || order.customer.email.as_deref().is_some_and(hit)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    limit: u32,
}

impl Pagination {
    /// `page` starts at 1; `limit` must be within `1..=100`.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self, DomainError> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if page == 0 {
            return Err(DomainError::validation("page must be at least 1"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(DomainError::validation(format!("limit must be within 1..={MAX_PAGE_SIZE}")));
        }
        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListPage {
    pub orders: Vec<OrderReadModel>,
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    /// Never below 1, even for an empty result.
    pub pages: u32,
}

/// Filter, sort newest first, and cut one page.
pub fn list_orders(orders: Vec<OrderReadModel>, filter: &OrderFilter, pagination: Pagination) -> ListPage {
    let needle = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut matched: Vec<_> = orders
        .into_iter()
        .filter(|o| filter.matches(o, needle.as_deref()))
        .collect();
    matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let total = matched.len();
    let limit = pagination.limit as usize;
    let pages = total.div_ceil(limit).max(1) as u32;
    let skip = (pagination.page as usize - 1).saturating_mul(limit);

    ListPage {
        orders: matched.into_iter().skip(skip).take(limit).collect(),
        page: pagination.page,
        limit: pagination.limit,
        total,
        pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::dashboard::fixtures::{order, with_courier};
    use chrono::{Duration, NaiveDate, TimeZone};
    use oysters_orders::DeliverySlot;

    fn sample() -> Vec<OrderReadModel> {
        let base = Utc.with_ymd_and_hms(2026, 10, 1, 10, 0, 0).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 2).unwrap();
        (0..25)
            .map(|i| {
                let status = if i % 5 == 0 { OrderStatus::Delivered } else { OrderStatus::New };
                order(&format!("ORD-{i:03}"), status, date, DeliverySlot::Day, base + Duration::hours(i))
            })
            .collect()
    }

    #[test]
    fn pages_newest_first() {
        let page = list_orders(sample(), &OrderFilter::default(), Pagination::default());
        assert_eq!(page.total, 25);
        assert_eq!(page.pages, 2);
        assert_eq!(page.orders.len(), 20);
        assert_eq!(page.orders[0].order_number, "ORD-024");

        let second = list_orders(sample(), &OrderFilter::default(), Pagination::new(Some(2), None).unwrap());
        assert_eq!(second.orders.len(), 5);
        assert_eq!(second.orders[4].order_number, "ORD-000");
    }

    #[test]
    fn filters_combine() {
        let filter = OrderFilter {
            status: Some(OrderStatus::Delivered),
            search: Some("  ord-01 ".to_string()),
            ..Default::default()
        };
        let page = list_orders(sample(), &filter, Pagination::default());
        let numbers: Vec<_> = page.orders.iter().map(|o| o.order_number.as_str()).collect();
        assert_eq!(numbers, ["ORD-015", "ORD-010"]);
    }

    #[test]
    fn search_covers_customer_contacts_and_courier_filter() {
        let courier = UserId::new();
        let mut orders = sample();
        orders[3] = with_courier(orders[3].clone(), courier);
        orders[3].customer.email = Some("Marina@Oysters.example".to_string());

        let by_email = OrderFilter {
            search: Some("marina@".to_string()),
            ..Default::default()
        };
        assert_eq!(list_orders(orders.clone(), &by_email, Pagination::default()).total, 1);

        let by_courier = OrderFilter {
            courier_id: Some(courier),
            ..Default::default()
        };
        assert_eq!(list_orders(orders, &by_courier, Pagination::default()).total, 1);
    }

    #[test]
    fn empty_result_still_has_one_page() {
        let filter = OrderFilter {
            search: Some("nothing".to_string()),
            ..Default::default()
        };
        let page = list_orders(sample(), &filter, Pagination::default());
        assert_eq!(page.total, 0);
        assert_eq!(page.pages, 1);
    }

    #[test]
    fn pagination_bounds() {
        assert!(Pagination::new(Some(0), None).is_err());
        assert!(Pagination::new(None, Some(0)).is_err());
        assert!(Pagination::new(None, Some(101)).is_err());
        assert_eq!(Pagination::new(None, Some(100)).unwrap().limit(), 100);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn pages_partition_the_matches(limit in 1u32..=30) {
            let all = sample();
            let first = list_orders(all.clone(), &OrderFilter::default(), Pagination::new(None, Some(limit)).unwrap());

            let mut seen = Vec::new();
            for page in 1..=first.pages {
                let p = list_orders(all.clone(), &OrderFilter::default(), Pagination::new(Some(page), Some(limit)).unwrap());
                prop_assert!(p.orders.len() <= limit as usize);
                seen.extend(p.orders.into_iter().map(|o| o.order_number));
            }
            prop_assert_eq!(seen.len(), all.len());
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), all.len());
        }
    }
}
