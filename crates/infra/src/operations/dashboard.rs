use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use oysters_core::UserId;
use oysters_orders::{DeliverySlot, OrderStatus};

use crate::operations::local_date;
use crate::projections::OrderReadModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct OpsSummary {
    pub queue: usize,
    pub prep: usize,
    pub in_transit: usize,
    pub delivered_today: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotLoad {
    pub slot: DeliverySlot,
    pub label: &'static str,
    pub orders: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpsDashboard {
    pub queue: Vec<OrderReadModel>,
    pub prep: Vec<OrderReadModel>,
    pub in_transit: Vec<OrderReadModel>,
    pub summary: OpsSummary,
    pub slots: Vec<SlotLoad>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CourierStats {
    pub active: usize,
    pub delivered_today: usize,
    pub ready_for_pickup: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourierDashboard {
    pub courier_id: UserId,
    pub active_orders: Vec<OrderReadModel>,
    pub delivered_today: Vec<OrderReadModel>,
    pub stats: CourierStats,
    pub updated_at: DateTime<Utc>,
}

fn delivered_on_day(order: &OrderReadModel, now: DateTime<Utc>, offset: FixedOffset) -> bool {
    order.status == OrderStatus::Delivered
        && local_date(order.updated_at, offset) == local_date(now, offset)
}

/// Dispatcher board: the NEW/CONFIRMED queue by delivery date, orders being
/// packed (oldest first), orders on the road (latest first).
pub fn ops_dashboard(orders: &[OrderReadModel], now: DateTime<Utc>, offset: FixedOffset) -> OpsDashboard {
    let mut queue = Vec::new();
    let mut prep = Vec::new();
    let mut in_transit = Vec::new();
    let mut delivered_today = 0;

    for order in orders {
        match order.status {
            OrderStatus::New | OrderStatus::Confirmed => queue.push(order.clone()),
            OrderStatus::Prep => prep.push(order.clone()),
            OrderStatus::InTransit => in_transit.push(order.clone()),
            OrderStatus::Delivered if delivered_on_day(order, now, offset) => delivered_today += 1,
            OrderStatus::Delivered | OrderStatus::Cancelled => {}
        }
    }

    queue.sort_by_key(|o| (o.delivery.date, o.delivery.slot.start_hour(), o.created_at));
    prep.sort_by_key(|o| o.updated_at);
    in_transit.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    let slots = [DeliverySlot::Morning, DeliverySlot::Day, DeliverySlot::Evening]
        .into_iter()
        .map(|slot| SlotLoad {
            slot,
            label: slot.label(),
            orders: queue.iter().chain(prep.iter()).filter(|o| o.delivery.slot == slot).count(),
        })
        .collect();

    OpsDashboard {
        summary: OpsSummary {
            queue: queue.len(),
            prep: prep.len(),
            in_transit: in_transit.len(),
            delivered_today,
        },
        queue,
        prep,
        in_transit,
        slots,
        updated_at: now,
    }
}

/// A courier's own orders. Unassigned orders are not shown here.
pub fn courier_dashboard(
    orders: &[OrderReadModel],
    courier_id: UserId,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> CourierDashboard {
    let mine = orders.iter().filter(|o| o.courier_id == Some(courier_id));

    let mut active_orders = Vec::new();
    let mut delivered_today = Vec::new();
    for order in mine {
        if order.status.is_active() {
            active_orders.push(order.clone());
        } else if delivered_on_day(order, now, offset) {
            delivered_today.push(order.clone());
        }
    }

    active_orders.sort_by_key(|o| (o.status, o.delivery.date, o.delivery.slot.start_hour()));
    delivered_today.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    let stats = CourierStats {
        active: active_orders.len(),
        delivered_today: delivered_today.len(),
        ready_for_pickup: active_orders
            .iter()
            .filter(|o| o.status == OrderStatus::Prep)
            .count(),
    };

    CourierDashboard {
        courier_id,
        active_orders,
        delivered_today,
        stats,
        updated_at: now,
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{order, with_courier};
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn msk() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    #[test]
    fn ops_board_groups_by_status_and_counts_slots() {
        let now = Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        let tomorrow = today.succ_opt().unwrap();
        let orders = vec![
            order("B", OrderStatus::Confirmed, tomorrow, DeliverySlot::Morning, now),
            order("A", OrderStatus::New, today, DeliverySlot::Evening, now),
            order("C", OrderStatus::Prep, today, DeliverySlot::Evening, now),
            order("D", OrderStatus::InTransit, today, DeliverySlot::Day, now),
            order("E", OrderStatus::Delivered, today, DeliverySlot::Day, now - Duration::hours(1)),
            order("F", OrderStatus::Delivered, today, DeliverySlot::Day, now - Duration::days(2)),
            order("G", OrderStatus::Cancelled, today, DeliverySlot::Day, now),
        ];

        let board = ops_dashboard(&orders, now, msk());

        let queue: Vec<_> = board.queue.iter().map(|o| o.order_number.as_str()).collect();
        assert_eq!(queue, ["A", "B"]);
        assert_eq!(
            board.summary,
            OpsSummary {
                queue: 2,
                prep: 1,
                in_transit: 1,
                delivered_today: 1
            }
        );
        let evening = board.slots.iter().find(|s| s.slot == DeliverySlot::Evening).unwrap();
        assert_eq!(evening.orders, 2);
        let day = board.slots.iter().find(|s| s.slot == DeliverySlot::Day).unwrap();
        assert_eq!(day.orders, 0);
    }

    #[test]
    fn delivered_today_uses_the_store_time_zone() {
        // 22:30 UTC on the 13th is already the 14th in Moscow.
        let now = Utc.with_ymd_and_hms(2026, 10, 14, 8, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 10, 13, 22, 30, 0).unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 10, 13).unwrap();
        let orders = vec![order("X", OrderStatus::Delivered, day, DeliverySlot::Evening, late)];

        assert_eq!(ops_dashboard(&orders, now, msk()).summary.delivered_today, 1);
        assert_eq!(
            ops_dashboard(&orders, now, FixedOffset::east_opt(0).unwrap())
                .summary
                .delivered_today,
            0
        );
    }

    #[test]
    fn courier_board_only_shows_own_orders() {
        let now = Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        let me = UserId::new();
        let other = UserId::new();
        let orders = vec![
            with_courier(order("1", OrderStatus::InTransit, today, DeliverySlot::Day, now), me),
            with_courier(order("2", OrderStatus::Prep, today, DeliverySlot::Evening, now), me),
            with_courier(order("3", OrderStatus::Delivered, today, DeliverySlot::Morning, now), me),
            with_courier(order("4", OrderStatus::Prep, today, DeliverySlot::Day, now), other),
            order("5", OrderStatus::New, today, DeliverySlot::Day, now),
        ];

        let board = courier_dashboard(&orders, me, now, msk());
        let active: Vec<_> = board.active_orders.iter().map(|o| o.order_number.as_str()).collect();
        assert_eq!(active, ["2", "1"]);
        assert_eq!(
            board.stats,
            CourierStats {
                active: 2,
                delivered_today: 1,
                ready_for_pickup: 1
            }
        );
    }
}
