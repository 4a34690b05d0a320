use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};

use oysters_orders::{DeliveryWindow, OrderStatus};

use crate::projections::OrderReadModel;

/// Half-width of the window around `now + hours` that counts as due.
pub const REMINDER_WINDOW_MINUTES: i64 = 30;

const REMINDABLE: [OrderStatus; 3] = [OrderStatus::Confirmed, OrderStatus::Prep, OrderStatus::InTransit];

/// Start of the delivery window: the hourly slot start when one was picked,
/// otherwise the start of the day part.
pub fn delivery_start(window: &DeliveryWindow, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let start = window
        .hourly_slot
        .as_deref()
        .and_then(|s| s.split('-').next())
        .and_then(|s| NaiveTime::parse_from_str(s, "%H:%M").ok())
        .or_else(|| NaiveTime::from_hms_opt(window.slot.start_hour(), 0, 0))?;

    offset
        .from_local_datetime(&window.date.and_time(start))
        .single()
        .map(|local| local.with_timezone(&Utc))
}

/// Orders whose customers asked for a reminder `hours` ahead and whose
/// delivery starts within the window around `now + hours`.
pub fn due_reminders(
    orders: &[OrderReadModel],
    now: DateTime<Utc>,
    hours: u16,
    offset: FixedOffset,
) -> Vec<OrderReadModel> {
    let target = now + Duration::hours(i64::from(hours));
    let window = Duration::minutes(REMINDER_WINDOW_MINUTES);

    orders
        .iter()
        .filter(|o| REMINDABLE.contains(&o.status) && o.notify_before_hours == hours)
        .filter(|o| {
            delivery_start(&o.delivery, offset)
                .is_some_and(|start| start >= target - window && start <= target + window)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::dashboard::fixtures::order;
    use chrono::NaiveDate;
    use oysters_orders::DeliverySlot;

    fn msk() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    #[test]
    fn slot_and_hourly_starts() {
        let mut window = DeliveryWindow {
            date: NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(),
            slot: DeliverySlot::Evening,
            hourly_slot: None,
        };
        assert_eq!(
            delivery_start(&window, msk()).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 14, 14, 0, 0).unwrap()
        );

        window.hourly_slot = Some("19:30-20:30".to_string());
        assert_eq!(
            delivery_start(&window, msk()).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 14, 16, 30, 0).unwrap()
        );
    }

    #[test]
    fn picks_orders_inside_the_window() {
        // 10:00 Moscow; Day slot starts 12:00 Moscow.
        let now = Utc.with_ymd_and_hms(2026, 10, 14, 7, 0, 0).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();

        let mut due = order("DUE", OrderStatus::Confirmed, date, DeliverySlot::Day, now);
        due.notify_before_hours = 2;
        let mut wrong_hours = order("HRS", OrderStatus::Confirmed, date, DeliverySlot::Day, now);
        wrong_hours.notify_before_hours = 1;
        let mut new = order("NEW", OrderStatus::New, date, DeliverySlot::Day, now);
        new.notify_before_hours = 2;
        let mut evening = order("EVE", OrderStatus::Prep, date, DeliverySlot::Evening, now);
        evening.notify_before_hours = 2;

        let orders = vec![due, wrong_hours, new, evening];
        let picked: Vec<_> = due_reminders(&orders, now, 2, msk())
            .into_iter()
            .map(|o| o.order_number)
            .collect();
        assert_eq!(picked, ["DUE"]);

        let edge = now + Duration::minutes(REMINDER_WINDOW_MINUTES);
        assert_eq!(due_reminders(&orders, edge, 2, msk()).len(), 1);
        let past_edge = edge + Duration::minutes(1);
        assert!(due_reminders(&orders, past_edge, 2, msk()).is_empty());
    }
}
