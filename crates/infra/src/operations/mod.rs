//! Back-office views over the order read models.
//!
//! Everything here is a pure function of the projected orders plus a clock,
//! except [`bulk`], which goes back through the command dispatcher.

pub mod bulk;
pub mod dashboard;
pub mod listing;
pub mod reminders;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

pub use bulk::{BulkOutcome, BulkRequest, BulkResult, bulk_update};
pub use dashboard::{CourierDashboard, CourierStats, OpsDashboard, OpsSummary, SlotLoad, courier_dashboard, ops_dashboard};
pub use listing::{ListPage, OrderFilter, Pagination, list_orders};
pub use reminders::{REMINDER_WINDOW_MINUTES, delivery_start, due_reminders};

/// Calendar date of `at` in the store's delivery time zone.
pub fn local_date(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}
