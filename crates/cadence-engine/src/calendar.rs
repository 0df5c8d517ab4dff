//! Day/week/month aggregation over an owner's events.
//!
//! Thin composition over the store's records: events are grouped by the
//! calendar date of their UTC start. No layout or UI concerns live here.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::event::{EventInstance, OwnerRef};
use crate::recurrence::days_in_month;

/// One calendar day and the owner's non-cancelled events on it, ordered by
/// start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub events: Vec<EventInstance>,
}

fn events_on(owner: &OwnerRef, date: NaiveDate, events: &[EventInstance]) -> Vec<EventInstance> {
    let mut hits: Vec<EventInstance> = events
        .iter()
        .filter(|event| {
            event.is_active()
                && event.owner.same_owner(owner)
                && event.start.date_naive() == date
        })
        .cloned()
        .collect();
    hits.sort_by_key(|event| event.start);
    hits
}

pub fn day_view(owner: &OwnerRef, date: NaiveDate, events: &[EventInstance]) -> CalendarDay {
    CalendarDay {
        date,
        events: events_on(owner, date, events),
    }
}

/// Seven days, Monday-anchored, containing `any_day`.
pub fn week_view(owner: &OwnerRef, any_day: NaiveDate, events: &[EventInstance]) -> Vec<CalendarDay> {
    let week_start = any_day - Duration::days(i64::from(any_day.weekday().num_days_from_monday()));
    (0..7)
        .map(|offset| {
            let date = week_start + Duration::days(offset);
            day_view(owner, date, events)
        })
        .collect()
}

/// Every day of the given month, in order.
pub fn month_view(
    owner: &OwnerRef,
    year: i32,
    month: u32,
    events: &[EventInstance],
) -> Vec<CalendarDay> {
    let last = days_in_month(year, month);
    (1..=last)
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .map(|date| day_view(owner, date, events))
        .collect()
}
