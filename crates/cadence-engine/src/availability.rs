//! Availability slot generation inside a daily working window.
//!
//! Candidate slots start every [`SLOT_STEP_MINUTES`] from window-open; a
//! candidate survives iff it ends by window-close and its half-open range
//! overlaps none of the owner's non-cancelled events or blocked intervals.
//! An empty result means "fully booked", not an error.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict::overlaps;
use crate::event::{BlockedInterval, EventInstance, OwnerRef};

/// Spacing between candidate slot starts.
pub const SLOT_STEP_MINUTES: i64 = 30;

/// Daily working window, `[open, close)` wall-clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingWindow {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl Default for WorkingWindow {
    /// 08:00-20:00.
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// A bookable slot, half-open like every other interval in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Enumerate the owner's open slots of `duration_minutes` on `date`.
///
/// Events and blocks belonging to other owners are ignored; cancelled
/// events never occupy time. Results are ordered by start.
pub fn available_slots(
    owner: &OwnerRef,
    date: NaiveDate,
    duration_minutes: u32,
    window: WorkingWindow,
    events: &[EventInstance],
    blocks: &[BlockedInterval],
) -> Vec<AvailableSlot> {
    let mut slots = Vec::new();
    if duration_minutes == 0 || window.open >= window.close {
        return slots;
    }

    let open = date.and_time(window.open).and_utc();
    let close = date.and_time(window.close).and_utc();
    let duration = Duration::minutes(i64::from(duration_minutes));
    let step = Duration::minutes(SLOT_STEP_MINUTES);

    let mut start = open;
    while start + duration <= close {
        let end = start + duration;
        let busy = events.iter().any(|event| {
            event.is_active()
                && event.owner.same_owner(owner)
                && overlaps(start, end, event.start, event.end)
        }) || blocks.iter().any(|block| {
            block.owner.same_owner(owner) && overlaps(start, end, block.start, block.end)
        });
        if !busy {
            slots.push(AvailableSlot { start, end });
        }
        start += step;
    }

    slots
}
