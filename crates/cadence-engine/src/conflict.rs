//! Half-open interval overlap over an owner's commitments.
//!
//! Two ranges `[a0, a1)` and `[b0, b1)` overlap iff `a0 < b1 && a1 > b0`.
//! Touching endpoints (one ends exactly when the other starts) are never a
//! conflict.

use chrono::{DateTime, Utc};

use crate::event::{BlockedInterval, EventId, EventInstance, OwnerRef};

/// Half-open overlap predicate. Symmetric in its two intervals.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

fn conflicts_with(
    event: &EventInstance,
    owner: &OwnerRef,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude: Option<EventId>,
) -> bool {
    if exclude == Some(event.id) {
        return false;
    }
    event.is_active()
        && event.owner.same_owner(owner)
        && overlaps(start, end, event.start, event.end)
}

/// All non-cancelled events of the same owner overlapping the candidate
/// interval. `exclude` skips one event by identity, for reschedule
/// re-checks of an event against itself.
pub fn find_conflicts<'a>(
    owner: &OwnerRef,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    events: &'a [EventInstance],
    exclude: Option<EventId>,
) -> Vec<&'a EventInstance> {
    events
        .iter()
        .filter(|event| conflicts_with(event, owner, start, end, exclude))
        .collect()
}

/// Short-circuit form of [`find_conflicts`].
pub fn has_conflict(
    owner: &OwnerRef,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    events: &[EventInstance],
    exclude: Option<EventId>,
) -> bool {
    events
        .iter()
        .any(|event| conflicts_with(event, owner, start, end, exclude))
}

/// Blocked intervals of the same owner overlapping the candidate interval.
pub fn blocking_intervals<'a>(
    owner: &OwnerRef,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    blocks: &'a [BlockedInterval],
) -> Vec<&'a BlockedInterval> {
    blocks
        .iter()
        .filter(|block| {
            block.owner.same_owner(owner) && overlaps(start, end, block.start, block.end)
        })
        .collect()
}
