//! Tests for availability slot generation.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use cadence_engine::availability::{available_slots, WorkingWindow};
use cadence_engine::event::{
    BlockId, BlockedInterval, CoachId, EventId, EventInstance, EventStatus, OwnerRef,
};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, min, 0).unwrap()
}

fn coach(id: &str) -> OwnerRef {
    OwnerRef::Coach(CoachId(id.to_string()))
}

fn event(id: u64, owner: OwnerRef, start: DateTime<Utc>, end: DateTime<Utc>) -> EventInstance {
    EventInstance {
        id: EventId(id),
        owner,
        organization: None,
        event_type: "session".to_string(),
        start,
        end,
        status: EventStatus::Scheduled,
        source: None,
        linked_object: None,
        reminder: None,
        reminder_sent: false,
    }
}

fn block(id: u64, owner: OwnerRef, start: DateTime<Utc>, end: DateTime<Utc>) -> BlockedInterval {
    BlockedInterval {
        id: BlockId(id),
        owner,
        start,
        end,
        reason: "unavailable".to_string(),
    }
}

#[test]
fn empty_day_yields_the_full_slot_grid() {
    // 08:00-20:00 window, 60-minute slots at a 30-minute step:
    // starts 08:00, 08:30, ..., 19:00 → 23 slots.
    let slots = available_slots(&coach("c1"), day(), 60, WorkingWindow::default(), &[], &[]);

    assert_eq!(slots.len(), 23);
    assert_eq!(slots[0].start, at(8, 0));
    assert_eq!(slots[0].end, at(9, 0));
    assert_eq!(slots.last().unwrap().start, at(19, 0));
    assert_eq!(slots.last().unwrap().end, at(20, 0));
}

#[test]
fn busy_event_removes_overlapping_candidates_only() {
    // Event 10:00-11:00 kills 60-minute candidates starting 09:30, 10:00
    // and 10:30. The 09:00-10:00 and 11:00-12:00 candidates touch it and
    // survive.
    let events = vec![event(1, coach("c1"), at(10, 0), at(11, 0))];

    let slots = available_slots(&coach("c1"), day(), 60, WorkingWindow::default(), &events, &[]);

    assert_eq!(slots.len(), 20);
    assert!(slots.iter().any(|s| s.start == at(9, 0)));
    assert!(slots.iter().any(|s| s.start == at(11, 0)));
    assert!(!slots.iter().any(|s| s.start == at(9, 30)));
    assert!(!slots.iter().any(|s| s.start == at(10, 0)));
    assert!(!slots.iter().any(|s| s.start == at(10, 30)));
}

#[test]
fn blocked_intervals_remove_candidates_too() {
    let blocks = vec![block(1, coach("c1"), at(8, 0), at(12, 0))];

    let slots = available_slots(&coach("c1"), day(), 60, WorkingWindow::default(), &[], &blocks);

    assert_eq!(slots[0].start, at(12, 0));
}

#[test]
fn other_owners_records_are_ignored() {
    let events = vec![event(1, coach("other"), at(8, 0), at(20, 0))];
    let blocks = vec![block(1, coach("other"), at(8, 0), at(20, 0))];

    let slots = available_slots(&coach("c1"), day(), 60, WorkingWindow::default(), &events, &blocks);

    assert_eq!(slots.len(), 23);
}

#[test]
fn cancelled_events_free_their_slots() {
    let mut cancelled = event(1, coach("c1"), at(8, 0), at(20, 0));
    cancelled.status = EventStatus::Cancelled;

    let slots = available_slots(
        &coach("c1"),
        day(),
        60,
        WorkingWindow::default(),
        &[cancelled],
        &[],
    );

    assert_eq!(slots.len(), 23);
}

#[test]
fn fully_booked_day_is_an_empty_answer() {
    let blocks = vec![block(1, coach("c1"), at(8, 0), at(20, 0))];

    let slots = available_slots(&coach("c1"), day(), 30, WorkingWindow::default(), &[], &blocks);

    assert!(slots.is_empty());
}

#[test]
fn slot_must_fit_before_window_close() {
    // 90-minute slots: the last viable start is 18:30.
    let slots = available_slots(&coach("c1"), day(), 90, WorkingWindow::default(), &[], &[]);

    assert_eq!(slots.last().unwrap().start, at(18, 30));
    assert_eq!(slots.last().unwrap().end, at(20, 0));
}

#[test]
fn duration_longer_than_window_yields_nothing() {
    let slots = available_slots(&coach("c1"), day(), 13 * 60, WorkingWindow::default(), &[], &[]);
    assert!(slots.is_empty());
}

#[test]
fn custom_window_is_respected() {
    let window = WorkingWindow {
        open: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        close: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
    };

    let slots = available_slots(&coach("c1"), day(), 60, window, &[], &[]);

    // Starts 09:00, 09:30, ..., 11:00 → 5 slots.
    assert_eq!(slots.len(), 5);
    assert_eq!(slots[0].start, at(9, 0));
    assert_eq!(slots.last().unwrap().end, at(12, 0));
}

#[test]
fn slots_are_ordered_by_start() {
    let events = vec![event(1, coach("c1"), at(10, 0), at(11, 0))];
    let slots = available_slots(&coach("c1"), day(), 60, WorkingWindow::default(), &events, &[]);

    for pair in slots.windows(2) {
        assert!(pair[0].start < pair[1].start);
    }
}
