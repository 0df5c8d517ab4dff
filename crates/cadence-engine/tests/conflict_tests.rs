//! Tests for half-open interval conflict detection.

use chrono::{DateTime, TimeZone, Utc};
use cadence_engine::conflict::{blocking_intervals, find_conflicts, has_conflict, overlaps};
use cadence_engine::event::{
    BlockId, BlockedInterval, CoachId, EventId, EventInstance, EventStatus, OwnerRef, UserId,
};

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, hour, min, 0).unwrap()
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

#[test]
fn overlapping_candidate_conflicts() {
    // Existing 10:00-11:00, candidate 10:30-11:30.
    let events = vec![event(1, coach("c1"), at(10, 0), at(11, 0))];

    let hits = find_conflicts(&coach("c1"), at(10, 30), at(11, 30), &events, None);

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, EventId(1));
}

#[test]
fn touching_candidate_does_not_conflict() {
    // Existing 10:00-11:00, candidate 11:00-12:00 — shared endpoint only.
    let events = vec![event(1, coach("c1"), at(10, 0), at(11, 0))];

    assert!(!has_conflict(&coach("c1"), at(11, 0), at(12, 0), &events, None));
}

#[test]
fn overlap_predicate_is_symmetric() {
    assert_eq!(
        overlaps(at(9, 0), at(10, 0), at(9, 30), at(10, 30)),
        overlaps(at(9, 30), at(10, 30), at(9, 0), at(10, 0)),
    );
    assert!(!overlaps(at(9, 0), at(10, 0), at(10, 0), at(11, 0)));
    assert!(!overlaps(at(10, 0), at(11, 0), at(9, 0), at(10, 0)));
}

#[test]
fn fully_contained_candidate_conflicts() {
    let events = vec![event(1, coach("c1"), at(9, 0), at(12, 0))];
    assert!(has_conflict(&coach("c1"), at(10, 0), at(11, 0), &events, None));
}

#[test]
fn different_owner_kind_never_collides() {
    // A coach and an individual with the same id string are different owners.
    let events = vec![event(1, coach("42"), at(10, 0), at(11, 0))];
    let individual = OwnerRef::Individual(UserId("42".to_string()));

    assert!(!has_conflict(&individual, at(10, 0), at(11, 0), &events, None));
}

#[test]
fn other_coach_never_collides() {
    let events = vec![event(1, coach("c1"), at(10, 0), at(11, 0))];
    assert!(!has_conflict(&coach("c2"), at(10, 0), at(11, 0), &events, None));
}

#[test]
fn cancelled_events_do_not_conflict() {
    let mut cancelled = event(1, coach("c1"), at(10, 0), at(11, 0));
    cancelled.status = EventStatus::Cancelled;

    assert!(!has_conflict(&coach("c1"), at(10, 0), at(11, 0), &[cancelled], None));
}

#[test]
fn completed_events_still_occupy_their_slot() {
    let mut completed = event(1, coach("c1"), at(10, 0), at(11, 0));
    completed.status = EventStatus::Completed;

    assert!(has_conflict(&coach("c1"), at(10, 30), at(11, 30), &[completed], None));
}

#[test]
fn exclude_skips_the_event_itself() {
    // Rescheduling event 1 into a range overlapping its own old slot.
    let events = vec![event(1, coach("c1"), at(10, 0), at(11, 0))];

    assert!(!has_conflict(
        &coach("c1"),
        at(10, 30),
        at(11, 30),
        &events,
        Some(EventId(1))
    ));
    assert!(has_conflict(
        &coach("c1"),
        at(10, 30),
        at(11, 30),
        &events,
        Some(EventId(2))
    ));
}

#[test]
fn multiple_overlaps_all_returned() {
    let events = vec![
        event(1, coach("c1"), at(9, 0), at(10, 0)),
        event(2, coach("c1"), at(9, 30), at(10, 30)),
        event(3, coach("c1"), at(12, 0), at(13, 0)),
    ];

    let hits = find_conflicts(&coach("c1"), at(9, 45), at(10, 15), &events, None);

    let ids: Vec<EventId> = hits.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![EventId(1), EventId(2)]);
}

#[test]
fn blocked_intervals_use_the_same_overlap_rules() {
    let blocks = vec![BlockedInterval {
        id: BlockId(1),
        owner: coach("c1"),
        start: at(13, 0),
        end: at(14, 0),
        reason: "lunch".to_string(),
    }];

    assert_eq!(
        blocking_intervals(&coach("c1"), at(13, 30), at(14, 30), &blocks).len(),
        1
    );
    // Touching endpoint.
    assert!(blocking_intervals(&coach("c1"), at(14, 0), at(15, 0), &blocks).is_empty());
    // Other owner.
    assert!(blocking_intervals(&coach("c2"), at(13, 30), at(14, 30), &blocks).is_empty());
}
