//! In-memory event store — the transactional seam between rule expansion
//! and persisted occurrences, plus booking with conflict checks.
//!
//! One lock covers every read-check-write path: a booking's conflict scan
//! and the insert it guards happen under the same guard, so two callers
//! can never both observe "no conflict" for the same owner. Materializing
//! a batch persists the occurrences and bumps the rule's counter in the
//! same critical section.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::availability::{self, AvailableSlot, WorkingWindow};
use crate::conflict;
use crate::error::{EngineError, Result};
use crate::event::{
    BlockId, BlockedInterval, EventDraft, EventId, EventInstance, EventStatus, OccurrenceSource,
    OccurrenceTemplate, OwnerRef,
};
use crate::lock;
use crate::recurrence::{expand, occurrence_interval, RecurrenceRule, RuleId};

/// A reminder the engine wants delivered. Transport is someone else's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderRecord {
    pub event_id: EventId,
    pub fire_at: DateTime<Utc>,
}

/// Reminder delivery collaborator. Invoked only after store state is
/// committed.
pub trait ReminderSink {
    fn dispatch(&mut self, reminder: ReminderRecord);
}

/// Sink that drops reminders; for callers that do not schedule delivery.
#[derive(Debug, Default)]
pub struct NullReminderSink;

impl ReminderSink for NullReminderSink {
    fn dispatch(&mut self, _reminder: ReminderRecord) {}
}

#[derive(Default)]
struct StoreState {
    rules: HashMap<RuleId, RecurrenceRule>,
    events: Vec<EventInstance>,
    blocks: Vec<BlockedInterval>,
    next_rule: u64,
    next_event: u64,
    next_block: u64,
}

/// In-memory store over rules, events and blocked intervals.
#[derive(Default)]
pub struct EventStore {
    state: Mutex<StoreState>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Rules ──────────────────────────────────────────────────────────

    /// Validate and persist a rule. The store mints the id; any id on the
    /// incoming rule is overwritten.
    pub fn create_rule(&self, mut rule: RecurrenceRule) -> Result<RuleId> {
        rule.validate()?;
        let mut state = lock(&self.state);
        let id = RuleId(state.next_rule);
        state.next_rule += 1;
        rule.id = id;
        state.rules.insert(id, rule);
        Ok(id)
    }

    pub fn rule(&self, id: RuleId) -> Result<RecurrenceRule> {
        let state = lock(&self.state);
        state
            .rules
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("rule {}", id)))
    }

    /// Expand a rule and persist up to `count` occurrences starting no
    /// earlier than `from`, as one atomic unit with the rule's occurrence
    /// counter. Reminder records are dispatched only after commit.
    ///
    /// Errors with `CapacityExceeded` when the cap or end date already
    /// forecloses expansion.
    pub fn materialize(
        &self,
        rule_id: RuleId,
        count: usize,
        from: NaiveDate,
        template: &OccurrenceTemplate,
        sink: &mut dyn ReminderSink,
    ) -> Result<Vec<EventInstance>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut state = lock(&self.state);
        let rule = state
            .rules
            .get(&rule_id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("rule {}", rule_id)))?;

        let dates = expand(&rule, count, from);
        if dates.is_empty() {
            return Err(EngineError::CapacityExceeded(format!(
                "rule {} has no remaining occurrences",
                rule_id
            )));
        }

        let mut minted = Vec::with_capacity(dates.len());
        for date in dates {
            let (start, end) = occurrence_interval(&rule, date);
            let id = EventId(state.next_event);
            state.next_event += 1;
            let event = EventInstance {
                id,
                owner: template.owner.clone(),
                organization: template.organization.clone(),
                event_type: template.event_type.clone(),
                start,
                end,
                status: EventStatus::Scheduled,
                source: Some(OccurrenceSource {
                    rule_id,
                    occurrence_date: date,
                }),
                linked_object: template.linked_object.clone(),
                reminder: template.reminder,
                reminder_sent: false,
            };
            state.events.push(event.clone());
            minted.push(event);
        }
        if let Some(rule) = state.rules.get_mut(&rule_id) {
            rule.occurrences_created += minted.len() as u32;
        }
        drop(state);

        for event in &minted {
            dispatch_reminder(event, sink);
        }
        Ok(minted)
    }

    // ── Booking ────────────────────────────────────────────────────────

    /// Book a direct event. Conflicts against the owner's non-cancelled
    /// events fail with the full overlapping set.
    pub fn book(&self, draft: EventDraft, sink: &mut dyn ReminderSink) -> Result<EventId> {
        if draft.end <= draft.start {
            return Err(EngineError::Validation(
                "event end must be after start".to_string(),
            ));
        }

        let mut state = lock(&self.state);
        let conflicts: Vec<EventInstance> =
            conflict::find_conflicts(&draft.owner, draft.start, draft.end, &state.events, None)
                .into_iter()
                .cloned()
                .collect();
        if !conflicts.is_empty() {
            return Err(EngineError::Conflict { conflicts });
        }

        let id = EventId(state.next_event);
        state.next_event += 1;
        let event = EventInstance {
            id,
            owner: draft.owner,
            organization: draft.organization,
            event_type: draft.event_type,
            start: draft.start,
            end: draft.end,
            status: EventStatus::Scheduled,
            source: None,
            linked_object: draft.linked_object,
            reminder: draft.reminder,
            reminder_sent: false,
        };
        state.events.push(event.clone());
        drop(state);

        dispatch_reminder(&event, sink);
        Ok(id)
    }

    /// Move an event to a new interval. The conflict re-check excludes the
    /// event itself; reminder state is cleared and re-dispatched.
    pub fn reschedule(
        &self,
        id: EventId,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
        sink: &mut dyn ReminderSink,
    ) -> Result<()> {
        if new_end <= new_start {
            return Err(EngineError::Validation(
                "event end must be after start".to_string(),
            ));
        }

        let mut state = lock(&self.state);
        let index = state
            .events
            .iter()
            .position(|event| event.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("event {}", id)))?;
        if !state.events[index].is_active() {
            return Err(EngineError::Validation(
                "cancelled events cannot be rescheduled".to_string(),
            ));
        }

        let owner = state.events[index].owner.clone();
        let conflicts: Vec<EventInstance> =
            conflict::find_conflicts(&owner, new_start, new_end, &state.events, Some(id))
                .into_iter()
                .cloned()
                .collect();
        if !conflicts.is_empty() {
            return Err(EngineError::Conflict { conflicts });
        }

        let event = &mut state.events[index];
        event.start = new_start;
        event.end = new_end;
        event.reminder_sent = false;
        let updated = event.clone();
        drop(state);

        dispatch_reminder(&updated, sink);
        Ok(())
    }

    /// Cancel an event. Terminal within this engine; cancelling twice is a
    /// no-op.
    pub fn cancel(&self, id: EventId) -> Result<()> {
        let mut state = lock(&self.state);
        let event = state
            .events
            .iter_mut()
            .find(|event| event.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("event {}", id)))?;
        event.status = EventStatus::Cancelled;
        Ok(())
    }

    // ── Blocked intervals ──────────────────────────────────────────────

    pub fn block(
        &self,
        owner: OwnerRef,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Result<BlockId> {
        if end <= start {
            return Err(EngineError::Validation(
                "blocked interval end must be after start".to_string(),
            ));
        }
        let mut state = lock(&self.state);
        let id = BlockId(state.next_block);
        state.next_block += 1;
        state.blocks.push(BlockedInterval {
            id,
            owner,
            start,
            end,
            reason: reason.into(),
        });
        Ok(id)
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn get_event(&self, id: EventId) -> Result<EventInstance> {
        let state = lock(&self.state);
        state
            .events
            .iter()
            .find(|event| event.id == id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("event {}", id)))
    }

    /// All of an owner's events (any status), ordered by start.
    pub fn events_for_owner(&self, owner: &OwnerRef) -> Vec<EventInstance> {
        let state = lock(&self.state);
        let mut events: Vec<EventInstance> = state
            .events
            .iter()
            .filter(|event| event.owner.same_owner(owner))
            .cloned()
            .collect();
        events.sort_by_key(|event| event.start);
        events
    }

    /// An owner's events overlapping `[start, end)`, ordered by start.
    pub fn events_in_range(
        &self,
        owner: &OwnerRef,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<EventInstance> {
        let state = lock(&self.state);
        let mut events: Vec<EventInstance> = state
            .events
            .iter()
            .filter(|event| {
                event.owner.same_owner(owner)
                    && conflict::overlaps(start, end, event.start, event.end)
            })
            .cloned()
            .collect();
        events.sort_by_key(|event| event.start);
        events
    }

    /// The overlapping set a candidate interval would collide with.
    pub fn conflicts_for(
        &self,
        owner: &OwnerRef,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<EventId>,
    ) -> Vec<EventInstance> {
        let state = lock(&self.state);
        conflict::find_conflicts(owner, start, end, &state.events, exclude)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Boolean short-circuit form of [`conflicts_for`](Self::conflicts_for).
    pub fn has_conflicts(
        &self,
        owner: &OwnerRef,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<EventId>,
    ) -> bool {
        let state = lock(&self.state);
        conflict::has_conflict(owner, start, end, &state.events, exclude)
    }

    /// The owner's open slots of `duration_minutes` on `date`.
    pub fn available_slots(
        &self,
        owner: &OwnerRef,
        date: NaiveDate,
        duration_minutes: u32,
        window: WorkingWindow,
    ) -> Vec<AvailableSlot> {
        let state = lock(&self.state);
        availability::available_slots(
            owner,
            date,
            duration_minutes,
            window,
            &state.events,
            &state.blocks,
        )
    }
}

fn dispatch_reminder(event: &EventInstance, sink: &mut dyn ReminderSink) {
    if let Some(config) = event.reminder {
        sink.dispatch(ReminderRecord {
            event_id: event.id,
            fire_at: event.start - Duration::minutes(i64::from(config.minutes_before)),
        });
    }
}
