//! # cadence-engine
//!
//! Scheduling core for coaching platforms: recurrence rule expansion,
//! half-open interval conflict detection, availability slot generation and
//! per-user activity streaks with freeze-based forgiveness.
//!
//! Everything is an in-process library contract — no wire protocol, no
//! persistence schema. Collaborators (reminder delivery, reward ledger)
//! are traits the caller implements.
//!
//! ## Modules
//!
//! - [`recurrence`] — rule model and pure expansion into occurrence dates
//! - [`event`] — events, blocked intervals, owner identity
//! - [`conflict`] — half-open overlap math over an owner's commitments
//! - [`availability`] — fixed-step open-slot generation in a working window
//! - [`store`] — transactional in-memory store: materialize, book,
//!   reschedule, cancel
//! - [`streak`] — consecutive-day streaks, milestones, heat-map view
//! - [`calendar`] — day/week/month aggregation
//! - [`error`] — error types

pub mod availability;
pub mod calendar;
pub mod conflict;
pub mod error;
pub mod event;
pub mod recurrence;
pub mod store;
pub mod streak;

pub use availability::{available_slots, AvailableSlot, WorkingWindow};
pub use conflict::{find_conflicts, has_conflict, overlaps};
pub use error::{EngineError, Result};
pub use event::{
    BlockedInterval, EventDraft, EventId, EventInstance, EventStatus, OccurrenceTemplate, OwnerRef,
};
pub use recurrence::{expand, Frequency, RecurrenceRule, RuleId};
pub use store::{EventStore, ReminderRecord, ReminderSink};
pub use streak::{ActivityType, StreakHealth, StreakRecord, StreakTracker};

use std::sync::{Mutex, MutexGuard};

/// Acquire a mutex, recovering the data from a poisoned lock rather than
/// propagating the panic.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
