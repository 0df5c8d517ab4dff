//! Core scheduling records: events, blocked intervals, owners.
//!
//! Every time range in this crate is half-open — `[start, end)` — so the
//! overlap math in [`crate::conflict`] applies uniformly to events and
//! blocked intervals.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::recurrence::RuleId;

/// Store-minted event identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

/// Store-minted blocked-interval identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u64);

/// Identifier of an individual user (client).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier of a coach.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CoachId(pub String);

/// Identifier of an organization. Organizations annotate events but never
/// participate in owner identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrgId(pub String);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The single owner of a commitment — exactly one of coach or individual.
///
/// Conflict scans compare owners for exact identity: a coach and an
/// individual never collide, even if their id strings happen to match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum OwnerRef {
    Coach(CoachId),
    Individual(UserId),
}

impl OwnerRef {
    /// Exact owner identity. Exhaustive over the variant pairs so a new
    /// owner kind cannot silently fall through a query site.
    pub fn same_owner(&self, other: &OwnerRef) -> bool {
        match (self, other) {
            (OwnerRef::Coach(a), OwnerRef::Coach(b)) => a == b,
            (OwnerRef::Individual(a), OwnerRef::Individual(b)) => a == b,
            (OwnerRef::Coach(_), OwnerRef::Individual(_))
            | (OwnerRef::Individual(_), OwnerRef::Coach(_)) => false,
        }
    }
}

/// Lifecycle of an event within this engine. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Scheduled,
    Completed,
    Cancelled,
}

/// Reminder configuration attached to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Minutes before the event start at which the reminder should fire.
    pub minutes_before: u32,
}

/// Provenance of an event materialized from a recurrence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceSource {
    pub rule_id: RuleId,
    pub occurrence_date: NaiveDate,
}

/// A concrete calendar commitment, either materialized from a rule or
/// booked directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventInstance {
    pub id: EventId,
    pub owner: OwnerRef,
    pub organization: Option<OrgId>,
    /// Free-form type tag ("session", "check_in", ...).
    pub event_type: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: EventStatus,
    /// Present when this event was materialized from a recurrence rule.
    pub source: Option<OccurrenceSource>,
    /// Opaque link to a domain object (workout plan, program, ...).
    pub linked_object: Option<String>,
    pub reminder: Option<ReminderConfig>,
    /// Cleared whenever the event is rescheduled.
    pub reminder_sent: bool,
}

impl EventInstance {
    /// Whether this event still occupies its time range. Cancelled events
    /// never participate in conflict or availability math.
    pub fn is_active(&self) -> bool {
        match self.status {
            EventStatus::Scheduled | EventStatus::Completed => true,
            EventStatus::Cancelled => false,
        }
    }
}

/// Caller-supplied fields for a direct booking; the store mints the id and
/// sets the initial status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub owner: OwnerRef,
    pub organization: Option<OrgId>,
    pub event_type: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub linked_object: Option<String>,
    pub reminder: Option<ReminderConfig>,
}

/// Caller-supplied fields shared by every event minted from one
/// materialization batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceTemplate {
    pub owner: OwnerRef,
    pub organization: Option<OrgId>,
    pub event_type: String,
    pub linked_object: Option<String>,
    pub reminder: Option<ReminderConfig>,
}

/// An owner's unavailability. Same overlap semantics as an event, but only
/// consulted by the availability slot generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedInterval {
    pub id: BlockId,
    pub owner: OwnerRef,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub reason: String,
}
