//! Recurrence rule expansion — converts a stored rule into concrete
//! occurrence dates.
//!
//! The expander is a pure function of rule state: it never mutates the
//! rule's occurrence counter. The store bumps the counter atomically with
//! persisting the batch (see [`crate::store::EventStore::materialize`]).

use chrono::{
    DateTime, Datelike, Duration, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Utc, Weekday,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{EngineError, Result};

/// Hard iteration cap so a degenerate rule (interval 0, exception-date
/// walls) can never spin the expansion loop forever.
pub const MAX_EXPANSION_STEPS: usize = 1000;

/// Store-minted recurrence rule identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleId(pub u64);

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Recurrence frequency.
///
/// `Unknown` is the catch-all for rule records written by foreign
/// producers: expansion halts on it (terminal, not an error), while
/// [`RecurrenceRule::validate`] rejects it at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Yearly,
    #[serde(other)]
    Unknown,
}

/// A stored recurrence rule.
///
/// `occurrences_created` is server-maintained durable state: only the
/// store mutates it, in the same critical section that persists the
/// occurrences it accounts for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub id: RuleId,
    pub frequency: Frequency,
    pub interval: u32,
    /// Weekly/biweekly only; ignored by other frequencies.
    #[serde(default)]
    pub days_of_week: Vec<Weekday>,
    /// 1-31; the day is clamped to the target month's length, never skipped.
    pub day_of_month: Option<u32>,
    /// 1-12; yearly only.
    pub month_of_year: Option<u32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub occurrence_cap: Option<u32>,
    #[serde(default)]
    pub occurrences_created: u32,
    /// Dates skipped during expansion; the cursor steps over each by
    /// exactly one day.
    #[serde(default)]
    pub exception_dates: BTreeSet<NaiveDate>,
    pub timezone: Tz,
    /// Wall-clock start of each materialized occurrence, in `timezone`.
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
}

impl RecurrenceRule {
    /// Creation-time validation. Expansion itself never errors — a rule
    /// that slipped past validation simply yields fewer (or zero) dates.
    pub fn validate(&self) -> Result<()> {
        if self.frequency == Frequency::Unknown {
            return Err(EngineError::Validation(
                "unknown recurrence frequency".to_string(),
            ));
        }
        if self.interval == 0 {
            return Err(EngineError::Validation(
                "recurrence interval must be positive".to_string(),
            ));
        }
        if let Some(day) = self.day_of_month {
            if !(1..=31).contains(&day) {
                return Err(EngineError::Validation(format!(
                    "day_of_month {} out of range 1-31",
                    day
                )));
            }
        }
        if let Some(month) = self.month_of_year {
            if !(1..=12).contains(&month) {
                return Err(EngineError::Validation(format!(
                    "month_of_year {} out of range 1-12",
                    month
                )));
            }
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(EngineError::Validation(
                    "rule end_date is before start_date".to_string(),
                ));
            }
        }
        if self.duration_minutes == 0 {
            return Err(EngineError::Validation(
                "occurrence duration must be positive".to_string(),
            ));
        }
        if let Some(cap) = self.occurrence_cap {
            if self.occurrences_created > cap {
                return Err(EngineError::Validation(format!(
                    "occurrences_created {} exceeds cap {}",
                    self.occurrences_created, cap
                )));
            }
        }
        Ok(())
    }

    /// Occurrences still permitted under the cap, or `None` if uncapped.
    pub fn remaining_capacity(&self) -> Option<u32> {
        self.occurrence_cap
            .map(|cap| cap.saturating_sub(self.occurrences_created))
    }
}

/// Expand a rule into at most `count` occurrence dates, starting no
/// earlier than `from`.
///
/// Finite and recomputed on every call — there is no restartable iterator
/// state. Returns an empty sequence when the occurrence cap is already
/// reached, the cursor starts past `end_date`, or the frequency is
/// `Unknown`.
pub fn expand(rule: &RecurrenceRule, count: usize, from: NaiveDate) -> Vec<NaiveDate> {
    if rule.frequency == Frequency::Unknown {
        return Vec::new();
    }

    let mut budget = count;
    if let Some(remaining) = rule.remaining_capacity() {
        budget = budget.min(remaining as usize);
    }
    if budget == 0 {
        return Vec::new();
    }

    let mut cursor = rule.start_date.max(from);
    let mut dates = Vec::new();

    for _ in 0..MAX_EXPANSION_STEPS {
        if dates.len() >= budget {
            break;
        }
        if let Some(end) = rule.end_date {
            if cursor > end {
                break;
            }
        }
        if rule.exception_dates.contains(&cursor) {
            // An exception moves the cursor exactly one day before
            // retrying. Re-running the frequency rule here would shift
            // every later weekday computation.
            cursor = match cursor.checked_add_signed(Duration::days(1)) {
                Some(next) => next,
                None => break,
            };
            continue;
        }
        dates.push(cursor);
        cursor = match next_date(rule, cursor) {
            Some(next) => next,
            None => break,
        };
    }

    dates
}

/// `None` halts expansion: either the frequency is terminal or the step
/// would leave chrono's date range. Every arithmetic path is checked so a
/// huge (but validation-accepted) interval can never panic.
fn next_date(rule: &RecurrenceRule, cursor: NaiveDate) -> Option<NaiveDate> {
    let interval = rule.interval as i64;
    match rule.frequency {
        Frequency::Daily => cursor.checked_add_signed(Duration::days(interval)),
        Frequency::Weekly => next_weekly(rule, cursor, interval),
        Frequency::Biweekly => next_weekly(rule, cursor, interval * 2),
        Frequency::Monthly => next_monthly(rule, cursor),
        Frequency::Yearly => next_yearly(rule, cursor),
        Frequency::Unknown => None,
    }
}

/// Weekly stepping: the next listed weekday within the cursor's week, or
/// the earliest listed weekday `weeks` weeks ahead once the week is
/// exhausted. An empty day set degenerates to a plain week jump.
fn next_weekly(rule: &RecurrenceRule, cursor: NaiveDate, weeks: i64) -> Option<NaiveDate> {
    let mut ordinals: Vec<i64> = rule
        .days_of_week
        .iter()
        .map(|day| i64::from(day.num_days_from_monday()))
        .collect();
    if ordinals.is_empty() {
        return cursor.checked_add_signed(Duration::weeks(weeks));
    }
    ordinals.sort_unstable();
    ordinals.dedup();

    let today = i64::from(cursor.weekday().num_days_from_monday());
    if let Some(&next) = ordinals.iter().find(|&&ordinal| ordinal > today) {
        return cursor.checked_add_signed(Duration::days(next - today));
    }

    cursor
        .checked_sub_signed(Duration::days(today))?
        .checked_add_signed(Duration::weeks(weeks))?
        .checked_add_signed(Duration::days(ordinals[0]))
}

/// Monthly stepping: add the interval in months, then re-pin the day to
/// `min(day_of_month, length of the target month)`. Pinning from the rule
/// rather than the cursor is what lets Jan 31 → Feb 28 → Mar 31 recover.
fn next_monthly(rule: &RecurrenceRule, cursor: NaiveDate) -> Option<NaiveDate> {
    let stepped = cursor.checked_add_months(Months::new(rule.interval))?;
    match rule.day_of_month {
        Some(day) => clamp_day(stepped.year(), stepped.month(), day),
        None => Some(stepped),
    }
}

fn next_yearly(rule: &RecurrenceRule, cursor: NaiveDate) -> Option<NaiveDate> {
    let year = cursor.year().checked_add(rule.interval as i32)?;
    let month = rule.month_of_year.unwrap_or_else(|| cursor.month());
    let day = rule.day_of_month.unwrap_or_else(|| cursor.day());
    clamp_day(year, month, day)
}

fn clamp_day(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day.min(days_in_month(year, month)))
}

pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    match NaiveDate::from_ymd_opt(next_year, next_month, 1) {
        Some(first_of_next) => (first_of_next - Duration::days(1)).day(),
        // Only reachable at the edge of chrono's date range.
        None => 28,
    }
}

/// The concrete UTC interval an occurrence occupies, resolved through the
/// rule's timezone.
pub fn occurrence_interval(rule: &RecurrenceRule, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let local = date.and_time(rule.start_time);
    let start = resolve_local(rule.timezone, local).with_timezone(&Utc);
    let end = start + Duration::minutes(i64::from(rule.duration_minutes));
    (start, end)
}

/// Map a wall-clock time into a zone. Ambiguous times (fall-back) take the
/// earlier offset; times inside a spring-forward gap shift one hour past
/// the gap.
fn resolve_local(tz: Tz, local: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(first, _) => first,
        LocalResult::None => match tz.from_local_datetime(&(local + Duration::hours(1))) {
            LocalResult::Single(dt) => dt,
            LocalResult::Ambiguous(first, _) => first,
            LocalResult::None => tz.from_utc_datetime(&local),
        },
    }
}
