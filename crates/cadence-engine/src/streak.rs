//! Consecutive-day activity streaks with freeze-based forgiveness.
//!
//! One [`StreakRecord`] per (user, activity). Recording is idempotent per
//! calendar day; a single missed day can be bridged by consuming a freeze,
//! larger gaps reset the streak. Milestone thresholds grant a one-time
//! reward through the [`RewardLedger`] collaborator.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::event::UserId;
use crate::lock;

/// Streak lengths that earn a one-time reward, ascending.
pub const MILESTONE_THRESHOLDS: [u32; 7] = [7, 14, 30, 60, 90, 180, 365];

/// Points granted per day of a reached milestone threshold.
pub const MILESTONE_REWARD_PER_DAY: u32 = 10;

/// Most recent activity dates retained in the log.
pub const ACTIVITY_LOG_CAP: usize = 365;

/// Kind of activity a streak counts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Workout,
    Nutrition,
    CheckIn,
    Custom(String),
}

/// Derived read-side classification of a streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakHealth {
    /// Never active.
    New,
    /// Active today.
    Excellent,
    /// Exactly one day since the last activity.
    AtRisk,
    Broken,
}

/// What a `record_activity` call did to the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityOutcome {
    /// Date already logged; no state changed.
    Duplicate,
    /// First-ever activity.
    Started,
    /// Consecutive day.
    Extended,
    /// One missed day bridged by consuming a freeze.
    FreezeUsed,
    /// Gap too large (or unforgivable); streak restarted at 1.
    Reset,
}

/// Result of recording one activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityUpdate {
    pub outcome: ActivityOutcome,
    /// Newly earned milestone threshold, if this recording reached one.
    pub milestone: Option<u32>,
}

/// One day of the heat-map view. Intensity is binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatMapDay {
    pub date: NaiveDate,
    pub active: bool,
}

/// Per-(user, activity) streak state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakRecord {
    pub user: UserId,
    pub activity: ActivityType,
    pub current_streak: u32,
    pub current_streak_start: Option<NaiveDate>,
    pub last_activity_date: Option<NaiveDate>,
    pub longest_streak: u32,
    pub longest_streak_start: Option<NaiveDate>,
    pub longest_streak_end: Option<NaiveDate>,
    pub total_activity_count: u32,
    /// Deduplicated, most-recent-first, capped at [`ACTIVITY_LOG_CAP`].
    pub activity_log: Vec<NaiveDate>,
    /// Thresholds already claimed. Survives streak resets — a milestone is
    /// earned once per record, ever.
    pub milestones_earned: BTreeSet<u32>,
    pub freezes_available: u32,
    /// Monotonic non-decreasing.
    pub freezes_used: u32,
}

impl StreakRecord {
    pub fn new(user: UserId, activity: ActivityType, freezes_available: u32) -> Self {
        Self {
            user,
            activity,
            current_streak: 0,
            current_streak_start: None,
            last_activity_date: None,
            longest_streak: 0,
            longest_streak_start: None,
            longest_streak_end: None,
            total_activity_count: 0,
            activity_log: Vec::new(),
            milestones_earned: BTreeSet::new(),
            freezes_available,
            freezes_used: 0,
        }
    }

    /// Record an activity on `date`. Idempotent per calendar day: a date
    /// already in the log changes nothing and reports `Duplicate`.
    pub fn record_activity(&mut self, date: NaiveDate) -> ActivityUpdate {
        if self.activity_log.contains(&date) {
            return ActivityUpdate {
                outcome: ActivityOutcome::Duplicate,
                milestone: None,
            };
        }

        let outcome = match self.last_activity_date {
            None => {
                self.current_streak = 1;
                self.current_streak_start = Some(date);
                ActivityOutcome::Started
            }
            Some(last) => {
                let gap_days = (date - last).num_days();
                if gap_days == 1 {
                    self.current_streak += 1;
                    ActivityOutcome::Extended
                } else if gap_days == 2 && self.freezes_available > 0 {
                    // One skipped day, forgiven by a freeze. Gaps beyond
                    // two days are never forgiven.
                    self.freezes_available -= 1;
                    self.freezes_used += 1;
                    self.current_streak += 1;
                    ActivityOutcome::FreezeUsed
                } else {
                    self.current_streak = 1;
                    self.current_streak_start = Some(date);
                    ActivityOutcome::Reset
                }
            }
        };

        self.last_activity_date = Some(date);
        self.total_activity_count += 1;

        if self.current_streak > self.longest_streak {
            self.longest_streak = self.current_streak;
            self.longest_streak_start = self.current_streak_start;
            self.longest_streak_end = Some(date);
        }

        self.push_log(date);

        ActivityUpdate {
            outcome,
            milestone: self.claim_milestone(),
        }
    }

    fn claim_milestone(&mut self) -> Option<u32> {
        let hit = MILESTONE_THRESHOLDS
            .iter()
            .copied()
            .find(|threshold| {
                *threshold == self.current_streak && !self.milestones_earned.contains(threshold)
            })?;
        self.milestones_earned.insert(hit);
        Some(hit)
    }

    fn push_log(&mut self, date: NaiveDate) {
        self.activity_log.push(date);
        self.activity_log.sort_unstable_by(|a, b| b.cmp(a));
        self.activity_log.dedup();
        self.activity_log.truncate(ACTIVITY_LOG_CAP);
    }

    /// Explicit reset. When the streak being broken is the longest one on
    /// record, `on` becomes the longest streak's end date.
    pub fn break_streak(&mut self, on: NaiveDate) {
        if self.current_streak > 0 && self.current_streak == self.longest_streak {
            self.longest_streak_end = Some(on);
        }
        self.current_streak = 0;
        self.current_streak_start = None;
    }

    /// Lazy read-side reconciliation: breaks the streak when more than one
    /// day has passed since the last activity and no freeze remains.
    /// Returns whether the streak was broken.
    pub fn check_streak(&mut self, today: NaiveDate) -> bool {
        let Some(last) = self.last_activity_date else {
            return false;
        };
        let gap_days = (today - last).num_days();
        if gap_days > 1 && self.freezes_available == 0 && self.current_streak > 0 {
            self.break_streak(today);
            return true;
        }
        false
    }

    pub fn health(&self, today: NaiveDate) -> StreakHealth {
        match self.last_activity_date {
            None => StreakHealth::New,
            Some(last) => {
                let gap_days = (today - last).num_days();
                if gap_days <= 0 {
                    StreakHealth::Excellent
                } else if gap_days == 1 {
                    StreakHealth::AtRisk
                } else {
                    StreakHealth::Broken
                }
            }
        }
    }

    /// One entry per day of the trailing window ending at `today`, oldest
    /// first. Presence is binary.
    pub fn heat_map(&self, window_days: u32, today: NaiveDate) -> Vec<HeatMapDay> {
        let mut days = Vec::with_capacity(window_days as usize);
        for back in (0..i64::from(window_days)).rev() {
            let date = today - Duration::days(back);
            days.push(HeatMapDay {
                date,
                active: self.activity_log.contains(&date),
            });
        }
        days
    }
}

/// Milestone reward collaborator. Called only after the streak record has
/// been updated.
pub trait RewardLedger {
    fn award(&mut self, user: &UserId, amount: u32, reason: &str);
}

/// Ledger that drops rewards; for callers that do not track points.
#[derive(Debug, Default)]
pub struct NullRewardLedger;

impl RewardLedger for NullRewardLedger {
    fn award(&mut self, _user: &UserId, _amount: u32, _reason: &str) {}
}

/// Streak records keyed by (user, activity), behind one lock so concurrent
/// same-day submissions for the same record serialize and stay idempotent.
pub struct StreakTracker {
    records: Mutex<HashMap<(UserId, ActivityType), StreakRecord>>,
    freezes_per_record: u32,
}

impl StreakTracker {
    /// `freezes_per_record` seeds `freezes_available` on first activity.
    pub fn new(freezes_per_record: u32) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            freezes_per_record,
        }
    }

    /// Record an activity, creating the record on first touch. Milestone
    /// rewards are granted through `ledger` after the record is updated.
    pub fn record_activity(
        &self,
        user: &UserId,
        activity: &ActivityType,
        date: NaiveDate,
        ledger: &mut dyn RewardLedger,
    ) -> ActivityUpdate {
        let update = {
            let mut records = lock(&self.records);
            let record = records
                .entry((user.clone(), activity.clone()))
                .or_insert_with(|| {
                    StreakRecord::new(user.clone(), activity.clone(), self.freezes_per_record)
                });
            record.record_activity(date)
        };
        // The guard is released before the collaborator runs, so a ledger
        // may read the tracker back.
        if let Some(threshold) = update.milestone {
            ledger.award(
                user,
                threshold * MILESTONE_REWARD_PER_DAY,
                &format!("streak_milestone_{}", threshold),
            );
        }
        update
    }

    /// Lazy reconciliation on read. Errors if the record does not exist.
    pub fn check_streak(
        &self,
        user: &UserId,
        activity: &ActivityType,
        today: NaiveDate,
    ) -> Result<bool> {
        let mut records = lock(&self.records);
        let record = records
            .get_mut(&(user.clone(), activity.clone()))
            .ok_or_else(|| EngineError::NotFound(format!("streak record for user {}", user)))?;
        Ok(record.check_streak(today))
    }

    pub fn break_streak(
        &self,
        user: &UserId,
        activity: &ActivityType,
        on: NaiveDate,
    ) -> Result<()> {
        let mut records = lock(&self.records);
        let record = records
            .get_mut(&(user.clone(), activity.clone()))
            .ok_or_else(|| EngineError::NotFound(format!("streak record for user {}", user)))?;
        record.break_streak(on);
        Ok(())
    }

    /// A missing record reads as `New`.
    pub fn health(&self, user: &UserId, activity: &ActivityType, today: NaiveDate) -> StreakHealth {
        let records = lock(&self.records);
        match records.get(&(user.clone(), activity.clone())) {
            Some(record) => record.health(today),
            None => StreakHealth::New,
        }
    }

    /// A missing record reads as an all-inactive window.
    pub fn heat_map(
        &self,
        user: &UserId,
        activity: &ActivityType,
        window_days: u32,
        today: NaiveDate,
    ) -> Vec<HeatMapDay> {
        let records = lock(&self.records);
        match records.get(&(user.clone(), activity.clone())) {
            Some(record) => record.heat_map(window_days, today),
            None => StreakRecord::new(user.clone(), activity.clone(), 0)
                .heat_map(window_days, today),
        }
    }

    /// Snapshot of a record, if it exists.
    pub fn get(&self, user: &UserId, activity: &ActivityType) -> Option<StreakRecord> {
        let records = lock(&self.records);
        records.get(&(user.clone(), activity.clone())).cloned()
    }
}
