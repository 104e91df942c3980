// ABOUTME: Concurrent best-effort collection of all health records for one user+day
// ABOUTME: Computes timezone-aware day boundaries and fans out the source queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Daybrief

//! # Day Data Collector
//!
//! Gathers every record relevant to one `(user, calendar day)` pair. All
//! source queries are issued concurrently through a single `tokio::join!`
//! fan-out so wall-clock latency tracks the slowest query, not the sum.
//!
//! Collection is best-effort: a failing or timed-out source degrades to its
//! empty default and is logged with its source name. One broken join must
//! never doom the whole day.

use crate::database::Database;
use crate::errors::AppResult;
use crate::models::{
    BodyMeasurement, CoachMessage, ExerciseSet, FastAggregates, FluidEntry, Meal, QuickWorkout,
    SleepEntry, SupplementLogEntry, UserProfile, WeightEntry, WorkoutDayLog, WorkoutSession,
};
use chrono::{DateTime, Duration as ChronoDuration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::json;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Trailing look-back window for the weekly balance metrics, in days
/// (inclusive of the summary day itself).
pub const WEEKLY_WINDOW_DAYS: i64 = 7;

/// Absolute UTC bounds of one calendar day in a given IANA timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    /// Start of the day (inclusive)
    pub start_utc: DateTime<Utc>,
    /// Start of the next day (exclusive)
    pub end_utc: DateTime<Utc>,
}

impl DayWindow {
    /// Compute the UTC instants bounding `date` in `tz`
    #[must_use]
    pub fn new(date: NaiveDate, tz: Tz) -> Self {
        Self {
            start_utc: local_midnight(date, tz),
            end_utc: local_midnight(date + ChronoDuration::days(1), tz),
        }
    }
}

/// Midnight of `date` in `tz` as a UTC instant
///
/// DST transitions at midnight are resolved to the earlier candidate; a
/// nonexistent local midnight (spring-forward gap) falls back to the naive
/// time read as UTC.
fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => Utc.from_utc_datetime(&naive),
    }
}

/// Resolve the effective timezone: request header, then stored profile
/// timezone, then the configured default. Unparseable entries are skipped
/// with a warning.
#[must_use]
pub fn resolve_timezone(
    header_tz: Option<&str>,
    profile_tz: Option<&str>,
    default_tz: &str,
) -> Tz {
    for (origin, candidate) in [("header", header_tz), ("profile", profile_tz)] {
        if let Some(name) = candidate {
            match Tz::from_str(name) {
                Ok(tz) => return tz,
                Err(_) => warn!(origin, timezone = name, "ignoring invalid timezone"),
            }
        }
    }
    Tz::from_str(default_tz).unwrap_or(chrono_tz::Europe::Berlin)
}

/// All raw rows collected for one user+date
///
/// Every array defaults to empty and every singleton to `None`; downstream
/// consumers never see a partially-constructed aggregate.
#[derive(Debug, Clone)]
pub struct DayData {
    /// Summary day (`YYYY-MM-DD`)
    pub date: String,
    /// Effective timezone used for day boundaries and meal timing buckets
    pub timezone: Tz,
    pub meals: Vec<Meal>,
    pub workouts: Vec<WorkoutSession>,
    pub exercise_sets: Vec<ExerciseSet>,
    pub weight: Option<WeightEntry>,
    pub body_measurements: Option<BodyMeasurement>,
    pub supplement_log: Vec<SupplementLogEntry>,
    pub sleep: Option<SleepEntry>,
    pub fluids: Vec<FluidEntry>,
    pub coach_messages: Vec<CoachMessage>,
    pub profile: Option<UserProfile>,
    pub quick_workouts: Vec<QuickWorkout>,
    pub weekly_workouts: Vec<WorkoutDayLog>,
    pub weekly_exercise_sets: Vec<ExerciseSet>,
    /// Fast pre-aggregated totals; all-`None` when no rollup row exists
    pub fast: FastAggregates,
}

impl DayData {
    /// Whether every no-data category is empty
    ///
    /// Checks the eight record categories plus coach conversations; the
    /// profile, weekly history, and fast aggregates do not count as "data
    /// for the day".
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meals.is_empty()
            && self.workouts.is_empty()
            && self.exercise_sets.is_empty()
            && self.weight.is_none()
            && self.body_measurements.is_none()
            && self.supplement_log.is_empty()
            && self.sleep.is_none()
            && self.fluids.is_empty()
            && self.coach_messages.is_empty()
    }

    /// Per-source row counts for the debug block of the response
    #[must_use]
    pub fn counts(&self) -> serde_json::Value {
        json!({
            "meals": self.meals.len(),
            "workouts": self.workouts.len(),
            "exerciseSets": self.exercise_sets.len(),
            "weight": i32::from(self.weight.is_some()),
            "bodyMeasurements": i32::from(self.body_measurements.is_some()),
            "supplementLog": self.supplement_log.len(),
            "sleep": i32::from(self.sleep.is_some()),
            "fluids": self.fluids.len(),
            "coachConversations": self.coach_messages.len(),
            "quickWorkouts": self.quick_workouts.len(),
            "weeklyWorkouts": self.weekly_workouts.len(),
            "weeklyExerciseSessions": self.weekly_exercise_sets.len(),
        })
    }
}

/// Run one source query with a timeout, degrading failure to `default`
///
/// The degradation policy for partial collection failure: log the source
/// name and reason, return the default, keep going.
async fn guarded<T, F>(source: &'static str, timeout: Duration, default: T, query: F) -> T
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(timeout, query).await {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            warn!(source, "day collection query failed, using default: {e}");
            default
        }
        Err(_) => {
            warn!(source, timeout_secs = timeout.as_secs(), "day collection query timed out");
            default
        }
    }
}

/// Collect every record for one user+day
///
/// The profile is resolved by the caller beforehand (its timezone feeds the
/// day window) and embedded into the aggregate here. All remaining queries
/// run concurrently, each individually guarded.
pub async fn collect_day_data(
    db: &Database,
    user_id: &str,
    date: NaiveDate,
    tz: Tz,
    profile: Option<UserProfile>,
    query_timeout: Duration,
) -> DayData {
    let date_str = date.format("%Y-%m-%d").to_string();
    let window = DayWindow::new(date, tz);
    let weekly_start = (date - ChronoDuration::days(WEEKLY_WINDOW_DAYS - 1))
        .format("%Y-%m-%d")
        .to_string();

    let (
        meals,
        workouts,
        exercise_sets,
        weight,
        body_measurements,
        supplement_log,
        sleep,
        fluids,
        coach_messages,
        quick_workouts,
        weekly_workouts,
        weekly_exercise_sets,
        fast,
    ) = tokio::join!(
        guarded(
            "meals",
            query_timeout,
            Vec::new(),
            db.meals_for_day(user_id, &date_str, &window)
        ),
        guarded(
            "workouts",
            query_timeout,
            Vec::new(),
            db.workouts_for_day(user_id, &date_str, &window)
        ),
        guarded(
            "exercise_sets",
            query_timeout,
            Vec::new(),
            db.exercise_sets_for_day(user_id, &date_str, &window)
        ),
        guarded(
            "weight",
            query_timeout,
            None,
            db.weight_for_day(user_id, &date_str, &window)
        ),
        guarded(
            "body_measurements",
            query_timeout,
            None,
            db.body_measurements_for_day(user_id, &date_str, &window)
        ),
        guarded(
            "supplement_log",
            query_timeout,
            Vec::new(),
            db.supplement_logs_for_day(user_id, &date_str, &window)
        ),
        guarded(
            "sleep",
            query_timeout,
            None,
            db.sleep_for_day(user_id, &date_str, &window)
        ),
        guarded(
            "fluids",
            query_timeout,
            Vec::new(),
            db.fluids_for_day(user_id, &date_str, &window)
        ),
        guarded(
            "coach_messages",
            query_timeout,
            Vec::new(),
            db.coach_messages_for_day(user_id, &date_str, &window)
        ),
        guarded(
            "quick_workouts",
            query_timeout,
            Vec::new(),
            db.quick_workouts_for_day(user_id, &date_str, &window)
        ),
        guarded(
            "weekly_workouts",
            query_timeout,
            Vec::new(),
            db.workout_log_for_range(user_id, &weekly_start, &date_str)
        ),
        guarded(
            "weekly_exercise_sets",
            query_timeout,
            Vec::new(),
            db.exercise_sets_for_range(user_id, &weekly_start, &date_str)
        ),
        guarded(
            "fast_aggregates",
            query_timeout,
            None,
            db.fast_aggregates_for_day(user_id, &date_str)
        ),
    );

    DayData {
        date: date_str,
        timezone: tz,
        meals,
        workouts,
        exercise_sets,
        weight,
        body_measurements,
        supplement_log,
        sleep,
        fluids,
        coach_messages,
        profile,
        quick_workouts,
        weekly_workouts,
        weekly_exercise_sets,
        fast: fast.unwrap_or_default(),
    }
}
