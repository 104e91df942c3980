// ABOUTME: Day-scoped read queries for every health data source
// ABOUTME: All queries filter by user and calendar day, tolerating date-only rows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Daybrief

//! # Day Record Queries
//!
//! One read method per data source, each scoped by `user_id` and a
//! day-boundary filter. Rows may carry only a denormalized `date` and no
//! precise timestamp, so the filter accepts either:
//!
//! ```sql
//! user_id = $1 AND (date = $2 OR (created_at >= $3 AND created_at < $4))
//! ```
//!
//! with the timestamp bounds computed from the user's IANA timezone by
//! [`crate::collector::DayWindow`]. Every method is read-only and returns a
//! plain `AppResult`; the best-effort degradation on failure happens in the
//! collector, not here.

use super::Database;
use crate::collector::DayWindow;
use crate::errors::{AppError, AppResult};
use crate::models::{
    BodyMeasurement, CoachMessage, ExerciseSet, FastAggregates, FluidEntry, Meal, QuickWorkout,
    SleepEntry, SupplementLogEntry, UserProfile, WeightEntry, WorkoutDayLog, WorkoutSession,
};

/// Shared day-boundary predicate appended to each detail query
const DAY_FILTER: &str = "user_id = $1 AND (date = $2 OR (created_at IS NOT NULL AND created_at >= $3 AND created_at < $4))";

macro_rules! day_query {
    ($self:expr, $ty:ty, $table:literal, $user_id:expr, $date:expr, $window:expr) => {
        sqlx::query_as::<_, $ty>(&format!(
            "SELECT * FROM {} WHERE {} ORDER BY created_at, id",
            $table, DAY_FILTER
        ))
        .bind($user_id)
        .bind($date)
        .bind($window.start_utc)
        .bind($window.end_utc)
        .fetch_all(&$self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to read {}: {e}", $table)))
    };
}

impl Database {
    /// Meals logged for the day
    pub async fn meals_for_day(
        &self,
        user_id: &str,
        date: &str,
        window: &DayWindow,
    ) -> AppResult<Vec<Meal>> {
        day_query!(self, Meal, "meals", user_id, date, window)
    }

    /// Structured workout sessions for the day
    pub async fn workouts_for_day(
        &self,
        user_id: &str,
        date: &str,
        window: &DayWindow,
    ) -> AppResult<Vec<WorkoutSession>> {
        day_query!(self, WorkoutSession, "workout_sessions", user_id, date, window)
    }

    /// Exercise sets for the day, denormalized with exercise metadata
    pub async fn exercise_sets_for_day(
        &self,
        user_id: &str,
        date: &str,
        window: &DayWindow,
    ) -> AppResult<Vec<ExerciseSet>> {
        day_query!(self, ExerciseSet, "exercise_sets", user_id, date, window)
    }

    /// Most recent weight entry for the day, if any
    pub async fn weight_for_day(
        &self,
        user_id: &str,
        date: &str,
        window: &DayWindow,
    ) -> AppResult<Option<WeightEntry>> {
        sqlx::query_as::<_, WeightEntry>(&format!(
            "SELECT * FROM weight_entries WHERE {DAY_FILTER} ORDER BY created_at DESC, id DESC LIMIT 1"
        ))
        .bind(user_id)
        .bind(date)
        .bind(window.start_utc)
        .bind(window.end_utc)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to read weight_entries: {e}")))
    }

    /// Most recent body measurement for the day, if any
    pub async fn body_measurements_for_day(
        &self,
        user_id: &str,
        date: &str,
        window: &DayWindow,
    ) -> AppResult<Option<BodyMeasurement>> {
        sqlx::query_as::<_, BodyMeasurement>(&format!(
            "SELECT * FROM body_measurements WHERE {DAY_FILTER} ORDER BY created_at DESC, id DESC LIMIT 1"
        ))
        .bind(user_id)
        .bind(date)
        .bind(window.start_utc)
        .bind(window.end_utc)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to read body_measurements: {e}")))
    }

    /// Supplement log entries for the day
    pub async fn supplement_logs_for_day(
        &self,
        user_id: &str,
        date: &str,
        window: &DayWindow,
    ) -> AppResult<Vec<SupplementLogEntry>> {
        day_query!(self, SupplementLogEntry, "supplement_logs", user_id, date, window)
    }

    /// Sleep entry for the day, if any
    pub async fn sleep_for_day(
        &self,
        user_id: &str,
        date: &str,
        window: &DayWindow,
    ) -> AppResult<Option<SleepEntry>> {
        sqlx::query_as::<_, SleepEntry>(&format!(
            "SELECT * FROM sleep_entries WHERE {DAY_FILTER} ORDER BY created_at DESC, id DESC LIMIT 1"
        ))
        .bind(user_id)
        .bind(date)
        .bind(window.start_utc)
        .bind(window.end_utc)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to read sleep_entries: {e}")))
    }

    /// Fluid intake entries for the day
    pub async fn fluids_for_day(
        &self,
        user_id: &str,
        date: &str,
        window: &DayWindow,
    ) -> AppResult<Vec<FluidEntry>> {
        day_query!(self, FluidEntry, "fluid_entries", user_id, date, window)
    }

    /// Coach conversation messages for the day
    pub async fn coach_messages_for_day(
        &self,
        user_id: &str,
        date: &str,
        window: &DayWindow,
    ) -> AppResult<Vec<CoachMessage>> {
        day_query!(self, CoachMessage, "coach_messages", user_id, date, window)
    }

    /// Quick workouts for the day
    pub async fn quick_workouts_for_day(
        &self,
        user_id: &str,
        date: &str,
        window: &DayWindow,
    ) -> AppResult<Vec<QuickWorkout>> {
        day_query!(self, QuickWorkout, "quick_workouts", user_id, date, window)
    }

    /// User profile row, if present
    pub async fn user_profile(&self, user_id: &str) -> AppResult<Option<UserProfile>> {
        sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to read user_profiles: {e}")))
    }

    /// Coarse workout log over an inclusive date range (trailing-week balance)
    pub async fn workout_log_for_range(
        &self,
        user_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> AppResult<Vec<WorkoutDayLog>> {
        sqlx::query_as::<_, WorkoutDayLog>(
            "SELECT * FROM daily_workout_log WHERE user_id = $1 AND date >= $2 AND date <= $3 ORDER BY date",
        )
        .bind(user_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to read daily_workout_log: {e}")))
    }

    /// Exercise sets over an inclusive date range (trailing-week volume)
    pub async fn exercise_sets_for_range(
        &self,
        user_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> AppResult<Vec<ExerciseSet>> {
        sqlx::query_as::<_, ExerciseSet>(
            "SELECT * FROM exercise_sets WHERE user_id = $1 AND date >= $2 AND date <= $3 ORDER BY date, created_at, id",
        )
        .bind(user_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to read exercise_sets range: {e}")))
    }

    /// Fast pre-aggregated rollups for the day, if the rollup row exists
    ///
    /// A single row carries all three fast-path totals (meals, training
    /// volume, fluids); individual columns may still be NULL when only some
    /// rollups have been computed upstream.
    pub async fn fast_aggregates_for_day(
        &self,
        user_id: &str,
        date: &str,
    ) -> AppResult<Option<FastAggregates>> {
        sqlx::query_as::<_, FastAggregates>(
            "SELECT meal_calories, meal_protein_g, meal_carbs_g, meal_fats_g, training_volume, fluid_ml
             FROM daily_aggregates WHERE user_id = $1 AND date = $2",
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to read daily_aggregates: {e}")))
    }
}
