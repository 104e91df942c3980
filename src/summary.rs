// ABOUTME: Builds the stable nested JSON contract combining derived KPIs and raw rows
// ABOUTME: Applies safe() defaulting at this boundary so the shape never varies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Daybrief

//! # Structured Summary Builder
//!
//! Pure reshaping of `(date, Kpis, DayData)` into the versioned contract
//! other parts of the application consume (dashboards, coach context
//! injection). Field names and nesting are load-bearing; changing them
//! requires a migration on the consumer side.
//!
//! Defaulting happens here and only here: the KPI calculator already emits a
//! fully-typed result, so [`safe`] exists for the raw-row embeddings and
//! profile fields whose absence must not change the output shape.

use crate::collector::DayData;
use crate::kpi::Kpis;
use serde::Serialize;
use serde_json::{json, Value};

/// Contract version for the structured summary
pub const STRUCT_VERSION: u32 = 1;

/// Serialize an optional value, substituting `default` when absent
///
/// The single generic defaulting helper used at the summary boundary.
pub fn safe<T: Serialize>(value: Option<&T>, default: Value) -> Value {
    value.map_or(default, |v| json!(v))
}

/// Build the structured summary contract for one day
#[must_use]
pub fn build_structured_summary(date: &str, kpis: &Kpis, day: &DayData) -> Value {
    let profile = day.profile.as_ref();

    json!({
        "version": STRUCT_VERSION,
        "date": date,
        "nutrition": {
            "totals": {
                "calories": kpis.total_calories,
                "protein_g": kpis.total_protein,
                "carbs_g": kpis.total_carbs,
                "fats_g": kpis.total_fats,
            },
            "macro_distribution": kpis.macro_distribution,
            "meals_logged": kpis.meals_logged,
            "meal_timing": kpis.meal_timing,
            "top_foods": kpis.top_foods,
            "meals": day.meals,
        },
        "training": {
            "workout_count": kpis.workout_count,
            "volume": kpis.workout_volume,
            "muscle_groups": kpis.workout_muscle_groups,
            "exercise_categories": kpis.exercise_categories,
            "duration_minutes": kpis.training_duration_minutes,
            "avg_rpe": kpis.avg_rpe,
            "workouts": day.workouts,
            "exercise_sets": day.exercise_sets,
        },
        "body": {
            "weight_kg": kpis.weight_kg,
            "body_fat_pct": kpis.body_fat_pct,
            "waist_cm": kpis.waist_cm,
            "measurements": safe(day.body_measurements.as_ref(), Value::Null),
        },
        "recovery": {
            "sleep_hours": kpis.sleep_hours,
            "sleep_quality": kpis.sleep_quality,
            "sleep": safe(day.sleep.as_ref(), Value::Null),
        },
        "hydration": {
            "total_ml": kpis.total_fluid_ml,
            "alcohol_ml": kpis.alcohol_ml,
            "score": kpis.hydration_score,
            "fluids": day.fluids,
        },
        "supplements": {
            "taken": kpis.supplements_taken,
            "missed": kpis.supplements_missed,
            "compliance_pct": kpis.supplement_compliance,
            "log": day.supplement_log,
        },
        "activity": {
            "quick_workout_count": kpis.quick_workout_count,
            "minutes": kpis.quick_workout_minutes,
            "avg_intensity": kpis.avg_quick_workout_intensity,
            "quick_workouts": day.quick_workouts,
        },
        "weekly_training": {
            "training_days": kpis.weekly_training_days,
            "rest_days": kpis.weekly_rest_days,
            "volume": kpis.weekly_volume,
            "workout_log": day.weekly_workouts,
        },
        "user_profile": {
            "name": safe(profile.and_then(|p| p.display_name.as_ref()), json!("")),
            "language": safe(profile.and_then(|p| p.language.as_ref()), json!("de")),
            "timezone": safe(profile.and_then(|p| p.timezone.as_ref()), Value::Null),
            "weight_kg": safe(profile.and_then(|p| p.weight_kg.as_ref()), Value::Null),
        },
        "coaching": {
            "sentiment": kpis.coach_sentiment.sentiment,
            "motivation": kpis.coach_sentiment.motivation,
            "topics": kpis.coach_sentiment.topics,
            "message_count": kpis.coach_sentiment.message_count,
        },
        "flags": kpis.daily_flags,
    })
}
