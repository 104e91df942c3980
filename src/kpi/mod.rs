// ABOUTME: Pure KPI derivation from one day of collected health records
// ABOUTME: Produces a fully-populated metrics struct regardless of which inputs exist
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Daybrief

//! # KPI Calculator
//!
//! Pure transformation from [`DayData`] to [`Kpis`]. No I/O, no clock, no
//! randomness - the same input always yields the same output, which is what
//! makes the pipeline deterministic apart from the generated narrative.
//!
//! Two rules shape most of this module:
//!
//! - **Double-count avoidance**: when a fast pre-aggregated total exists it
//!   is the base for that metric; detail rows are then only iterated for
//!   metadata the rollup does not carry (timing buckets, top foods, alcohol
//!   content). Their numeric contributions are never added on top.
//! - **Unknown is not zero**: metrics that cannot be computed for lack of a
//!   reference value (hydration without a body weight, compliance without a
//!   supplement log) are `None`, never `0`.

pub mod sentiment;

pub use sentiment::{
    CoachSentiment, KeywordSentimentClassifier, MotivationLevel, Sentiment, SentimentClassifier,
};

use crate::collector::DayData;
use chrono::Timelike;
use serde::{Deserialize, Serialize};

/// Daily flag names, in evaluation order
pub mod flags {
    pub const VERY_LOW_CALORIES: &str = "very_low_calories";
    pub const LOW_PROTEIN: &str = "low_protein";
    pub const HIGH_VOLUME_TRAINING: &str = "high_volume_training";
    pub const INSUFFICIENT_SLEEP: &str = "insufficient_sleep";
    pub const DEHYDRATED: &str = "dehydrated";
    pub const HIGH_INTENSITY_TRAINING: &str = "high_intensity_training";
}

/// Hydration target: 35 mL of fluid per kg of body weight
const HYDRATION_ML_PER_KG: f64 = 35.0;
/// Calorie floor below which a nonzero intake is flagged
const VERY_LOW_CALORIE_THRESHOLD: f64 = 1200.0;
/// Minimum protein intake in g per kg body weight
const LOW_PROTEIN_G_PER_KG: f64 = 1.2;
/// Daily training volume (reps x kg) considered high
const HIGH_VOLUME_THRESHOLD: f64 = 5000.0;
/// Sleep hours below which the day is flagged
const INSUFFICIENT_SLEEP_HOURS: f64 = 6.0;
/// Hydration score below which the day is flagged
const DEHYDRATED_SCORE: i64 = 60;
/// Average session RPE above which the day is flagged
const HIGH_INTENSITY_RPE: f64 = 8.0;
/// Number of top foods surfaced
const TOP_FOODS_LIMIT: usize = 5;

/// Macro distribution as percentages of total calories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroDistribution {
    pub protein_pct: i64,
    pub carbs_pct: i64,
    pub fat_pct: i64,
}

/// A frequently-logged food with its quality score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopFood {
    pub food: String,
    pub score: Option<i64>,
    pub count: u32,
}

/// Meal counts per time-of-day bucket (local time)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealTiming {
    /// 05:00 - 10:59
    pub morning: u32,
    /// 11:00 - 15:59
    pub midday: u32,
    /// 16:00 - 21:59
    pub evening: u32,
    /// 22:00 - 04:59
    pub night: u32,
}

/// All derived metrics for one user+day
///
/// Every field is populated on every invocation; absent source data shows up
/// as `0`, `None`, or an empty collection, so downstream consumers never
/// need per-field presence checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kpis {
    // Nutrition
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fats: f64,
    pub macro_distribution: MacroDistribution,
    pub meals_logged: usize,
    pub meal_timing: MealTiming,
    pub top_foods: Vec<TopFood>,

    // Training
    pub workout_count: usize,
    pub workout_volume: f64,
    pub workout_muscle_groups: Vec<String>,
    pub exercise_categories: Vec<String>,
    pub training_duration_minutes: i64,
    pub avg_rpe: Option<f64>,

    // Body
    pub weight_kg: Option<f64>,
    pub body_fat_pct: Option<f64>,
    pub waist_cm: Option<f64>,

    // Recovery
    pub sleep_hours: Option<f64>,
    pub sleep_quality: Option<i64>,

    // Hydration
    pub total_fluid_ml: f64,
    pub alcohol_ml: f64,
    pub hydration_score: Option<i64>,

    // Supplements
    pub supplements_taken: u32,
    pub supplements_missed: u32,
    pub supplement_compliance: Option<i64>,

    // Activity (quick workouts)
    pub quick_workout_count: usize,
    pub quick_workout_minutes: i64,
    pub avg_quick_workout_intensity: Option<f64>,

    // Coaching
    pub coach_sentiment: CoachSentiment,

    // Weekly balance (trailing 7 days)
    pub weekly_training_days: u32,
    pub weekly_rest_days: u32,
    pub weekly_volume: f64,

    // Rule-based daily flags
    pub daily_flags: Vec<String>,
}

/// Derive all KPIs with the default keyword sentiment classifier
#[must_use]
pub fn calculate_kpis(day: &DayData) -> Kpis {
    calculate_kpis_with(&KeywordSentimentClassifier, day)
}

/// Derive all KPIs with an explicit sentiment classifier
#[must_use]
pub fn calculate_kpis_with(classifier: &dyn SentimentClassifier, day: &DayData) -> Kpis {
    let (total_calories, total_protein, total_carbs, total_fats) = nutrition_totals(day);
    let macro_distribution = macro_distribution(total_calories, total_protein, total_carbs, total_fats);
    let meal_timing = meal_timing(day);
    let top_foods = top_foods(day);

    let workout_volume = day
        .fast
        .training_volume
        .unwrap_or_else(|| set_volume(&day.exercise_sets));
    let workout_muscle_groups = distinct(&day.exercise_sets, |s| s.muscle_group.as_deref());
    let exercise_categories = distinct(&day.exercise_sets, |s| s.category.as_deref());
    let training_duration_minutes = day
        .workouts
        .iter()
        .filter_map(|w| w.duration_minutes)
        .sum();
    let avg_rpe = average(day.workouts.iter().filter_map(|w| w.rpe));

    let weight_kg = resolve_weight(day);
    let body_fat_pct = day.body_measurements.as_ref().and_then(|m| m.body_fat_pct);
    let waist_cm = day.body_measurements.as_ref().and_then(|m| m.waist_cm);

    let sleep_hours = day.sleep.as_ref().and_then(|s| s.hours);
    let sleep_quality = day.sleep.as_ref().and_then(|s| s.quality_score);

    let total_fluid_ml = day
        .fast
        .fluid_ml
        .unwrap_or_else(|| day.fluids.iter().filter_map(|f| f.amount_ml).sum());
    let alcohol_ml = day
        .fluids
        .iter()
        .filter_map(|f| Some(f.amount_ml? * f.alcohol_pct? / 100.0))
        .sum();
    let hydration_score = hydration_score(total_fluid_ml, weight_kg);

    let (supplements_taken, supplements_missed, supplement_compliance) =
        supplement_compliance(day);

    let quick_workout_minutes = day
        .quick_workouts
        .iter()
        .filter_map(|q| q.duration_minutes)
        .sum();
    let avg_quick_workout_intensity =
        average(day.quick_workouts.iter().filter_map(|q| q.intensity));

    let coach_sentiment = classifier.classify(&day.coach_messages);

    let weekly_training_days = day
        .weekly_workouts
        .iter()
        .filter(|w| w.did_workout)
        .count() as u32;
    let weekly_rest_days = day
        .weekly_workouts
        .iter()
        .filter(|w| !w.did_workout)
        .count() as u32;
    let weekly_volume = set_volume(&day.weekly_exercise_sets).round();

    let mut kpis = Kpis {
        total_calories,
        total_protein,
        total_carbs,
        total_fats,
        macro_distribution,
        meals_logged: day.meals.len(),
        meal_timing,
        top_foods,
        workout_count: day.workouts.len(),
        workout_volume,
        workout_muscle_groups,
        exercise_categories,
        training_duration_minutes,
        avg_rpe,
        weight_kg,
        body_fat_pct,
        waist_cm,
        sleep_hours,
        sleep_quality,
        total_fluid_ml,
        alcohol_ml,
        hydration_score,
        supplements_taken,
        supplements_missed,
        supplement_compliance,
        quick_workout_count: day.quick_workouts.len(),
        quick_workout_minutes,
        avg_quick_workout_intensity,
        coach_sentiment,
        weekly_training_days,
        weekly_rest_days,
        weekly_volume,
        daily_flags: Vec::new(),
    };
    kpis.daily_flags = daily_flags(&kpis);
    kpis
}

/// Nutrition totals, preferring the fast aggregate per field
fn nutrition_totals(day: &DayData) -> (f64, f64, f64, f64) {
    let manual = |get: fn(&crate::models::Meal) -> Option<f64>| -> f64 {
        day.meals.iter().filter_map(get).sum()
    };
    (
        day.fast.meal_calories.unwrap_or_else(|| manual(|m| m.calories)),
        day.fast.meal_protein_g.unwrap_or_else(|| manual(|m| m.protein_g)),
        day.fast.meal_carbs_g.unwrap_or_else(|| manual(|m| m.carbs_g)),
        day.fast.meal_fats_g.unwrap_or_else(|| manual(|m| m.fats_g)),
    )
}

/// Percentages of calories from each macro (4/4/9 kcal per gram), guarded
/// against divide-by-zero
fn macro_distribution(calories: f64, protein: f64, carbs: f64, fats: f64) -> MacroDistribution {
    if calories <= 0.0 {
        return MacroDistribution::default();
    }
    MacroDistribution {
        protein_pct: (protein * 4.0 / calories * 100.0).round() as i64,
        carbs_pct: (carbs * 4.0 / calories * 100.0).round() as i64,
        fat_pct: (fats * 9.0 / calories * 100.0).round() as i64,
    }
}

/// Meal counts per local time-of-day bucket; meals without a timestamp are
/// not bucketed
fn meal_timing(day: &DayData) -> MealTiming {
    let mut timing = MealTiming::default();
    for meal in &day.meals {
        let Some(created_at) = meal.created_at else {
            continue;
        };
        let hour = created_at.with_timezone(&day.timezone).hour();
        match hour {
            5..=10 => timing.morning += 1,
            11..=15 => timing.midday += 1,
            16..=21 => timing.evening += 1,
            _ => timing.night += 1,
        }
    }
    timing
}

/// Top foods by `(text, quality_score)` frequency, descending, ties kept in
/// insertion order (stable sort)
fn top_foods(day: &DayData) -> Vec<TopFood> {
    let mut grouped: Vec<TopFood> = Vec::new();
    for meal in &day.meals {
        let Some(text) = meal.text.as_deref() else {
            continue;
        };
        match grouped
            .iter_mut()
            .find(|f| f.food == text && f.score == meal.quality_score)
        {
            Some(existing) => existing.count += 1,
            None => grouped.push(TopFood {
                food: text.to_owned(),
                score: meal.quality_score,
                count: 1,
            }),
        }
    }
    grouped.sort_by(|a, b| b.count.cmp(&a.count));
    grouped.truncate(TOP_FOODS_LIMIT);
    grouped
}

/// Training volume over a slice of sets: sum of reps x weight
fn set_volume(sets: &[crate::models::ExerciseSet]) -> f64 {
    sets.iter()
        .filter_map(|s| Some(s.reps? as f64 * s.weight_kg?))
        .sum()
}

/// De-duplicated metadata values in first-seen order
fn distinct<T, F>(items: &[T], get: F) -> Vec<String>
where
    F: Fn(&T) -> Option<&str>,
{
    let mut seen = Vec::new();
    for item in items {
        if let Some(value) = get(item) {
            if !seen.iter().any(|s| s == value) {
                seen.push(value.to_owned());
            }
        }
    }
    seen
}

/// Body weight waterfall: today's weight entry, then the profile weight,
/// then today's body measurement
fn resolve_weight(day: &DayData) -> Option<f64> {
    day.weight
        .as_ref()
        .map(|w| w.weight_kg)
        .or_else(|| day.profile.as_ref().and_then(|p| p.weight_kg))
        .or_else(|| day.body_measurements.as_ref().and_then(|m| m.weight_kg))
}

/// Hydration score against the 35 mL/kg target, `None` when no weight is
/// resolvable ("unknown" must stay distinguishable from "0% of target")
fn hydration_score(fluid_ml: f64, weight_kg: Option<f64>) -> Option<i64> {
    let kg = weight_kg.filter(|kg| *kg > 0.0)?;
    let score = (fluid_ml / kg / HYDRATION_ML_PER_KG * 100.0).round() as i64;
    Some(score.min(100))
}

/// Taken/missed counts and compliance percentage; an entry counts as taken
/// when `taken` is set OR `taken_at` is non-null
fn supplement_compliance(day: &DayData) -> (u32, u32, Option<i64>) {
    if day.supplement_log.is_empty() {
        return (0, 0, None);
    }
    let taken = day
        .supplement_log
        .iter()
        .filter(|s| s.taken || s.taken_at.is_some())
        .count() as u32;
    let total = day.supplement_log.len() as u32;
    let missed = total - taken;
    let compliance = (f64::from(taken) / f64::from(total) * 100.0).round() as i64;
    (taken, missed, Some(compliance))
}

fn average(values: impl Iterator<Item = f64>) -> Option<f64> {
    let collected: Vec<f64> = values.collect();
    if collected.is_empty() {
        None
    } else {
        Some(collected.iter().sum::<f64>() / collected.len() as f64)
    }
}

/// Rule-based daily flags; each rule fires at most once, order is stable
fn daily_flags(kpis: &Kpis) -> Vec<String> {
    let mut result = Vec::new();

    if kpis.total_calories > 0.0 && kpis.total_calories < VERY_LOW_CALORIE_THRESHOLD {
        result.push(flags::VERY_LOW_CALORIES.to_owned());
    }
    if let Some(weight) = kpis.weight_kg {
        if kpis.total_protein > 0.0 && kpis.total_protein / weight < LOW_PROTEIN_G_PER_KG {
            result.push(flags::LOW_PROTEIN.to_owned());
        }
    }
    if kpis.workout_volume > HIGH_VOLUME_THRESHOLD {
        result.push(flags::HIGH_VOLUME_TRAINING.to_owned());
    }
    if let Some(hours) = kpis.sleep_hours {
        if hours < INSUFFICIENT_SLEEP_HOURS {
            result.push(flags::INSUFFICIENT_SLEEP.to_owned());
        }
    }
    if let Some(score) = kpis.hydration_score {
        if score < DEHYDRATED_SCORE {
            result.push(flags::DEHYDRATED.to_owned());
        }
    }
    if let Some(rpe) = kpis.avg_rpe {
        if rpe > HIGH_INTENSITY_RPE {
            result.push(flags::HIGH_INTENSITY_TRAINING.to_owned());
        }
    }

    result
}
