// ABOUTME: Typed row records for every health data source read by the collector
// ABOUTME: Each optional column is modeled as Option so the KPI calculator has a fixed schema
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Daybrief

//! # Source Table Records
//!
//! One explicit record type per source table. The upstream application writes
//! these rows from many different clients, so almost every column is nullable;
//! rows may carry a precise `created_at` timestamp, a denormalized `date`, or
//! both. The collector tolerates either (see the day-boundary filter in
//! `database::day_records`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A logged meal
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Meal {
    pub id: String,
    pub user_id: String,
    /// Denormalized calendar day (`YYYY-MM-DD`)
    pub date: String,
    pub created_at: Option<DateTime<Utc>>,
    /// Free-text description of the meal
    pub text: Option<String>,
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fats_g: Option<f64>,
    /// Quality rating 1-10 assigned at logging time
    pub quality_score: Option<i64>,
}

/// A structured workout session
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkoutSession {
    pub id: String,
    pub user_id: String,
    pub date: String,
    pub created_at: Option<DateTime<Utc>>,
    pub title: Option<String>,
    pub duration_minutes: Option<i64>,
    /// Rating of perceived exertion, 1-10
    pub rpe: Option<f64>,
}

/// A single exercise set, denormalized with its exercise metadata
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExerciseSet {
    pub id: String,
    pub user_id: String,
    pub date: String,
    pub created_at: Option<DateTime<Utc>>,
    pub exercise_name: Option<String>,
    pub muscle_group: Option<String>,
    pub category: Option<String>,
    pub reps: Option<i64>,
    pub weight_kg: Option<f64>,
}

/// A body-weight measurement
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WeightEntry {
    pub id: String,
    pub user_id: String,
    pub date: String,
    pub created_at: Option<DateTime<Utc>>,
    pub weight_kg: f64,
}

/// Body circumference and composition measurements
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BodyMeasurement {
    pub id: String,
    pub user_id: String,
    pub date: String,
    pub created_at: Option<DateTime<Utc>>,
    pub weight_kg: Option<f64>,
    pub waist_cm: Option<f64>,
    pub hip_cm: Option<f64>,
    pub chest_cm: Option<f64>,
    pub body_fat_pct: Option<f64>,
}

/// A supplement/peptide protocol log entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SupplementLogEntry {
    pub id: String,
    pub user_id: String,
    pub date: String,
    pub created_at: Option<DateTime<Utc>>,
    pub supplement_name: Option<String>,
    /// Explicit taken flag; a non-null `taken_at` counts as taken too
    pub taken: bool,
    pub taken_at: Option<String>,
}

/// A sleep log entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SleepEntry {
    pub id: String,
    pub user_id: String,
    pub date: String,
    pub created_at: Option<DateTime<Utc>>,
    pub hours: Option<f64>,
    /// Subjective quality rating 1-10
    pub quality_score: Option<i64>,
}

/// A fluid intake entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FluidEntry {
    pub id: String,
    pub user_id: String,
    pub date: String,
    pub created_at: Option<DateTime<Utc>>,
    pub fluid_type: Option<String>,
    pub amount_ml: Option<f64>,
    /// Alcohol content in percent by volume, when the fluid carries any
    pub alcohol_pct: Option<f64>,
}

/// A single message in an AI coach conversation
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CoachMessage {
    pub id: String,
    pub user_id: String,
    pub date: String,
    pub created_at: Option<DateTime<Utc>>,
    /// `user` or `assistant`; sentiment only considers user-authored messages
    pub role: String,
    pub content: String,
}

/// An unstructured quick workout (walk, bike ride, ...)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuickWorkout {
    pub id: String,
    pub user_id: String,
    pub date: String,
    pub created_at: Option<DateTime<Utc>>,
    pub activity: Option<String>,
    pub duration_minutes: Option<i64>,
    /// Intensity 1-10 when the user rated it
    pub intensity: Option<f64>,
}

/// Coarse per-day workout flag for the trailing-week balance metrics
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkoutDayLog {
    pub user_id: String,
    pub date: String,
    pub did_workout: bool,
}

/// Pre-computed database-side rollups for one user+day
///
/// When present these are authoritative for totals; detail rows are then only
/// iterated for metadata the rollup does not carry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct FastAggregates {
    pub meal_calories: Option<f64>,
    pub meal_protein_g: Option<f64>,
    pub meal_carbs_g: Option<f64>,
    pub meal_fats_g: Option<f64>,
    pub training_volume: Option<f64>,
    pub fluid_ml: Option<f64>,
}

/// User profile row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: Option<String>,
    /// ISO 639-1 language code for generated narratives (defaults to `de`)
    pub language: Option<String>,
    /// Stored IANA timezone, overridable per request
    pub timezone: Option<String>,
    pub weight_kg: Option<f64>,
    /// Remaining narrative-generation credits
    pub credits: i64,
}
