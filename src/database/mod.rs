// ABOUTME: Database connection management and schema migrations for the summary service
// ABOUTME: Wraps a SQLite pool and creates all source and output tables idempotently
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Daybrief

//! # Database Management
//!
//! This module provides database access for the day-summary service. The
//! source tables are owned by the wider application; the service only reads
//! them and writes the `daily_summaries` and `token_spends` rows. The schema
//! is still created here idempotently so the service can host its own store
//! in development and tests.

pub mod day_records;
pub mod summaries;

use anyhow::Result;
use sqlx::SqlitePool;

/// Database manager for day-record reads and summary persistence
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or any migration statement fails.
    pub async fn new(database_url: &str) -> Result<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options).await?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Access the underlying pool (seed scripts and tests)
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if a DDL statement fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_profiles (
                user_id TEXT PRIMARY KEY,
                display_name TEXT,
                language TEXT,
                timezone TEXT,
                weight_kg REAL,
                credits INTEGER NOT NULL DEFAULT 0
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS meals (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT,
                text TEXT,
                calories REAL,
                protein_g REAL,
                carbs_g REAL,
                fats_g REAL,
                quality_score INTEGER
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS workout_sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT,
                title TEXT,
                duration_minutes INTEGER,
                rpe REAL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS exercise_sets (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT,
                exercise_name TEXT,
                muscle_group TEXT,
                category TEXT,
                reps INTEGER,
                weight_kg REAL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS weight_entries (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT,
                weight_kg REAL NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS body_measurements (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT,
                weight_kg REAL,
                waist_cm REAL,
                hip_cm REAL,
                chest_cm REAL,
                body_fat_pct REAL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS supplement_logs (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT,
                supplement_name TEXT,
                taken BOOLEAN NOT NULL DEFAULT 0,
                taken_at TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS sleep_entries (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT,
                hours REAL,
                quality_score INTEGER
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS fluid_entries (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT,
                fluid_type TEXT,
                amount_ml REAL,
                alcohol_pct REAL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS coach_messages (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT,
                role TEXT NOT NULL,
                content TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS quick_workouts (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT,
                activity TEXT,
                duration_minutes INTEGER,
                intensity REAL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS daily_workout_log (
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                did_workout BOOLEAN NOT NULL DEFAULT 0,
                PRIMARY KEY (user_id, date)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS daily_aggregates (
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                meal_calories REAL,
                meal_protein_g REAL,
                meal_carbs_g REAL,
                meal_fats_g REAL,
                training_volume REAL,
                fluid_ml REAL,
                PRIMARY KEY (user_id, date)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS daily_summaries (
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                total_calories REAL NOT NULL DEFAULT 0,
                total_protein REAL NOT NULL DEFAULT 0,
                total_carbs REAL NOT NULL DEFAULT 0,
                total_fats REAL NOT NULL DEFAULT 0,
                macro_distribution TEXT, -- JSON object
                top_foods TEXT,          -- JSON array
                workout_volume REAL NOT NULL DEFAULT 0,
                workout_muscle_groups TEXT, -- JSON array
                sleep_score INTEGER,
                recovery_metrics TEXT,   -- JSON object
                summary_md TEXT NOT NULL DEFAULT '',
                summary_xl TEXT NOT NULL DEFAULT '',
                summary_xxl TEXT NOT NULL DEFAULT '',
                kpi_xxl_json TEXT,       -- JSON object
                summary_struct_json TEXT, -- JSON object
                tokens_spent INTEGER NOT NULL DEFAULT 0,
                text_generated BOOLEAN NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (user_id, date)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS token_spends (
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                operation_type TEXT NOT NULL,
                tokens_spent INTEGER NOT NULL DEFAULT 0,
                credits_used INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (user_id, date, operation_type)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Day-scoped lookups all hit (user_id, date)
        for table in [
            "meals",
            "workout_sessions",
            "exercise_sets",
            "weight_entries",
            "body_measurements",
            "supplement_logs",
            "sleep_entries",
            "fluid_entries",
            "coach_messages",
            "quick_workouts",
        ] {
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_user_date ON {table}(user_id, date)"
            ))
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }
}
