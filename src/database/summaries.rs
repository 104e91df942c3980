// ABOUTME: Persistence for daily summary rows, token spend accounting, and credits
// ABOUTME: All writes are upserts on the (user_id, date) conflict target
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Daybrief

//! # Summary Persistence
//!
//! The two durable outputs of the pipeline: the `daily_summaries` row (the
//! contract dashboards and the chat coach consume) and the `token_spends`
//! accounting row. Both upsert on conflict so concurrent re-invocations for
//! the same `(user_id, date)` are last-writer-wins safe.

use super::Database;
use crate::errors::{AppError, AppResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Persisted daily summary row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailySummaryRecord {
    pub user_id: String,
    pub date: String,
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fats: f64,
    /// JSON object with protein/carbs/fat percentages
    pub macro_distribution: Option<String>,
    /// JSON array of top foods
    pub top_foods: Option<String>,
    pub workout_volume: f64,
    /// JSON array of muscle group names
    pub workout_muscle_groups: Option<String>,
    pub sleep_score: Option<i64>,
    /// JSON object with sleep/recovery details
    pub recovery_metrics: Option<String>,
    /// Short narrative (first 120 words of the long form)
    pub summary_md: String,
    /// Medium narrative (first 240 words of the long form)
    pub summary_xl: String,
    /// Long-form narrative
    pub summary_xxl: String,
    /// Full KPI set as JSON
    pub kpi_xxl_json: Option<String>,
    /// Structured summary contract as JSON
    pub summary_struct_json: Option<String>,
    pub tokens_spent: i64,
    pub text_generated: bool,
    pub updated_at: String,
}

impl DailySummaryRecord {
    /// Whether this row already carries a usable narrative, which makes a
    /// repeat invocation without `forceUpdate` a no-op.
    #[must_use]
    pub fn has_text(&self) -> bool {
        !self.summary_xxl.trim().is_empty()
    }
}

/// Persisted token spend accounting row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TokenSpendRecord {
    pub user_id: String,
    pub date: String,
    pub operation_type: String,
    pub tokens_spent: i64,
    pub credits_used: i64,
    pub updated_at: String,
}

impl Database {
    /// Fetch the persisted summary for one user+date, if any
    pub async fn daily_summary(
        &self,
        user_id: &str,
        date: &str,
    ) -> AppResult<Option<DailySummaryRecord>> {
        sqlx::query_as::<_, DailySummaryRecord>(
            "SELECT * FROM daily_summaries WHERE user_id = $1 AND date = $2",
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to read daily_summaries: {e}")))
    }

    /// Upsert the daily summary row on `(user_id, date)`
    pub async fn upsert_daily_summary(&self, record: &DailySummaryRecord) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO daily_summaries (
                user_id, date, total_calories, total_protein, total_carbs, total_fats,
                macro_distribution, top_foods, workout_volume, workout_muscle_groups,
                sleep_score, recovery_metrics, summary_md, summary_xl, summary_xxl,
                kpi_xxl_json, summary_struct_json, tokens_spent, text_generated, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            ON CONFLICT (user_id, date) DO UPDATE SET
                total_calories = excluded.total_calories,
                total_protein = excluded.total_protein,
                total_carbs = excluded.total_carbs,
                total_fats = excluded.total_fats,
                macro_distribution = excluded.macro_distribution,
                top_foods = excluded.top_foods,
                workout_volume = excluded.workout_volume,
                workout_muscle_groups = excluded.workout_muscle_groups,
                sleep_score = excluded.sleep_score,
                recovery_metrics = excluded.recovery_metrics,
                summary_md = excluded.summary_md,
                summary_xl = excluded.summary_xl,
                summary_xxl = excluded.summary_xxl,
                kpi_xxl_json = excluded.kpi_xxl_json,
                summary_struct_json = excluded.summary_struct_json,
                tokens_spent = excluded.tokens_spent,
                text_generated = excluded.text_generated,
                updated_at = excluded.updated_at
            ",
        )
        .bind(&record.user_id)
        .bind(&record.date)
        .bind(record.total_calories)
        .bind(record.total_protein)
        .bind(record.total_carbs)
        .bind(record.total_fats)
        .bind(&record.macro_distribution)
        .bind(&record.top_foods)
        .bind(record.workout_volume)
        .bind(&record.workout_muscle_groups)
        .bind(record.sleep_score)
        .bind(&record.recovery_metrics)
        .bind(&record.summary_md)
        .bind(&record.summary_xl)
        .bind(&record.summary_xxl)
        .bind(&record.kpi_xxl_json)
        .bind(&record.summary_struct_json)
        .bind(record.tokens_spent)
        .bind(record.text_generated)
        .bind(&record.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to upsert daily summary: {e}")))?;

        Ok(())
    }

    /// Upsert the token spend accounting row for one operation
    pub async fn upsert_token_spend(
        &self,
        user_id: &str,
        date: &str,
        operation_type: &str,
        tokens_spent: i64,
        credits_used: i64,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO token_spends (user_id, date, operation_type, tokens_spent, credits_used, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, date, operation_type) DO UPDATE SET
                tokens_spent = excluded.tokens_spent,
                credits_used = excluded.credits_used,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user_id)
        .bind(date)
        .bind(operation_type)
        .bind(tokens_spent)
        .bind(credits_used)
        .bind(Utc::now().to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to upsert token spend: {e}")))?;

        Ok(())
    }

    /// Deduct credits from the user's balance, flooring at zero
    ///
    /// Returns the remaining balance. Missing profile rows are treated as a
    /// zero balance rather than an error; billing is best-effort.
    pub async fn deduct_credits(&self, user_id: &str, credits: i64) -> AppResult<i64> {
        sqlx::query(
            "UPDATE user_profiles SET credits = MAX(0, credits - $1) WHERE user_id = $2",
        )
        .bind(credits)
        .bind(user_id)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to deduct credits: {e}")))?;

        let remaining: Option<(i64,)> =
            sqlx::query_as("SELECT credits FROM user_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(self.pool())
                .await
                .map_err(|e| AppError::database(format!("Failed to read credits: {e}")))?;

        Ok(remaining.map_or(0, |(c,)| c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user_id: &str, date: &str, xxl: &str, tokens: i64) -> DailySummaryRecord {
        DailySummaryRecord {
            user_id: user_id.to_owned(),
            date: date.to_owned(),
            total_calories: 2100.0,
            total_protein: 150.0,
            total_carbs: 200.0,
            total_fats: 70.0,
            macro_distribution: Some(r#"{"protein_pct":29}"#.to_owned()),
            top_foods: Some("[]".to_owned()),
            workout_volume: 4200.0,
            workout_muscle_groups: Some(r#"["chest"]"#.to_owned()),
            sleep_score: Some(7),
            recovery_metrics: None,
            summary_md: String::new(),
            summary_xl: String::new(),
            summary_xxl: xxl.to_owned(),
            kpi_xxl_json: None,
            summary_struct_json: None,
            tokens_spent: tokens,
            text_generated: !xxl.is_empty(),
            updated_at: Utc::now().to_rfc3339(),
        }
    }

    async fn test_db() -> Database {
        Database::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_upsert_overwrites_existing_row() {
        let db = test_db().await;

        db.upsert_daily_summary(&record("u1", "2024-03-01", "first text", 100))
            .await
            .unwrap();
        db.upsert_daily_summary(&record("u1", "2024-03-01", "second text", 200))
            .await
            .unwrap();

        let row = db.daily_summary("u1", "2024-03-01").await.unwrap().unwrap();
        assert_eq!(row.summary_xxl, "second text");
        assert_eq!(row.tokens_spent, 200);
    }

    #[tokio::test]
    async fn test_has_text_distinguishes_empty_summary() {
        let db = test_db().await;

        db.upsert_daily_summary(&record("u1", "2024-03-02", "", 0))
            .await
            .unwrap();
        let row = db.daily_summary("u1", "2024-03-02").await.unwrap().unwrap();
        assert!(!row.has_text());

        db.upsert_daily_summary(&record("u1", "2024-03-02", "Guten Morgen", 50))
            .await
            .unwrap();
        let row = db.daily_summary("u1", "2024-03-02").await.unwrap().unwrap();
        assert!(row.has_text());
    }

    #[tokio::test]
    async fn test_deduct_credits_floors_at_zero() {
        let db = test_db().await;

        sqlx::query(
            "INSERT INTO user_profiles (user_id, display_name, credits) VALUES ('u1', 'Mira', 3)",
        )
        .execute(db.pool())
        .await
        .unwrap();

        assert_eq!(db.deduct_credits("u1", 2).await.unwrap(), 1);
        assert_eq!(db.deduct_credits("u1", 5).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deduct_credits_without_profile_is_zero() {
        let db = test_db().await;
        assert_eq!(db.deduct_credits("ghost", 4).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_token_spend_upsert() {
        let db = test_db().await;

        db.upsert_token_spend("u1", "2024-03-01", "day_summary", 900, 2)
            .await
            .unwrap();
        db.upsert_token_spend("u1", "2024-03-01", "day_summary", 1500, 2)
            .await
            .unwrap();

        let row: (i64,) = sqlx::query_as(
            "SELECT tokens_spent FROM token_spends WHERE user_id = 'u1' AND date = '2024-03-01'",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(row.0, 1500);
    }
}
