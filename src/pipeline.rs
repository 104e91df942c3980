// ABOUTME: Request-scoped orchestration of the day-summary pipeline
// ABOUTME: Collects, computes, narrates, persists, and bills for one user+day
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Daybrief

//! # Day Summary Pipeline
//!
//! The state machine behind one invocation:
//!
//! `received -> (skip: already_exists) | collecting -> computing ->
//! (generating_text | skipped_text | text_failed_fallback) -> persisting ->
//! responding`
//!
//! Terminal outcomes are `skipped`, `success`, or `partial_error`. Only a
//! persistence failure escapes as an error; every degraded path still returns
//! a renderable report so the dashboard can distinguish "nothing to show"
//! from "shown with reduced fidelity".

use crate::collector::{collect_day_data, resolve_timezone};
use crate::database::summaries::DailySummaryRecord;
use crate::errors::AppResult;
use crate::kpi::{calculate_kpis, Kpis};
use crate::narrative::{self, credits_for_tokens, GenerationStatus};
use crate::resources::ServerResources;
use crate::summary::build_structured_summary;
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

/// Billing operation type recorded with each token spend row
const OPERATION_DAY_SUMMARY: &str = "day_summary";
/// Name used to address users whose profile carries none
const DEFAULT_USER_NAME: &str = "Athlet";
/// Narrative language used when the profile carries none
const DEFAULT_LANGUAGE: &str = "de";

/// Terminal outcome of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    /// Everything succeeded (including a deliberately skipped narrative)
    Success,
    /// Narrative generation failed; fallback text substituted
    PartialError,
    /// Short-circuited before doing any work
    Skipped,
}

impl PipelineStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::PartialError => "partial_error",
            Self::Skipped => "skipped",
        }
    }
}

/// One validated day-summary invocation
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub user_id: String,
    pub date: NaiveDate,
    /// Recompute and overwrite even when a narrative already exists
    pub force_update: bool,
    /// IANA timezone from the `x-user-tz` header, if sent
    pub header_timezone: Option<String>,
    /// Skip narrative generation (`x-no-text` header)
    pub skip_text: bool,
}

/// Everything the HTTP layer needs to render the response
#[derive(Debug, Clone)]
pub struct SummaryReport {
    pub date: String,
    pub status: PipelineStatus,
    /// Why the run was skipped (`already_exists` or `no_data`)
    pub reason: Option<&'static str>,
    pub tokens_used: i64,
    pub credits_used: i64,
    pub flags: Vec<String>,
    /// Per-source row counts collected for the day
    pub data_collected: Value,
    /// Full KPI set, serialized
    pub kpis: Value,
    pub summary_md: String,
    pub summary_xl: String,
    pub summary_xxl: String,
    pub structured_summary: Value,
}

impl SummaryReport {
    fn skipped(date: &str, reason: &'static str) -> Self {
        Self {
            date: date.to_owned(),
            status: PipelineStatus::Skipped,
            reason: Some(reason),
            tokens_used: 0,
            credits_used: 0,
            flags: Vec::new(),
            data_collected: json!({}),
            kpis: json!({}),
            summary_md: String::new(),
            summary_xl: String::new(),
            summary_xxl: String::new(),
            structured_summary: Value::Null,
        }
    }
}

/// Run the full pipeline for one user+day
///
/// # Errors
///
/// Returns an error only when persisting the computed summary fails; all
/// collection and narrative failures degrade within the report instead.
pub async fn run_day_summary(
    resources: &ServerResources,
    request: &SummaryRequest,
) -> AppResult<SummaryReport> {
    let date_str = request.date.format("%Y-%m-%d").to_string();
    let db = &resources.database;

    // Idempotency short-circuit: a row with a usable narrative makes a repeat
    // invocation without forceUpdate a no-op.
    if !request.force_update {
        if let Some(existing) = db.daily_summary(&request.user_id, &date_str).await? {
            if existing.has_text() {
                info!(user_id = %request.user_id, date = %date_str, "summary already exists, skipping");
                return Ok(SummaryReport::skipped(&date_str, "already_exists"));
            }
        }
    }

    // The profile feeds the timezone resolution, so it is fetched before the
    // fan-out. A failing profile read degrades to None like any other source.
    let profile = match db.user_profile(&request.user_id).await {
        Ok(profile) => profile,
        Err(e) => {
            warn!("profile query failed, continuing without profile: {e}");
            None
        }
    };

    let tz = resolve_timezone(
        request.header_timezone.as_deref(),
        profile.as_ref().and_then(|p| p.timezone.as_deref()),
        &resources.config.default_timezone,
    );
    let query_timeout = Duration::from_secs(resources.config.query_timeout_secs);

    let day = collect_day_data(db, &request.user_id, request.date, tz, profile, query_timeout).await;

    if day.is_empty() {
        info!(user_id = %request.user_id, date = %date_str, "no records for day, skipping");
        return Ok(SummaryReport::skipped(&date_str, "no_data"));
    }

    let kpis = calculate_kpis(&day);
    let structured = build_structured_summary(&date_str, &kpis, &day);

    let name = day
        .profile
        .as_ref()
        .and_then(|p| p.display_name.as_deref())
        .unwrap_or(DEFAULT_USER_NAME);
    let language = day
        .profile
        .as_ref()
        .and_then(|p| p.language.as_deref())
        .unwrap_or(DEFAULT_LANGUAGE);

    let outcome = narrative::generate(
        resources.llm.as_deref(),
        &date_str,
        name,
        language,
        &kpis,
        &structured,
        request.skip_text,
    )
    .await;

    let credits_used = if outcome.status == GenerationStatus::Success {
        credits_for_tokens(outcome.tokens_used)
    } else {
        0
    };

    let record = summary_record(&request.user_id, &date_str, &kpis, &structured, &outcome);
    db.upsert_daily_summary(&record).await?;
    db.upsert_token_spend(
        &request.user_id,
        &date_str,
        OPERATION_DAY_SUMMARY,
        outcome.tokens_used,
        credits_used,
    )
    .await?;

    // Billing is best-effort, never transactional with the summary write.
    if credits_used > 0 {
        match db.deduct_credits(&request.user_id, credits_used).await {
            Ok(remaining) => {
                info!(user_id = %request.user_id, credits_used, remaining, "credits deducted");
            }
            Err(e) => warn!("credit deduction failed, ignoring: {e}"),
        }
    }

    let status = match outcome.status {
        GenerationStatus::Success | GenerationStatus::Skipped => PipelineStatus::Success,
        GenerationStatus::Fallback => PipelineStatus::PartialError,
    };

    Ok(SummaryReport {
        date: date_str,
        status,
        reason: None,
        tokens_used: outcome.tokens_used,
        credits_used,
        flags: kpis.daily_flags.clone(),
        data_collected: day.counts(),
        kpis: serde_json::to_value(&kpis).unwrap_or(Value::Null),
        summary_md: outcome.summary_md,
        summary_xl: outcome.summary_xl,
        summary_xxl: outcome.summary_xxl,
        structured_summary: structured,
    })
}

fn summary_record(
    user_id: &str,
    date: &str,
    kpis: &Kpis,
    structured: &Value,
    outcome: &narrative::NarrativeOutcome,
) -> DailySummaryRecord {
    DailySummaryRecord {
        user_id: user_id.to_owned(),
        date: date.to_owned(),
        total_calories: kpis.total_calories,
        total_protein: kpis.total_protein,
        total_carbs: kpis.total_carbs,
        total_fats: kpis.total_fats,
        macro_distribution: serde_json::to_string(&kpis.macro_distribution).ok(),
        top_foods: serde_json::to_string(&kpis.top_foods).ok(),
        workout_volume: kpis.workout_volume,
        workout_muscle_groups: serde_json::to_string(&kpis.workout_muscle_groups).ok(),
        sleep_score: kpis.sleep_quality,
        recovery_metrics: serde_json::to_string(&json!({
            "sleep_hours": kpis.sleep_hours,
            "sleep_quality": kpis.sleep_quality,
        }))
        .ok(),
        summary_md: outcome.summary_md.clone(),
        summary_xl: outcome.summary_xl.clone(),
        summary_xxl: outcome.summary_xxl.clone(),
        kpi_xxl_json: serde_json::to_string(kpis).ok(),
        summary_struct_json: serde_json::to_string(structured).ok(),
        tokens_spent: outcome.tokens_used,
        text_generated: outcome.status == GenerationStatus::Success,
        updated_at: Utc::now().to_rfc3339(),
    }
}
