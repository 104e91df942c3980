// ABOUTME: HTTP handler for the day-summary generation endpoint
// ABOUTME: Validates the request, runs the pipeline, and shapes the JSON response
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Daybrief

use crate::errors::{AppError, AppResult};
use crate::pipeline::{run_day_summary, SummaryReport, SummaryRequest};
use crate::resources::ServerResources;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Character budget for each narrative preview in the response
const PREVIEW_CHARS: usize = 300;

/// `POST /api/day-summary` request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummaryRequest {
    /// User to summarize (required)
    pub user_id: Option<String>,
    /// Calendar day in `YYYY-MM-DD` (required)
    pub date: Option<String>,
    /// Recompute even when a summary already exists
    #[serde(default)]
    pub force_update: bool,
}

/// `POST /api/day-summary`
///
/// Headers: `x-user-tz` overrides the timezone used for day boundaries,
/// `x-no-text: true` skips narrative generation.
///
/// # Errors
///
/// Returns 400 for missing or malformed `userId`/`date` and 500 when
/// persistence fails; all other degradations resolve to a 200 whose `status`
/// field describes the outcome.
pub async fn generate_day_summary(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Json(body): Json<DaySummaryRequest>,
) -> AppResult<Json<Value>> {
    let request = validate(&body, &headers)?;
    info!(
        user_id = %request.user_id,
        date = %request.date,
        force_update = request.force_update,
        "day summary requested"
    );

    let report = run_day_summary(&resources, &request).await?;
    Ok(Json(render(&report)))
}

fn validate(body: &DaySummaryRequest, headers: &HeaderMap) -> AppResult<SummaryRequest> {
    let user_id = body
        .user_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::missing_field("userId"))?
        .to_owned();
    let date_str = body
        .date
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::missing_field("date"))?;
    let date: NaiveDate = date_str
        .parse()
        .map_err(|_| AppError::invalid_input(format!("date must be YYYY-MM-DD, got '{date_str}'")))?;

    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned)
    };
    let skip_text = header_str("x-no-text").is_some_and(|v| v.eq_ignore_ascii_case("true"));

    Ok(SummaryRequest {
        user_id,
        date,
        force_update: body.force_update,
        header_timezone: header_str("x-user-tz"),
        skip_text,
    })
}

fn render(report: &SummaryReport) -> Value {
    let mut response = json!({
        "date": report.date,
        "status": report.status.as_str(),
        "tokens_used": report.tokens_used,
        "credits_used": report.credits_used,
        "flags": report.flags,
        "debug": {
            "dataCollected": report.data_collected,
            "calculatedKPIs": report.kpis,
            "summaryLengths": {
                "standard": report.summary_md.chars().count(),
                "xl": report.summary_xl.chars().count(),
                "xxl": report.summary_xxl.chars().count(),
            },
            "flags": report.flags,
        },
        "summary_preview": {
            "standard": preview(&report.summary_md),
            "xl": preview(&report.summary_xl),
            "xxl": preview(&report.summary_xxl),
        },
        "summary_xxl_full": report.summary_xxl,
        "structured_summary": report.structured_summary,
    });
    if let Some(reason) = report.reason {
        response["reason"] = json!(reason);
    }
    response
}

/// First characters of a narrative, for the response preview block
fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        text.to_owned()
    } else {
        let truncated: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{truncated}...")
    }
}
