// ABOUTME: Health check route handler for service monitoring
// ABOUTME: Reports service status, database reachability, and LLM reachability
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Daybrief

use crate::resources::ServerResources;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;

/// `GET /api/health`
///
/// `llm_reachable` is `null` when no provider is configured; an unreachable
/// provider does not degrade the overall status because the pipeline falls
/// back to the deterministic template anyway.
pub async fn health_check(
    State(resources): State<Arc<ServerResources>>,
) -> Json<serde_json::Value> {
    let database_ok = sqlx::query("SELECT 1")
        .execute(resources.database.pool())
        .await
        .is_ok();

    let llm_reachable = match &resources.llm {
        Some(provider) => Some(provider.health_check().await.unwrap_or(false)),
        None => None,
    };

    Json(serde_json::json!({
        "status": if database_ok { "healthy" } else { "degraded" },
        "database": database_ok,
        "llm_configured": resources.llm.is_some(),
        "llm_reachable": llm_reachable,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
