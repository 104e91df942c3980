// ABOUTME: HTTP integration tests for the day-summary endpoint
// ABOUTME: Covers validation, idempotency, no-data skip, fallback, and billing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Daybrief

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod helpers;

use helpers::app::{
    credits, persisted_xxl, seed_fluid, seed_meal, seed_profile, seed_sleep, test_app,
    test_resources, CannedProvider, FailingProvider,
};
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};
use std::sync::Arc;

const DATE: &str = "2024-03-01";

fn request_body(user_id: &str, force_update: bool) -> Value {
    json!({ "userId": user_id, "date": DATE, "forceUpdate": force_update })
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_missing_user_id_is_400_with_error_body() {
    let resources = test_resources(None).await;
    let app = test_app(resources);

    let response = AxumTestRequest::post("/api/day-summary")
        .json(&json!({ "date": DATE }))
        .send(app)
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("userId"));
}

#[tokio::test]
async fn test_missing_date_is_400() {
    let resources = test_resources(None).await;
    let app = test_app(resources);

    let response = AxumTestRequest::post("/api/day-summary")
        .json(&json!({ "userId": "u1" }))
        .send(app)
        .await;

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_malformed_date_is_400() {
    let resources = test_resources(None).await;
    let app = test_app(resources);

    let response = AxumTestRequest::post("/api/day-summary")
        .json(&json!({ "userId": "u1", "date": "01.03.2024" }))
        .send(app)
        .await;

    assert_eq!(response.status(), 400);
}

// ============================================================================
// No-data short circuit
// ============================================================================

#[tokio::test]
async fn test_empty_day_skips_without_persisting() {
    let resources = test_resources(None).await;
    seed_profile(&resources.database, "u1", "Mira", Some(80.0), 10).await;
    let app = test_app(Arc::clone(&resources));

    let response = AxumTestRequest::post("/api/day-summary")
        .json(&request_body("u1", false))
        .send(app)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "skipped");
    assert_eq!(body["reason"], "no_data");
    assert_eq!(body["tokens_used"], 0);

    // No row written, no billing
    assert!(persisted_xxl(&resources.database, "u1", DATE).await.is_none());
    assert_eq!(credits(&resources.database, "u1").await, 10);
}

// ============================================================================
// Successful generation and billing
// ============================================================================

#[tokio::test]
async fn test_success_persists_narrative_and_deducts_credits() {
    let long_text = (0..300).map(|i| format!("wort{i}")).collect::<Vec<_>>().join(" ");
    let provider = Arc::new(CannedProvider::new(&long_text, 900));
    let resources = test_resources(Some(provider)).await;
    let db = &resources.database;

    seed_profile(db, "u1", "Mira", Some(80.0), 10).await;
    seed_meal(db, "u1", DATE, "Haferflocken", 400.0, 15.0).await;
    seed_sleep(db, "u1", DATE, 5.0).await;
    seed_fluid(db, "u1", DATE, 1000.0).await;
    let app = test_app(Arc::clone(&resources));

    let response = AxumTestRequest::post("/api/day-summary")
        .json(&request_body("u1", false))
        .send(app)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "success");
    assert_eq!(body["tokens_used"], 900);
    // ceil(900 / 750) = 2 credits
    assert_eq!(body["credits_used"], 2);
    assert_eq!(credits(db, "u1").await, 8);

    // Threshold flags from the seeded day: 400 kcal, 15 g protein at 80 kg,
    // 5 h sleep, 1000 ml fluid at 80 kg
    let flags: Vec<String> = serde_json::from_value(body["flags"].clone()).unwrap();
    assert!(flags.contains(&"very_low_calories".to_owned()));
    assert!(flags.contains(&"low_protein".to_owned()));
    assert!(flags.contains(&"insufficient_sleep".to_owned()));
    assert!(flags.contains(&"dehydrated".to_owned()));

    // Narrative variants and persistence
    assert_eq!(body["summary_xxl_full"], long_text);
    assert_eq!(
        body["debug"]["summaryLengths"]["xxl"].as_u64().unwrap() as usize,
        long_text.chars().count()
    );
    assert_eq!(persisted_xxl(db, "u1", DATE).await.unwrap(), long_text);

    // Structured summary carries the profile and collected rows
    assert_eq!(body["structured_summary"]["user_profile"]["name"], "Mira");
    assert_eq!(body["structured_summary"]["nutrition"]["meals_logged"], 1);
    assert_eq!(body["debug"]["dataCollected"]["meals"], 1);
}

// ============================================================================
// Idempotency and forceUpdate
// ============================================================================

#[tokio::test]
async fn test_second_call_skips_and_does_not_double_bill() {
    let provider = Arc::new(CannedProvider::new("Guten Morgen Mira", 750));
    let resources = test_resources(Some(provider)).await;
    let db = &resources.database;

    seed_profile(db, "u1", "Mira", Some(80.0), 10).await;
    seed_meal(db, "u1", DATE, "Quark", 2000.0, 120.0).await;

    let first: Value = AxumTestRequest::post("/api/day-summary")
        .json(&request_body("u1", false))
        .send(test_app(Arc::clone(&resources)))
        .await
        .json();
    assert_eq!(first["status"], "success");
    assert_eq!(first["credits_used"], 1);
    assert_eq!(credits(db, "u1").await, 9);

    let second: Value = AxumTestRequest::post("/api/day-summary")
        .json(&request_body("u1", false))
        .send(test_app(Arc::clone(&resources)))
        .await
        .json();
    assert_eq!(second["status"], "skipped");
    assert_eq!(second["reason"], "already_exists");
    assert_eq!(second["credits_used"], 0);

    // Persisted row and balance unchanged
    assert_eq!(persisted_xxl(db, "u1", DATE).await.unwrap(), "Guten Morgen Mira");
    assert_eq!(credits(db, "u1").await, 9);
}

#[tokio::test]
async fn test_force_update_recomputes_existing_summary() {
    let provider = Arc::new(CannedProvider::new("Erste Fassung", 300));
    let resources = test_resources(Some(provider)).await;
    let db = &resources.database;

    seed_profile(db, "u1", "Mira", Some(80.0), 10).await;
    seed_meal(db, "u1", DATE, "Quark", 2000.0, 120.0).await;

    let first: Value = AxumTestRequest::post("/api/day-summary")
        .json(&request_body("u1", false))
        .send(test_app(Arc::clone(&resources)))
        .await
        .json();
    assert_eq!(first["status"], "success");

    let forced: Value = AxumTestRequest::post("/api/day-summary")
        .json(&request_body("u1", true))
        .send(test_app(Arc::clone(&resources)))
        .await
        .json();
    assert_eq!(forced["status"], "success");
    assert_eq!(forced["tokens_used"], 300);
    // Billed again: forceUpdate is an explicit recompute
    assert_eq!(credits(db, "u1").await, 8);
}

// ============================================================================
// Narrative fallback
// ============================================================================

#[tokio::test]
async fn test_llm_failure_falls_back_and_bills_nothing() {
    let resources = test_resources(Some(Arc::new(FailingProvider))).await;
    let db = &resources.database;

    seed_profile(db, "u1", "Mira", Some(80.0), 10).await;
    seed_meal(db, "u1", DATE, "Quark", 2000.0, 120.0).await;

    let body: Value = AxumTestRequest::post("/api/day-summary")
        .json(&request_body("u1", false))
        .send(test_app(Arc::clone(&resources)))
        .await
        .json();

    assert_eq!(body["status"], "partial_error");
    assert_eq!(body["tokens_used"], 0);
    assert_eq!(body["credits_used"], 0);
    assert_eq!(credits(db, "u1").await, 10);

    // Deterministic fallback carries the name and the date and is persisted
    let fallback = body["summary_xxl_full"].as_str().unwrap();
    assert!(!fallback.is_empty());
    assert!(fallback.contains("Mira"));
    assert!(fallback.contains(DATE));
    assert_eq!(persisted_xxl(db, "u1", DATE).await.unwrap(), fallback);
}

// ============================================================================
// Text skip header
// ============================================================================

#[tokio::test]
async fn test_no_text_header_skips_generation_and_billing() {
    let provider = Arc::new(CannedProvider::new("sollte nie erscheinen", 900));
    let resources = test_resources(Some(provider)).await;
    let db = &resources.database;

    seed_profile(db, "u1", "Mira", Some(80.0), 10).await;
    seed_meal(db, "u1", DATE, "Quark", 2000.0, 120.0).await;

    let body: Value = AxumTestRequest::post("/api/day-summary")
        .json(&request_body("u1", false))
        .header("x-no-text", "true")
        .send(test_app(Arc::clone(&resources)))
        .await
        .json();

    assert_eq!(body["status"], "success");
    assert_eq!(body["tokens_used"], 0);
    assert_eq!(body["credits_used"], 0);
    assert_eq!(body["summary_xxl_full"], "");
    assert_eq!(credits(db, "u1").await, 10);

    // The persisted row has no text, so a later call without forceUpdate
    // still computes instead of short-circuiting
    assert_eq!(persisted_xxl(db, "u1", DATE).await.unwrap(), "");
    let later: Value = AxumTestRequest::post("/api/day-summary")
        .json(&request_body("u1", false))
        .send(test_app(Arc::clone(&resources)))
        .await
        .json();
    assert_eq!(later["status"], "success");
    assert_eq!(later["tokens_used"], 900);
}

// ============================================================================
// Missing LLM configuration
// ============================================================================

#[tokio::test]
async fn test_without_provider_summary_still_persists() {
    let resources = test_resources(None).await;
    let db = &resources.database;

    seed_profile(db, "u1", "Mira", Some(80.0), 10).await;
    seed_meal(db, "u1", DATE, "Quark", 2000.0, 120.0).await;

    let body: Value = AxumTestRequest::post("/api/day-summary")
        .json(&request_body("u1", false))
        .send(test_app(Arc::clone(&resources)))
        .await
        .json();

    assert_eq!(body["status"], "success");
    assert_eq!(body["tokens_used"], 0);
    assert_eq!(body["summary_xxl_full"], "");
    assert_eq!(body["structured_summary"]["nutrition"]["totals"]["calories"], 2000.0);
    assert_eq!(persisted_xxl(db, "u1", DATE).await.unwrap(), "");
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let resources = test_resources(None).await;
    let response = AxumTestRequest::get("/api/health")
        .send(test_app(resources))
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], true);
    assert_eq!(body["llm_configured"], false);
    assert!(body["llm_reachable"].is_null());
}

#[tokio::test]
async fn test_health_reports_reachable_provider() {
    let provider = Arc::new(CannedProvider::new("ok", 10));
    let resources = test_resources(Some(provider)).await;
    let body: Value = AxumTestRequest::get("/api/health")
        .send(test_app(resources))
        .await
        .json();

    assert_eq!(body["llm_configured"], true);
    assert_eq!(body["llm_reachable"], true);
}

#[tokio::test]
async fn test_health_reports_unreachable_provider_without_degrading() {
    let resources = test_resources(Some(Arc::new(FailingProvider))).await;
    let body: Value = AxumTestRequest::get("/api/health")
        .send(test_app(resources))
        .await
        .json();

    // Narrative generation falls back to the template, so an unreachable
    // provider is reported but does not change the overall status
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["llm_configured"], true);
    assert_eq!(body["llm_reachable"], false);
}

// ============================================================================
// CORS preflight
// ============================================================================

#[tokio::test]
async fn test_preflight_is_204_with_mirrored_origin() {
    let resources = test_resources(None).await;
    let response = AxumTestRequest::options("/api/day-summary")
        .header("origin", "https://dashboard.example")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type,x-user-tz")
        .send(test_app(resources))
        .await;

    assert_eq!(response.status(), 204);
    assert_eq!(
        response.header("access-control-allow-origin"),
        Some("https://dashboard.example")
    );
}
