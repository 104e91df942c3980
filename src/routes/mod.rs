// ABOUTME: Route organization for the daybrief HTTP endpoints
// ABOUTME: Assembles the axum router with tracing and permissive CORS layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Daybrief

//! HTTP route definitions. Handlers stay thin and delegate to the pipeline;
//! the CORS layer mirrors the caller's `Origin` so dashboard frontends on any
//! host can invoke the API, and preflight `OPTIONS` requests are answered with
//! `204 No Content`.

/// Day summary generation routes
pub mod day_summary;
/// Health check routes
pub mod health;

use crate::resources::ServerResources;
use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the application router with all routes and middleware layers
pub fn router(resources: Arc<ServerResources>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/day-summary", post(day_summary::generate_day_summary))
        .route("/api/health", get(health::health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(preflight_no_content))
        .with_state(resources)
}

/// Rewrite the CORS layer's preflight answer from 200 to 204
///
/// Preflight responses carry no body, so `No Content` is the accurate status.
async fn preflight_no_content(request: Request, next: Next) -> Response {
    let preflight = request.method() == Method::OPTIONS;
    let mut response = next.run(request).await;
    if preflight && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}
