// ABOUTME: Main library entry point for the daybrief day-summary service
// ABOUTME: Aggregates daily health records into KPIs, structured summaries, and narratives
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Daybrief

#![deny(unsafe_code)]

//! # Daybrief
//!
//! A day-summary service for personal health and fitness data. One HTTP
//! invocation per user and calendar day collects every logged record (meals,
//! workouts, sleep, fluids, supplements, coach conversations), derives KPIs,
//! builds a stable structured summary, generates an LLM narrative at three
//! lengths, and persists the result with token-based credit billing.
//!
//! ## Architecture
//!
//! The pipeline is a straight line with degradable stages:
//!
//! - **Collector**: concurrent best-effort fan-out over all source tables
//! - **KPI calculator**: pure derivation, deterministic for a given day
//! - **Summary builder**: the versioned JSON contract dashboards consume
//! - **Narrative generator**: one LLM call with a deterministic fallback
//! - **Persistence**: upsert-on-conflict summary and token-spend rows

/// Concurrent per-day data collection with timezone-aware boundaries
pub mod collector;

/// Environment-based server configuration
pub mod config;

/// Database access layer (`SQLite` via sqlx)
pub mod database;

/// Application error types and HTTP error mapping
pub mod errors;

/// KPI derivation from collected day data
pub mod kpi;

/// LLM provider abstraction and the `OpenAI`-compatible implementation
pub mod llm;

/// Structured logging initialization
pub mod logging;

/// Typed records for every source table
pub mod models;

/// Narrative text generation with fallback
pub mod narrative;

/// Pipeline orchestration for one user+day
pub mod pipeline;

/// Shared server state
pub mod resources;

/// HTTP routes
pub mod routes;

/// Structured summary contract builder
pub mod summary;
