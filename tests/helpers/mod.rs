// ABOUTME: Shared test helpers for integration tests
// ABOUTME: Exports HTTP request utilities and app/database fixtures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Daybrief

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(dead_code)]

pub mod app;
pub mod axum_test;
