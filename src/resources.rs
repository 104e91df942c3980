// ABOUTME: Shared server state constructed once at startup
// ABOUTME: Bundles the database pool, the optional LLM provider, and configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Daybrief

use crate::config::ServerConfig;
use crate::database::Database;
use crate::llm::{provider_from_config, LlmProvider};
use std::sync::Arc;

/// Immutable shared state handed to every request handler
pub struct ServerResources {
    pub database: Database,
    /// `None` when no LLM API key is configured; narrative generation is
    /// then skipped for every request.
    pub llm: Option<Arc<dyn LlmProvider>>,
    pub config: ServerConfig,
}

impl ServerResources {
    /// Assemble resources from configuration and an opened database
    #[must_use]
    pub fn new(database: Database, config: ServerConfig) -> Self {
        let llm = provider_from_config(&config.llm);
        Self::with_llm(database, config, llm)
    }

    /// Assemble resources with an explicit provider (tests inject mocks here)
    #[must_use]
    pub fn with_llm(
        database: Database,
        config: ServerConfig,
        llm: Option<Arc<dyn LlmProvider>>,
    ) -> Self {
        Self {
            database,
            llm,
            config,
        }
    }
}
