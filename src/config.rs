// ABOUTME: Environment-based server configuration for the day-summary service
// ABOUTME: Reads database, HTTP, timezone, and LLM settings from environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Daybrief

//! # Server Configuration
//!
//! Environment-only configuration. Every setting has a sensible development
//! default so `daybrief-server` starts with nothing but a writable working
//! directory; production deployments override via environment variables.

use anyhow::Result;
use std::env;

/// Default IANA timezone applied when neither the request header nor the user
/// profile carries one.
pub const DEFAULT_TIMEZONE: &str = "Europe/Berlin";

/// Top-level server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Database connection URL (SQLite)
    pub database_url: String,
    /// Fallback IANA timezone for day-boundary computation
    pub default_timezone: String,
    /// Per-source-query timeout during collection, in seconds
    pub query_timeout_secs: u64,
    /// LLM provider settings
    pub llm: LlmConfig,
}

/// LLM provider configuration (OpenAI-compatible chat completions)
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Base URL of the chat-completions API
    pub base_url: String,
    /// API key; `None` disables narrative generation
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable is present but unparseable.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http_port: parse_env("HTTP_PORT", 8081)?,
            database_url: env_or_default("DATABASE_URL", "sqlite:./data/daybrief.db"),
            default_timezone: env_or_default("DEFAULT_TIMEZONE", DEFAULT_TIMEZONE),
            query_timeout_secs: parse_env("QUERY_TIMEOUT_SECS", 10)?,
            llm: LlmConfig {
                base_url: env_or_default("LLM_BASE_URL", "https://api.openai.com/v1"),
                api_key: env::var("LLM_API_KEY").ok().filter(|k| !k.is_empty()),
                model: env_or_default("LLM_MODEL", "gpt-4o-mini"),
            },
        })
    }
}

fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {key}: {e}")),
        Err(_) => Ok(default),
    }
}
