// ABOUTME: Application fixtures for integration tests
// ABOUTME: In-memory database, seed helpers, and mock LLM providers

use async_trait::async_trait;
use axum::Router;
use daybrief::config::{LlmConfig, ServerConfig};
use daybrief::database::Database;
use daybrief::errors::AppError;
use daybrief::llm::{ChatRequest, ChatResponse, LlmProvider, TokenUsage};
use daybrief::resources::ServerResources;
use daybrief::routes;
use std::sync::Arc;
use uuid::Uuid;

/// Configuration for tests: in-memory database, no LLM key
pub fn test_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        database_url: "sqlite::memory:".to_owned(),
        default_timezone: "Europe/Berlin".to_owned(),
        query_timeout_secs: 5,
        llm: LlmConfig {
            base_url: "http://localhost:0".to_owned(),
            api_key: None,
            model: "test-model".to_owned(),
        },
    }
}

/// Build server resources around an in-memory database and the given provider
pub async fn test_resources(llm: Option<Arc<dyn LlmProvider>>) -> Arc<ServerResources> {
    let database = Database::new("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    Arc::new(ServerResources::with_llm(database, test_config(), llm))
}

/// Build the full application router over the given resources
pub fn test_app(resources: Arc<ServerResources>) -> Router {
    routes::router(resources)
}

// ============================================================================
// Mock LLM Providers
// ============================================================================

/// Provider whose completions always fail
pub struct FailingProvider;

#[async_trait]
impl LlmProvider for FailingProvider {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn default_model(&self) -> &str {
        "none"
    }

    async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, AppError> {
        Err(AppError::external_service("LLM", "connection refused"))
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(false)
    }
}

/// Provider returning a fixed text and token count
pub struct CannedProvider {
    pub text: String,
    pub total_tokens: u32,
}

impl CannedProvider {
    pub fn new(text: &str, total_tokens: u32) -> Self {
        Self {
            text: text.to_owned(),
            total_tokens,
        }
    }
}

#[async_trait]
impl LlmProvider for CannedProvider {
    fn name(&self) -> &'static str {
        "canned"
    }

    fn default_model(&self) -> &str {
        "canned-1"
    }

    async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, AppError> {
        Ok(ChatResponse {
            content: self.text.clone(),
            model: "canned-1".to_owned(),
            usage: Some(TokenUsage {
                prompt_tokens: 100,
                completion_tokens: self.total_tokens.saturating_sub(100),
                total_tokens: self.total_tokens,
            }),
        })
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(true)
    }
}

// ============================================================================
// Seed Helpers
// ============================================================================

pub async fn seed_profile(
    db: &Database,
    user_id: &str,
    name: &str,
    weight_kg: Option<f64>,
    credits: i64,
) {
    sqlx::query(
        "INSERT INTO user_profiles (user_id, display_name, language, timezone, weight_kg, credits)
         VALUES ($1, $2, 'de', 'Europe/Berlin', $3, $4)",
    )
    .bind(user_id)
    .bind(name)
    .bind(weight_kg)
    .bind(credits)
    .execute(db.pool())
    .await
    .expect("Failed to seed profile");
}

pub async fn seed_meal(
    db: &Database,
    user_id: &str,
    date: &str,
    text: &str,
    calories: f64,
    protein_g: f64,
) {
    sqlx::query(
        "INSERT INTO meals (id, user_id, date, text, calories, protein_g, carbs_g, fats_g, quality_score)
         VALUES ($1, $2, $3, $4, $5, $6, 50, 20, 7)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(date)
    .bind(text)
    .bind(calories)
    .bind(protein_g)
    .execute(db.pool())
    .await
    .expect("Failed to seed meal");
}

pub async fn seed_sleep(db: &Database, user_id: &str, date: &str, hours: f64) {
    sqlx::query(
        "INSERT INTO sleep_entries (id, user_id, date, hours, quality_score) VALUES ($1, $2, $3, $4, 6)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(date)
    .bind(hours)
    .execute(db.pool())
    .await
    .expect("Failed to seed sleep entry");
}

pub async fn seed_fluid(db: &Database, user_id: &str, date: &str, amount_ml: f64) {
    sqlx::query(
        "INSERT INTO fluid_entries (id, user_id, date, fluid_type, amount_ml) VALUES ($1, $2, $3, 'water', $4)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(date)
    .bind(amount_ml)
    .execute(db.pool())
    .await
    .expect("Failed to seed fluid entry");
}

/// Current credit balance for a user
pub async fn credits(db: &Database, user_id: &str) -> i64 {
    let row: (i64,) = sqlx::query_as("SELECT credits FROM user_profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db.pool())
        .await
        .expect("Failed to read credits");
    row.0
}

/// Persisted long-form narrative for a user+date, if a row exists
pub async fn persisted_xxl(db: &Database, user_id: &str, date: &str) -> Option<String> {
    sqlx::query_as::<_, (String,)>(
        "SELECT summary_xxl FROM daily_summaries WHERE user_id = $1 AND date = $2",
    )
    .bind(user_id)
    .bind(date)
    .fetch_optional(db.pool())
    .await
    .expect("Failed to read daily summary")
    .map(|(xxl,)| xxl)
}
