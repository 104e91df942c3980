// ABOUTME: Narrative day-summary generation with deterministic fallback
// ABOUTME: One LLM call for the long form; shorter variants are word-count truncations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Daybrief

//! # Narrative Generator
//!
//! Turns the structured summary into human-readable text at three lengths.
//! Only the long (xxl) form is generated by the LLM; the medium and short
//! variants are derived by truncating to fixed word counts. That keeps the
//! cost at one completion per day instead of three.
//!
//! Generation is fully degradable: a skip flag produces empty texts with
//! nothing billed, and any provider failure substitutes a deterministic
//! template built from the KPI values alone.

use crate::kpi::{Kpis, MotivationLevel};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Word count of the short (md) variant
const SHORT_WORDS: usize = 120;
/// Word count of the medium (xl) variant
const MEDIUM_WORDS: usize = 240;
/// Tokens per billed credit
const TOKENS_PER_CREDIT: i64 = 750;
/// Generation budget for the long form
const MAX_COMPLETION_TOKENS: u32 = 1500;

/// How the narrative texts came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStatus {
    /// LLM produced the long form
    Success,
    /// LLM failed; deterministic template substituted
    Fallback,
    /// Generation was skipped (flag or no provider configured)
    Skipped,
}

/// The three narrative texts plus accounting
#[derive(Debug, Clone)]
pub struct NarrativeOutcome {
    /// Short variant (first 120 words)
    pub summary_md: String,
    /// Medium variant (first 240 words)
    pub summary_xl: String,
    /// Long form
    pub summary_xxl: String,
    /// Tokens consumed; zero unless status is `Success`
    pub tokens_used: i64,
    pub status: GenerationStatus,
}

impl NarrativeOutcome {
    fn skipped() -> Self {
        Self {
            summary_md: String::new(),
            summary_xl: String::new(),
            summary_xxl: String::new(),
            tokens_used: 0,
            status: GenerationStatus::Skipped,
        }
    }

    fn from_long_form(text: String, tokens_used: i64, status: GenerationStatus) -> Self {
        Self {
            summary_md: truncate_words(&text, SHORT_WORDS),
            summary_xl: truncate_words(&text, MEDIUM_WORDS),
            summary_xxl: text,
            tokens_used,
            status,
        }
    }
}

/// Credits charged for a token count: `ceil(tokens / 750)`
#[must_use]
pub const fn credits_for_tokens(tokens: i64) -> i64 {
    if tokens <= 0 {
        0
    } else {
        (tokens + TOKENS_PER_CREDIT - 1) / TOKENS_PER_CREDIT
    }
}

/// First `limit` whitespace-separated words of `text`
#[must_use]
pub fn truncate_words(text: &str, limit: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= limit {
        text.trim().to_owned()
    } else {
        words[..limit].join(" ")
    }
}

/// Generate the narrative texts for one day
///
/// `provider` may be `None` (deployment without an LLM key); `skip_text`
/// reflects the `x-no-text` request header. Both paths return empty texts
/// and bill nothing.
pub async fn generate(
    provider: Option<&dyn LlmProvider>,
    date: &str,
    name: &str,
    language: &str,
    kpis: &Kpis,
    structured: &Value,
    skip_text: bool,
) -> NarrativeOutcome {
    if skip_text {
        debug!("narrative generation skipped by request flag");
        return NarrativeOutcome::skipped();
    }
    let Some(provider) = provider else {
        info!("no LLM provider configured, skipping narrative generation");
        return NarrativeOutcome::skipped();
    };

    let request = build_request(date, name, language, structured);
    match provider.complete(&request).await {
        Ok(response) if !response.content.trim().is_empty() => {
            let tokens = response
                .usage
                .map_or(0, |u| i64::from(u.total_tokens));
            debug!(tokens, model = %response.model, "narrative generated");
            NarrativeOutcome::from_long_form(response.content, tokens, GenerationStatus::Success)
        }
        Ok(_) => {
            warn!("LLM returned empty narrative, using fallback template");
            NarrativeOutcome::from_long_form(
                fallback_summary(date, name, language, kpis),
                0,
                GenerationStatus::Fallback,
            )
        }
        Err(e) => {
            warn!("narrative generation failed, using fallback template: {e}");
            NarrativeOutcome::from_long_form(
                fallback_summary(date, name, language, kpis),
                0,
                GenerationStatus::Fallback,
            )
        }
    }
}

/// Fixed 7-section outline the long form must follow
const SECTION_OUTLINE: &str = "\
1. Ernährung (Kalorien, Makros, Mahlzeiten)
2. Training (Volumen, Muskelgruppen, Intensität)
3. Körper (Gewicht, Messwerte)
4. Erholung (Schlaf, Regeneration)
5. Hydration & Supplemente
6. Erkenntnisse & Zusammenhänge
7. Empfehlungen für morgen";

fn build_request(date: &str, name: &str, language: &str, structured: &Value) -> ChatRequest {
    let system = format!(
        "Du bist ein persönlicher Gesundheitscoach. Schreibe eine Tageszusammenfassung \
         für {name} zum {date}. Sprich {name} direkt mit Namen an. Antworte in der \
         Sprache '{language}'. Gliedere den Text in genau diese sieben Abschnitte:\n\
         {SECTION_OUTLINE}\n\
         Nutze ausschließlich die gelieferten Daten, erfinde keine Werte."
    );
    let user = format!(
        "Strukturierte Tagesdaten als JSON:\n{}",
        serde_json::to_string_pretty(structured).unwrap_or_else(|_| structured.to_string())
    );

    ChatRequest::new(vec![ChatMessage::system(system), ChatMessage::user(user)])
        .with_temperature(0.7)
        .with_max_tokens(MAX_COMPLETION_TOKENS)
}

/// Deterministic template substituted when the LLM is unavailable
///
/// Built purely from KPI values; the same inputs always produce the same
/// text, and the user's name and the date always appear.
#[must_use]
pub fn fallback_summary(date: &str, name: &str, language: &str, kpis: &Kpis) -> String {
    let english = language.starts_with("en");

    let mut lines = Vec::new();
    if english {
        lines.push(format!("Hi {name}, here is your day summary for {date}."));
        lines.push(format!(
            "Nutrition: {:.0} kcal, {:.0} g protein, {:.0} g carbs, {:.0} g fat across {} logged meals.",
            kpis.total_calories, kpis.total_protein, kpis.total_carbs, kpis.total_fats, kpis.meals_logged
        ));
        lines.push(format!(
            "Training: {} sessions with a volume of {:.0} kg.",
            kpis.workout_count, kpis.workout_volume
        ));
        if let Some(hours) = kpis.sleep_hours {
            lines.push(format!("Recovery: {hours:.1} hours of sleep."));
        }
        if let Some(score) = kpis.hydration_score {
            lines.push(format!("Hydration: {score}% of your daily target."));
        }
        if let Some(compliance) = kpis.supplement_compliance {
            lines.push(format!("Supplements: {compliance}% taken as planned."));
        }
        if !kpis.daily_flags.is_empty() {
            lines.push(format!("Worth noting: {}.", kpis.daily_flags.join(", ")));
        }
        match kpis.coach_sentiment.motivation {
            MotivationLevel::High => lines.push("Keep riding that motivation.".to_owned()),
            MotivationLevel::Low => {
                lines.push("Take it easy tomorrow and focus on recovery.".to_owned());
            }
            MotivationLevel::Moderate => lines.push("Steady progress, keep going.".to_owned()),
        }
    } else {
        lines.push(format!("Hallo {name}, hier ist deine Tageszusammenfassung für den {date}."));
        lines.push(format!(
            "Ernährung: {:.0} kcal, {:.0} g Protein, {:.0} g Kohlenhydrate, {:.0} g Fett über {} Mahlzeiten.",
            kpis.total_calories, kpis.total_protein, kpis.total_carbs, kpis.total_fats, kpis.meals_logged
        ));
        lines.push(format!(
            "Training: {} Einheiten mit einem Volumen von {:.0} kg.",
            kpis.workout_count, kpis.workout_volume
        ));
        if let Some(hours) = kpis.sleep_hours {
            lines.push(format!("Erholung: {hours:.1} Stunden Schlaf."));
        }
        if let Some(score) = kpis.hydration_score {
            lines.push(format!("Hydration: {score}% deines Tagesziels."));
        }
        if let Some(compliance) = kpis.supplement_compliance {
            lines.push(format!("Supplemente: {compliance}% wie geplant eingenommen."));
        }
        if !kpis.daily_flags.is_empty() {
            lines.push(format!("Auffällig heute: {}.", kpis.daily_flags.join(", ")));
        }
        match kpis.coach_sentiment.motivation {
            MotivationLevel::High => lines.push("Nimm den Schwung mit in den nächsten Tag.".to_owned()),
            MotivationLevel::Low => {
                lines.push("Gönn dir morgen etwas Ruhe und achte auf deine Erholung.".to_owned());
            }
            MotivationLevel::Moderate => lines.push("Solide Basis, bleib dran.".to_owned()),
        }
    }

    lines.join(" ")
}
