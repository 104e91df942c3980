// ABOUTME: Keyword-based sentiment and topic classification for coach conversations
// ABOUTME: Deliberately crude heuristic behind a trait so it can be swapped for a real classifier
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Daybrief

//! # Coach Conversation Sentiment
//!
//! Classifies the day's user-authored coach messages into a sentiment,
//! a motivation level, and up to four conversation topics. The default
//! implementation is a fixed keyword counter over German vocabulary - not
//! NLP, and not pretending to be. The `SentimentClassifier` trait is the
//! seam for replacing it without touching the KPI calculator.

use crate::models::CoachMessage;
use serde::{Deserialize, Serialize};

/// Overall sentiment of the day's coach conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Motivation level derived in lockstep with sentiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotivationLevel {
    High,
    Moderate,
    Low,
}

/// Classification result for one day of coach messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachSentiment {
    pub sentiment: Sentiment,
    pub motivation: MotivationLevel,
    /// Detected conversation topics, capped at four
    pub topics: Vec<String>,
    /// Number of user-authored messages considered
    pub message_count: usize,
}

impl CoachSentiment {
    /// Neutral result for days without any user messages
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            sentiment: Sentiment::Neutral,
            motivation: MotivationLevel::Moderate,
            topics: Vec::new(),
            message_count: 0,
        }
    }
}

/// Strategy interface for coach-message classification
pub trait SentimentClassifier: Send + Sync {
    /// Classify the day's messages; only `role == "user"` messages count
    fn classify(&self, messages: &[CoachMessage]) -> CoachSentiment;
}

/// Maximum number of topics surfaced per day
const MAX_TOPICS: usize = 4;

/// Positive vocabulary (German, lowercase substring match)
const POSITIVE_KEYWORDS: &[&str] = &[
    "gut",
    "super",
    "toll",
    "stark",
    "besser",
    "motiviert",
    "energie",
    "fortschritt",
    "geschafft",
    "zufrieden",
    "stolz",
];

/// Negative vocabulary (German, lowercase substring match)
const NEGATIVE_KEYWORDS: &[&str] = &[
    "müde",
    "schlecht",
    "erschöpft",
    "stress",
    "schmerz",
    "frustriert",
    "schlapp",
    "krank",
    "aufgeben",
    "keine lust",
];

/// Topic label and the substrings that trigger it, in surfacing order
const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    ("sleep", &["schlaf", "ausgeschlafen", "müde"]),
    ("nutrition", &["essen", "ernährung", "mahlzeit", "kalorien", "hunger"]),
    ("training", &["training", "workout", "übung", "sport"]),
    ("stress", &["stress", "druck", "hektik"]),
    ("motivation", &["motivation", "motiviert", "antrieb"]),
    ("weight", &["gewicht", "abnehmen", "zunehmen", "waage"]),
    ("exhaustion", &["erschöpft", "erschöpfung", "ausgelaugt", "kaputt"]),
    ("goals", &["ziel", "vorsatz"]),
];

/// Fixed keyword-list classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordSentimentClassifier;

impl KeywordSentimentClassifier {
    fn count_hits(text: &str, keywords: &[&str]) -> usize {
        keywords
            .iter()
            .map(|keyword| text.matches(keyword).count())
            .sum()
    }
}

impl SentimentClassifier for KeywordSentimentClassifier {
    fn classify(&self, messages: &[CoachMessage]) -> CoachSentiment {
        let user_texts: Vec<String> = messages
            .iter()
            .filter(|m| m.role == "user")
            .map(|m| m.content.to_lowercase())
            .collect();

        if user_texts.is_empty() {
            return CoachSentiment::neutral();
        }

        let mut positive = 0;
        let mut negative = 0;
        for text in &user_texts {
            positive += Self::count_hits(text, POSITIVE_KEYWORDS);
            negative += Self::count_hits(text, NEGATIVE_KEYWORDS);
        }

        let (sentiment, motivation) = if positive > negative {
            (Sentiment::Positive, MotivationLevel::High)
        } else if negative > positive {
            (Sentiment::Negative, MotivationLevel::Low)
        } else {
            (Sentiment::Neutral, MotivationLevel::Moderate)
        };

        let mut topics = Vec::new();
        for (topic, keywords) in TOPIC_KEYWORDS {
            if topics.len() >= MAX_TOPICS {
                break;
            }
            let mentioned = user_texts
                .iter()
                .any(|text| keywords.iter().any(|k| text.contains(k)));
            if mentioned {
                topics.push((*topic).to_owned());
            }
        }

        CoachSentiment {
            sentiment,
            motivation,
            topics,
            message_count: user_texts.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(role: &str, content: &str) -> CoachMessage {
        CoachMessage {
            id: "m1".to_owned(),
            user_id: "u1".to_owned(),
            date: "2024-03-01".to_owned(),
            created_at: None,
            role: role.to_owned(),
            content: content.to_owned(),
        }
    }

    #[test]
    fn test_positive_outweighs_negative() {
        let messages = vec![message(
            "user",
            "Training war super, ich bin stolz und voller Energie, nur etwas müde",
        )];
        let result = KeywordSentimentClassifier.classify(&messages);
        assert_eq!(result.sentiment, Sentiment::Positive);
        assert_eq!(result.motivation, MotivationLevel::High);
    }

    #[test]
    fn test_negative_sentiment_and_low_motivation() {
        let messages = vec![message("user", "Bin total erschöpft, alles schlecht, so viel Stress")];
        let result = KeywordSentimentClassifier.classify(&messages);
        assert_eq!(result.sentiment, Sentiment::Negative);
        assert_eq!(result.motivation, MotivationLevel::Low);
    }

    #[test]
    fn test_assistant_messages_are_ignored() {
        let messages = vec![message("assistant", "Super gemacht, toller Fortschritt!")];
        let result = KeywordSentimentClassifier.classify(&messages);
        assert_eq!(result.sentiment, Sentiment::Neutral);
        assert_eq!(result.message_count, 0);
    }

    #[test]
    fn test_topics_are_capped_at_four() {
        let messages = vec![message(
            "user",
            "Schlaf war kurz, Essen unregelmäßig, Training hart, viel Stress, \
             Motivation weg, Gewicht stagniert",
        )];
        let result = KeywordSentimentClassifier.classify(&messages);
        assert_eq!(result.topics.len(), 4);
        assert_eq!(result.topics, vec!["sleep", "nutrition", "training", "stress"]);
    }

    #[test]
    fn test_no_messages_is_neutral() {
        let result = KeywordSentimentClassifier.classify(&[]);
        assert_eq!(result.sentiment, Sentiment::Neutral);
        assert_eq!(result.motivation, MotivationLevel::Moderate);
        assert!(result.topics.is_empty());
    }
}
