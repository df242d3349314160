// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lexicon-based emotion detection.
//!
//! A keyword lookup, not a model: each emotion class has a word list, and
//! the class with the most hits wins. When no class matches, a small
//! valence lexicon decides between joy, sadness, and no reading at all.
//! The resulting label is stored verbatim by the memory system, which
//! places no constraint on the vocabulary.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Emotion classes recognized by the detector.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Joy,
    Sadness,
    Anger,
    Fear,
    Surprise,
    Disgust,
    Love,
    Excitement,
}

/// Overall message valence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// How strongly the emotion comes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

/// One analysis result for a user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionReading {
    pub emotion: Emotion,
    pub sentiment: Sentiment,
    pub intensity: Intensity,
}

impl EmotionReading {
    /// The label stored alongside the message.
    pub fn label(&self) -> String {
        self.emotion.to_string()
    }
}

/// Keyword lists per emotion class. Checked in declaration order, which
/// doubles as the tie-break.
const EMOTION_LEXICON: &[(Emotion, &[&str])] = &[
    (
        Emotion::Joy,
        &[
            "happy", "glad", "great", "wonderful", "awesome", "perfect", "amazing", "fantastic",
            "excellent", "yay", "😊", "😄", "🎉",
        ],
    ),
    (
        Emotion::Sadness,
        &[
            "sad", "unhappy", "depressed", "down", "upset", "disappointed", "miserable", "hurt",
            "cry", "crying", "😢", "😞", "💔",
        ],
    ),
    (
        Emotion::Anger,
        &[
            "angry", "mad", "furious", "annoyed", "frustrated", "irritated", "rage", "hate",
            "😠", "😡",
        ],
    ),
    (
        Emotion::Fear,
        &[
            "scared", "afraid", "worried", "anxious", "nervous", "terrified", "panic", "stress",
            "stressed", "😰", "😨",
        ],
    ),
    (
        Emotion::Surprise,
        &[
            "surprised", "shocked", "amazed", "unexpected", "wow", "omg", "incredible",
            "unbelievable", "😲", "😮",
        ],
    ),
    (
        Emotion::Disgust,
        &[
            "disgusting", "gross", "awful", "terrible", "horrible", "nasty", "revolting", "🤢",
        ],
    ),
    (
        Emotion::Love,
        &[
            "love", "adore", "cherish", "affection", "care", "appreciate", "grateful",
            "thankful", "❤️", "💕", "🥰",
        ],
    ),
    (
        Emotion::Excitement,
        &[
            "excited", "thrilled", "eager", "pumped", "hyped", "enthusiastic", "can't wait",
            "🔥", "⚡",
        ],
    ),
];

const POSITIVE_WORDS: &[&str] = &[
    "good", "nice", "fine", "well", "better", "best", "cool", "fun", "enjoy", "like", "yes",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "worse", "worst", "wrong", "problem", "fail", "failed", "no", "never", "tired",
    "bored", "lonely",
];

/// Detects emotions from user messages via keyword lookup.
#[derive(Debug, Default)]
pub struct EmotionDetector;

impl EmotionDetector {
    pub fn new() -> Self {
        Self
    }

    /// Analyze a message. Returns `None` when nothing emotional registers,
    /// which callers store as a null emotion.
    pub fn analyze(&self, text: &str) -> Option<EmotionReading> {
        let lower = text.to_lowercase();

        let mut best: Option<(Emotion, usize)> = None;
        for (emotion, keywords) in EMOTION_LEXICON {
            let hits = keywords.iter().filter(|k| lower.contains(*k)).count();
            if hits > 0 && best.is_none_or(|(_, n)| hits > n) {
                best = Some((*emotion, hits));
            }
        }

        let positive = POSITIVE_WORDS.iter().filter(|w| contains_word(&lower, w)).count() as i64;
        let negative = NEGATIVE_WORDS.iter().filter(|w| contains_word(&lower, w)).count() as i64;
        let valence = positive - negative;

        let (emotion, hits) = match best {
            Some(found) => found,
            None if valence >= 2 => (Emotion::Joy, 1),
            None if valence <= -2 => (Emotion::Sadness, 1),
            None => return None,
        };

        let sentiment = match emotion {
            Emotion::Joy | Emotion::Love | Emotion::Excitement => Sentiment::Positive,
            Emotion::Surprise => {
                if valence < 0 {
                    Sentiment::Negative
                } else {
                    Sentiment::Positive
                }
            }
            _ => Sentiment::Negative,
        };

        let intensity = match hits {
            0 | 1 => Intensity::Low,
            2 => Intensity::Medium,
            _ => Intensity::High,
        };

        Some(EmotionReading {
            emotion,
            sentiment,
            intensity,
        })
    }
}

/// Whole-word match, so "no" does not fire inside "know".
fn contains_word(haystack: &str, word: &str) -> bool {
    haystack
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .any(|w| w == word)
}
