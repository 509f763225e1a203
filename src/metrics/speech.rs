//! Speech delivery metrics.
//!
//! Everything here is a pure function of the finalized transcript, the
//! elapsed capture time, and the pause counter the adapter maintains
//! from recognizer no-speech events. Metrics are recomputed in full on
//! every update rather than patched incrementally, so two calls with
//! the same inputs always agree.
//!
//! The confidence score is a heuristic scoring policy, not a fitted
//! model. The bands and adjustments below are the product's contract
//! and are pinned by tests.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Colloquial hedge words and phrases counted against fluency.
/// Matching is case-insensitive on whole-word boundaries; multi-word
/// phrases match across single spaces.
pub const FILLER_WORDS: [&str; 11] = [
    "um",
    "uh",
    "like",
    "you know",
    "actually",
    "basically",
    "literally",
    "sort of",
    "kind of",
    "i mean",
    "so",
];

/// Rolling speech metrics for the active turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechMetrics {
    /// Whitespace-tokenized word count of the finalized transcript.
    pub word_count: u32,

    /// Words per minute since capture started for this turn.
    pub words_per_minute: u32,

    /// Total filler word/phrase occurrences.
    pub filler_word_count: u32,

    /// Recognizer no-speech events this turn.
    pub pause_count: u32,

    /// Derived delivery confidence, always in [0, 100].
    pub confidence_score: u8,
}

/// Pacing classification shown alongside the raw WPM figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Clarity {
    Slow,
    Good,
    Fast,
}

impl Clarity {
    pub fn from_wpm(wpm: u32) -> Self {
        if wpm < 120 {
            Clarity::Slow
        } else if wpm <= 160 {
            Clarity::Good
        } else {
            Clarity::Fast
        }
    }
}

impl std::fmt::Display for Clarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Clarity::Slow => "slow",
            Clarity::Good => "good",
            Clarity::Fast => "fast",
        };
        write!(f, "{label}")
    }
}

/// Recompute all speech metrics from scratch.
///
/// `elapsed` is the time since the turn's capture started;
/// `pause_count` persists across recomputations within a turn and is
/// threaded through unchanged.
pub fn analyze(finalized_text: &str, elapsed: Duration, pause_count: u32) -> SpeechMetrics {
    let word_count = finalized_text.split_whitespace().count() as u32;
    let elapsed_minutes = elapsed.as_secs_f64() / 60.0;

    let words_per_minute = if elapsed_minutes > 0.0 {
        (word_count as f64 / elapsed_minutes).round() as u32
    } else {
        0
    };

    let filler_word_count = count_fillers(finalized_text);

    // Heuristic confidence: baseline 70, adjusted by pacing band,
    // filler ratio, and pause count, clamped to [0, 100].
    let mut confidence: i32 = 70;

    let wpm = words_per_minute;
    if (130..=160).contains(&wpm) {
        confidence += 15;
    } else if (110..130).contains(&wpm) {
        confidence += 10;
    } else if wpm > 160 && wpm <= 180 {
        confidence += 5;
    } else {
        // wpm < 110 or wpm > 180
        confidence -= 10;
    }

    let filler_ratio = if word_count > 0 {
        filler_word_count as f64 / word_count as f64
    } else {
        0.0
    };
    if filler_ratio < 0.02 {
        confidence += 10;
    } else if filler_ratio > 0.05 {
        confidence -= 15;
    }

    if pause_count > 5 {
        confidence -= 10;
    }

    SpeechMetrics {
        word_count,
        words_per_minute,
        filler_word_count,
        pause_count,
        confidence_score: confidence.clamp(0, 100) as u8,
    }
}

/// Live coaching hints derived from the current metrics.
pub fn coaching_hints(metrics: &SpeechMetrics, elapsed: Duration) -> Vec<String> {
    let mut hints = Vec::new();

    if metrics.words_per_minute < 100 {
        hints.push("Speak a bit faster - you seem hesitant".to_string());
    }
    if metrics.words_per_minute > 180 {
        hints.push("Slow down - speak more clearly".to_string());
    }
    if metrics.filler_word_count > 5 {
        hints.push("Try to reduce filler words like \"um\" and \"uh\"".to_string());
    }
    if metrics.word_count < 20 && elapsed > Duration::from_secs(30) {
        hints.push("Elaborate more on your answer".to_string());
    }

    hints
}

/// Count case-insensitive whole-word occurrences of every filler entry.
fn count_fillers(text: &str) -> u32 {
    let lower = text.to_lowercase();
    FILLER_WORDS
        .iter()
        .map(|filler| count_whole_word(&lower, filler))
        .sum()
}

/// Non-overlapping whole-word occurrences of `needle` in `haystack`.
/// Word characters are ASCII alphanumerics and underscore; `haystack`
/// must already be lowercased.
fn count_whole_word(haystack: &str, needle: &str) -> u32 {
    let mut count = 0;
    let mut search_from = 0;

    while let Some(pos) = haystack[search_from..].find(needle) {
        let start = search_from + pos;
        let end = start + needle.len();

        let boundary_before = start == 0
            || !haystack[..start]
                .chars()
                .next_back()
                .map(is_word_char)
                .unwrap_or(false);
        let boundary_after = end == haystack.len()
            || !haystack[end..].chars().next().map(is_word_char).unwrap_or(false);

        if boundary_before && boundary_after {
            count += 1;
            search_from = end;
        } else {
            search_from = start + 1;
        }
    }

    count
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
