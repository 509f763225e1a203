//! Turn history and end-of-session reporting.

use crate::api::Difficulty;
use crate::metrics::{EngagementMetrics, SpeechMetrics};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Speech and engagement metrics captured at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub speech: SpeechMetrics,
    pub engagement: EngagementMetrics,
}

impl MetricsSnapshot {
    /// Mean of delivery confidence and engagement score, rounded.
    pub fn combined_score(&self) -> u8 {
        let sum = self.speech.confidence_score as f64 + self.engagement.engagement_score as f64;
        (sum / 2.0).round() as u8
    }
}

/// One question/answer exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Question index, starting at 1
    pub number: u32,

    /// Question as asked
    pub question: String,

    /// Submitted answer text
    pub answer: String,

    /// Metrics frozen at submission time
    pub metrics: MetricsSnapshot,

    /// When the question was asked
    pub asked_at: DateTime<Utc>,

    /// When the answer was accepted
    pub answered_at: DateTime<Utc>,
}

/// End-of-session summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Local session label
    pub label: String,

    /// Server-assigned session id, empty if the session never started
    pub session_id: String,

    /// Role interviewed for
    pub position: String,

    /// Requested difficulty
    pub difficulty: Difficulty,

    /// When the session started
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Questions the server asked
    pub questions_asked: u32,

    /// Questions that received an answer
    pub questions_answered: u32,

    /// Mean words per minute across answered turns
    pub average_wpm: u32,

    /// Filler words across all answered turns
    pub total_filler_words: u32,

    /// Mean delivery confidence across answered turns
    pub average_confidence: u8,

    /// Engagement summary for the whole capture run
    pub engagement: EngagementMetrics,

    /// Overall performance score, always in [70, 100]
    pub overall_score: u8,

    /// Server feedback, if the completion response carried any
    pub feedback: Option<String>,

    /// Full exchange history
    pub turns: Vec<Turn>,
}

/// Mean words per minute across turns, rounded; 0 with no turns.
pub fn average_wpm(turns: &[Turn]) -> u32 {
    if turns.is_empty() {
        return 0;
    }
    let sum: u64 = turns
        .iter()
        .map(|t| t.metrics.speech.words_per_minute as u64)
        .sum();
    (sum as f64 / turns.len() as f64).round() as u32
}

/// Filler words summed across turns.
pub fn total_fillers(turns: &[Turn]) -> u32 {
    turns
        .iter()
        .map(|t| t.metrics.speech.filler_word_count)
        .sum()
}

/// Mean delivery confidence across turns, rounded; 0 with no turns.
pub fn average_confidence(turns: &[Turn]) -> u8 {
    if turns.is_empty() {
        return 0;
    }
    let sum: u64 = turns
        .iter()
        .map(|t| t.metrics.speech.confidence_score as u64)
        .sum();
    (sum as f64 / turns.len() as f64).round() as u8
}

/// Overall performance score: 70 baseline, +15 for ideal pacing, +10
/// for few fillers, +5 for answering everything, capped at 100.
pub fn performance_score(average_wpm: u32, total_fillers: u32, all_answered: bool) -> u8 {
    let mut score: u32 = 70;
    if (130..=160).contains(&average_wpm) {
        score += 15;
    }
    if total_fillers < 10 {
        score += 10;
    }
    if all_answered {
        score += 5;
    }
    score.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn_with(wpm: u32, fillers: u32, confidence: u8) -> Turn {
        Turn {
            number: 1,
            question: "q".to_string(),
            answer: "a".to_string(),
            metrics: MetricsSnapshot {
                speech: SpeechMetrics {
                    word_count: 0,
                    words_per_minute: wpm,
                    filler_word_count: fillers,
                    pause_count: 0,
                    confidence_score: confidence,
                },
                engagement: EngagementMetrics::default(),
            },
            asked_at: Utc::now(),
            answered_at: Utc::now(),
        }
    }

    #[test]
    fn test_averages_over_turns() {
        let turns = vec![
            turn_with(120, 3, 80),
            turn_with(150, 2, 90),
            turn_with(140, 1, 85),
        ];
        assert_eq!(average_wpm(&turns), 137);
        assert_eq!(total_fillers(&turns), 6);
        assert_eq!(average_confidence(&turns), 85);
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(average_wpm(&[]), 0);
        assert_eq!(total_fillers(&[]), 0);
        assert_eq!(average_confidence(&[]), 0);
    }

    #[test]
    fn test_performance_score_components() {
        // Baseline only.
        assert_eq!(performance_score(90, 20, false), 70);
        // Ideal pacing.
        assert_eq!(performance_score(145, 20, false), 85);
        // Few fillers.
        assert_eq!(performance_score(90, 9, false), 80);
        // Everything answered.
        assert_eq!(performance_score(90, 20, true), 75);
        // All bonuses: 70 + 15 + 10 + 5 = 100.
        assert_eq!(performance_score(130, 0, true), 100);
    }

    #[test]
    fn test_performance_score_boundaries() {
        assert_eq!(performance_score(129, 20, false), 70);
        assert_eq!(performance_score(130, 20, false), 85);
        assert_eq!(performance_score(160, 20, false), 85);
        assert_eq!(performance_score(161, 20, false), 70);
        assert_eq!(performance_score(90, 10, false), 70);
    }

    #[test]
    fn test_combined_score_rounds() {
        let snapshot = MetricsSnapshot {
            speech: SpeechMetrics {
                confidence_score: 85,
                ..Default::default()
            },
            engagement: EngagementMetrics {
                eye_contact_ratio: 70.0,
                engagement_score: 70,
                ..EngagementMetrics::default()
            },
        };
        // (85 + 70) / 2 = 77.5 rounds to 78.
        assert_eq!(snapshot.combined_score(), 78);
    }
}
