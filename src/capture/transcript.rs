//! Turn transcript accumulation.
//!
//! A `TranscriptBuffer` holds the words captured for the answer in
//! progress: finalized segments committed by the recognizer plus the
//! current low-latency interim hypothesis. Only finalized text feeds
//! the speech metrics and the submitted answer; interim text exists
//! for display and is replaced or cleared as recognition progresses.

/// Accumulated transcript for a single answer.
#[derive(Debug, Default)]
pub struct TranscriptBuffer {
    /// Finalized segments joined by single spaces.
    finalized: String,

    /// Current interim hypothesis, not yet committed.
    interim: String,
}

impl TranscriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit a finalized segment. Whitespace at the joint is
    /// normalized to a single space; empty segments are dropped.
    pub fn push_final(&mut self, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        if !self.finalized.is_empty() {
            self.finalized.push(' ');
        }
        self.finalized.push_str(trimmed);
        self.interim.clear();
    }

    /// Replace the interim hypothesis.
    pub fn set_interim(&mut self, text: &str) {
        self.interim.clear();
        self.interim.push_str(text.trim());
    }

    /// Finalized text only. This is what metrics and submission see.
    pub fn finalized(&self) -> &str {
        &self.finalized
    }

    pub fn interim(&self) -> &str {
        &self.interim
    }

    /// Finalized plus interim, for live display.
    pub fn display_text(&self) -> String {
        if self.interim.is_empty() {
            self.finalized.clone()
        } else if self.finalized.is_empty() {
            self.interim.clone()
        } else {
            format!("{} {}", self.finalized, self.interim)
        }
    }

    /// Character length of the finalized text, used by the silence
    /// auto-submit threshold.
    pub fn finalized_len(&self) -> usize {
        self.finalized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.finalized.is_empty() && self.interim.is_empty()
    }

    pub fn clear(&mut self) {
        self.finalized.clear();
        self.interim.clear();
    }
}
