//! Visual engagement metrics.
//!
//! The tracker consumes face observations from the camera pipeline and
//! maintains frame counters for the lifetime of the capture. Counters
//! are monotonic while the camera runs and survive turn boundaries;
//! only a capture restart resets them.
//!
//! Emotion readings come from a placeholder sampler until a real
//! classifier backs the face detector. The label set and confidence
//! range are part of the product contract and are kept stable so the
//! reporting side does not need to change when inference lands.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fraction of the frame treated as off-center on each edge. A face
/// whose center falls strictly inside the remaining middle region
/// counts as eye contact.
pub const EYE_CONTACT_MARGIN: f32 = 0.2;

/// Axis-aligned face box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Closed label set for the placeholder emotion channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Confident,
    Neutral,
    Nervous,
    Happy,
    Focused,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 5] = [
        EmotionLabel::Confident,
        EmotionLabel::Neutral,
        EmotionLabel::Nervous,
        EmotionLabel::Happy,
        EmotionLabel::Focused,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Confident => "confident",
            EmotionLabel::Neutral => "neutral",
            EmotionLabel::Nervous => "nervous",
            EmotionLabel::Happy => "happy",
            EmotionLabel::Focused => "focused",
        }
    }
}

impl std::fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single emotion sample with the sampler's confidence in it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionReading {
    pub label: EmotionLabel,
    pub confidence: f32,
}

/// Stand-in emotion source until a classifier is wired behind the face
/// detector. Draws a uniform label with confidence in [0.6, 0.9).
#[derive(Debug, Default)]
pub struct PlaceholderEmotionSampler;

impl PlaceholderEmotionSampler {
    pub fn sample(&self) -> EmotionReading {
        let mut rng = rand::thread_rng();
        let label = EmotionLabel::ALL[rng.gen_range(0..EmotionLabel::ALL.len())];
        EmotionReading {
            label,
            confidence: 0.6 + rng.gen::<f32>() * 0.3,
        }
    }
}

/// Point-in-time engagement summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    /// Whether the most recent frame contained a face.
    pub face_detected: bool,

    /// Percentage of analyzed frames with centered eye contact.
    pub eye_contact_ratio: f64,

    /// Frames where a face was found but its center sat outside the
    /// middle region.
    pub looking_away_count: u64,

    /// `eye_contact_ratio` rounded to a whole-number score.
    pub engagement_score: u8,

    /// Most frequently observed emotion so far, if any samples exist.
    pub dominant_emotion: Option<EmotionReading>,
}

impl Default for EngagementMetrics {
    fn default() -> Self {
        Self {
            face_detected: false,
            eye_contact_ratio: 0.0,
            looking_away_count: 0,
            engagement_score: 0,
            dominant_emotion: None,
        }
    }
}

/// Frame-by-frame engagement accumulator.
#[derive(Debug, Default)]
pub struct EngagementTracker {
    total_frames: u64,
    eye_contact_frames: u64,
    looking_away_count: u64,
    face_detected: bool,
    latest_emotion: Option<EmotionReading>,
    emotion_counts: std::collections::HashMap<EmotionLabel, u64>,
}

impl EngagementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one analyzed frame. The total counter advances whether or
    /// not a face was found; a found face advances either the eye
    /// contact counter or the looking-away counter depending on where
    /// its center sits. A frame without a face advances neither, so a
    /// single missed detection does not read as looking away.
    pub fn observe_frame(
        &mut self,
        frame_width: u32,
        frame_height: u32,
        face: Option<&BoundingBox>,
    ) {
        self.total_frames += 1;
        self.face_detected = face.is_some();
        if let Some(bbox) = face {
            if is_eye_contact(bbox, frame_width, frame_height) {
                self.eye_contact_frames += 1;
            } else {
                self.looking_away_count += 1;
            }
        }
    }

    /// Record an emotion sample taken alongside a detected face.
    pub fn record_emotion(&mut self, reading: EmotionReading) {
        *self.emotion_counts.entry(reading.label).or_insert(0) += 1;
        self.latest_emotion = Some(reading);
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn eye_contact_frames(&self) -> u64 {
        self.eye_contact_frames
    }

    pub fn looking_away_count(&self) -> u64 {
        self.looking_away_count
    }

    /// Whether the most recent frame contained a face.
    pub fn face_detected(&self) -> bool {
        self.face_detected
    }

    /// Percentage of frames with eye contact; 0 before any frame.
    pub fn eye_contact_ratio(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        100.0 * self.eye_contact_frames as f64 / self.total_frames as f64
    }

    /// Label seen most often, carrying the most recent reading's
    /// confidence for display. Ties resolve to the label observed
    /// most recently among the tied set.
    pub fn dominant_emotion(&self) -> Option<EmotionReading> {
        let latest = self.latest_emotion?;
        let (label, _) = self
            .emotion_counts
            .iter()
            .max_by_key(|(label, count)| (**count, (**label == latest.label) as u64))?;
        Some(EmotionReading {
            label: *label,
            confidence: latest.confidence,
        })
    }

    pub fn snapshot(&self) -> EngagementMetrics {
        let ratio = self.eye_contact_ratio();
        EngagementMetrics {
            face_detected: self.face_detected,
            eye_contact_ratio: ratio,
            looking_away_count: self.looking_away_count,
            engagement_score: ratio.round().clamp(0.0, 100.0) as u8,
            dominant_emotion: self.dominant_emotion(),
        }
    }

    /// Clear all counters. Called when the camera capture restarts, not
    /// between turns.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Eye contact test: the box center must fall strictly within the
/// middle 20%..80% band of the frame on both axes.
pub fn is_eye_contact(bbox: &BoundingBox, frame_width: u32, frame_height: u32) -> bool {
    if frame_width == 0 || frame_height == 0 {
        return false;
    }
    let (cx, cy) = bbox.center();
    let w = frame_width as f32;
    let h = frame_height as f32;

    cx > w * EYE_CONTACT_MARGIN
        && cx < w * (1.0 - EYE_CONTACT_MARGIN)
        && cy > h * EYE_CONTACT_MARGIN
        && cy < h * (1.0 - EYE_CONTACT_MARGIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centered_box(frame_w: f32, frame_h: f32) -> BoundingBox {
        BoundingBox {
            x: frame_w / 2.0 - 50.0,
            y: frame_h / 2.0 - 50.0,
            width: 100.0,
            height: 100.0,
        }
    }

    fn box_with_center(cx: f32, cy: f32) -> BoundingBox {
        BoundingBox {
            x: cx - 10.0,
            y: cy - 10.0,
            width: 20.0,
            height: 20.0,
        }
    }

    #[test]
    fn test_centered_face_is_eye_contact() {
        let bbox = centered_box(640.0, 480.0);
        assert!(is_eye_contact(&bbox, 640, 480));
    }

    #[test]
    fn test_margin_boundaries_are_strict() {
        // 640x480: margins at x=128/512, y=96/384. Centers exactly on
        // the line do not count.
        assert!(!is_eye_contact(&box_with_center(128.0, 240.0), 640, 480));
        assert!(!is_eye_contact(&box_with_center(512.0, 240.0), 640, 480));
        assert!(!is_eye_contact(&box_with_center(320.0, 96.0), 640, 480));
        assert!(!is_eye_contact(&box_with_center(320.0, 384.0), 640, 480));

        assert!(is_eye_contact(&box_with_center(128.5, 240.0), 640, 480));
        assert!(is_eye_contact(&box_with_center(320.0, 383.5), 640, 480));
    }

    #[test]
    fn test_corner_face_is_not_eye_contact() {
        let bbox = BoundingBox {
            x: 0.0,
            y: 0.0,
            width: 60.0,
            height: 60.0,
        };
        assert!(!is_eye_contact(&bbox, 640, 480));
    }

    #[test]
    fn test_total_frames_advance_without_face() {
        let mut tracker = EngagementTracker::new();
        tracker.observe_frame(640, 480, None);
        tracker.observe_frame(640, 480, None);
        assert_eq!(tracker.total_frames(), 2);
        assert_eq!(tracker.eye_contact_frames(), 0);
        assert_eq!(tracker.eye_contact_ratio(), 0.0);
        // Missed detections are not looking-away events.
        assert_eq!(tracker.looking_away_count(), 0);
        assert!(!tracker.face_detected());
    }

    #[test]
    fn test_off_center_face_counts_looking_away() {
        let mut tracker = EngagementTracker::new();
        let corner = box_with_center(30.0, 30.0);
        tracker.observe_frame(640, 480, Some(&corner));
        tracker.observe_frame(640, 480, Some(&corner));
        assert_eq!(tracker.looking_away_count(), 2);
        assert_eq!(tracker.eye_contact_frames(), 0);
        assert!(tracker.face_detected());
    }

    #[test]
    fn test_face_detected_tracks_latest_frame() {
        let mut tracker = EngagementTracker::new();
        let good = centered_box(640.0, 480.0);
        tracker.observe_frame(640, 480, Some(&good));
        assert!(tracker.face_detected());
        tracker.observe_frame(640, 480, None);
        assert!(!tracker.face_detected());
        assert!(!tracker.snapshot().face_detected);
    }

    #[test]
    fn test_ratio_and_score() {
        let mut tracker = EngagementTracker::new();
        let good = centered_box(640.0, 480.0);
        // 3 of 4 frames centered: 75%.
        tracker.observe_frame(640, 480, Some(&good));
        tracker.observe_frame(640, 480, Some(&good));
        tracker.observe_frame(640, 480, Some(&good));
        tracker.observe_frame(640, 480, None);

        assert_eq!(tracker.eye_contact_ratio(), 75.0);
        let snap = tracker.snapshot();
        assert_eq!(snap.engagement_score, 75);
    }

    #[test]
    fn test_score_rounds_ratio() {
        let mut tracker = EngagementTracker::new();
        let good = centered_box(640.0, 480.0);
        // 2 of 3 frames: 66.66..% rounds to 67.
        tracker.observe_frame(640, 480, Some(&good));
        tracker.observe_frame(640, 480, Some(&good));
        tracker.observe_frame(640, 480, None);
        assert_eq!(tracker.snapshot().engagement_score, 67);
    }

    #[test]
    fn test_counters_monotonic_until_reset() {
        let mut tracker = EngagementTracker::new();
        let good = centered_box(640.0, 480.0);
        let corner = box_with_center(30.0, 30.0);
        tracker.observe_frame(640, 480, Some(&good));
        tracker.observe_frame(640, 480, Some(&corner));
        let after_first = tracker.total_frames();
        tracker.observe_frame(640, 480, None);
        assert!(tracker.total_frames() > after_first);
        assert_eq!(tracker.looking_away_count(), 1);

        tracker.reset();
        assert_eq!(tracker.total_frames(), 0);
        assert_eq!(tracker.eye_contact_frames(), 0);
        assert_eq!(tracker.looking_away_count(), 0);
        assert_eq!(tracker.snapshot(), EngagementMetrics::default());
    }

    #[test]
    fn test_dominant_emotion_by_count() {
        let mut tracker = EngagementTracker::new();
        let reading = |label, confidence| EmotionReading { label, confidence };
        tracker.record_emotion(reading(EmotionLabel::Nervous, 0.7));
        tracker.record_emotion(reading(EmotionLabel::Confident, 0.8));
        tracker.record_emotion(reading(EmotionLabel::Confident, 0.65));

        let dominant = tracker.dominant_emotion().unwrap();
        assert_eq!(dominant.label, EmotionLabel::Confident);
        // Confidence comes from the latest sample.
        assert_eq!(dominant.confidence, 0.65);
    }

    #[test]
    fn test_no_emotion_before_first_sample() {
        let tracker = EngagementTracker::new();
        assert!(tracker.dominant_emotion().is_none());
        assert!(tracker.snapshot().dominant_emotion.is_none());
    }

    #[test]
    fn test_placeholder_sampler_bounds() {
        let sampler = PlaceholderEmotionSampler;
        for _ in 0..100 {
            let reading = sampler.sample();
            assert!(reading.confidence >= 0.6);
            assert!(reading.confidence < 0.9);
            assert!(EmotionLabel::ALL.contains(&reading.label));
        }
    }
}
