pub mod engagement;
pub mod speech;

pub use engagement::{
    BoundingBox, EmotionLabel, EmotionReading, EngagementMetrics, EngagementTracker,
    PlaceholderEmotionSampler,
};
pub use speech::{Clarity, SpeechMetrics, FILLER_WORDS};
