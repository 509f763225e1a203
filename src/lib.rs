pub mod api;
pub mod capture;
pub mod config;
pub mod error;
pub mod metrics;
pub mod session;

pub use api::{
    AnswerOutcome, AnswerRequest, Artifact, Difficulty, HttpInterviewApi, InterviewApi,
    InterviewRecord, InterviewSummary, SessionOpened, StartRequest,
};
pub use capture::{
    AnswerCapture, AutoSubmitPolicy, CaptureDevices, InputMode, ModeWarning, ScriptedRecognizer,
    SpeechRecognizer, StaticFaceDetector, SyntheticCameraFeed,
};
pub use config::{ApiConfig, CaptureConfig, Config, InterviewDefaults};
pub use error::{CaptureError, CoachError, Result};
pub use metrics::{Clarity, EngagementMetrics, EngagementTracker, SpeechMetrics};
pub use session::{
    InterviewSession, MetricsSnapshot, SessionConfig, SessionReport, SessionState, StartPolicy,
    Turn,
};
