pub mod adapter;
pub mod camera;
pub mod recognizer;
pub mod transcript;

pub use adapter::{AnswerCapture, AutoSubmitPolicy, CaptureDevices, InputMode, ModeWarning};
pub use camera::{
    CameraFeed, FaceDetector, FaceObservation, StaticFaceDetector, SyntheticCameraFeed,
    UnavailableCamera, VideoFrame,
};
pub use recognizer::{RecognizerEvent, ScriptedRecognizer, SpeechRecognizer, UnavailableRecognizer};
pub use transcript::TranscriptBuffer;
