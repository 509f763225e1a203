//! Input mode adapter.
//!
//! `AnswerCapture` presents one capture surface to the session
//! regardless of input mode. In text mode answers arrive through
//! `push_typed`; in speech mode a recognizer task feeds the transcript
//! buffer; in video mode an engagement task additionally consumes
//! camera frames. Unavailable collaborators degrade the mode instead
//! of failing the session: no recognizer means typed input, no camera
//! means audio-only.

use super::camera::{CameraFeed, FaceDetector};
use super::recognizer::{RecognizerEvent, SpeechRecognizer};
use super::transcript::TranscriptBuffer;
use crate::error::Result;
use crate::metrics::engagement::EngagementTracker;
use crate::metrics::speech::{self, SpeechMetrics};
use crate::metrics::EngagementMetrics;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// How the candidate answers questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Typed answers only.
    Text,
    /// Spoken answers with live speech metrics.
    Speech,
    /// Spoken answers plus camera engagement tracking.
    Video,
}

impl InputMode {
    pub fn wants_speech(&self) -> bool {
        matches!(self, InputMode::Speech | InputMode::Video)
    }

    pub fn wants_camera(&self) -> bool {
        matches!(self, InputMode::Video)
    }
}

impl Default for InputMode {
    fn default() -> Self {
        InputMode::Text
    }
}

impl std::str::FromStr for InputMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(InputMode::Text),
            "speech" => Ok(InputMode::Speech),
            "video" => Ok(InputMode::Video),
            other => Err(format!(
                "unknown input mode '{other}' (expected text, speech, or video)"
            )),
        }
    }
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            InputMode::Text => "text",
            InputMode::Speech => "speech",
            InputMode::Video => "video",
        };
        write!(f, "{label}")
    }
}

/// A degradation that happened while setting up or running capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeWarning {
    SpeechUnavailable(String),
    CameraUnavailable(String),
}

impl std::fmt::Display for ModeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModeWarning::SpeechUnavailable(detail) => {
                write!(f, "speech input unavailable ({detail}), answers fall back to typed text")
            }
            ModeWarning::CameraUnavailable(detail) => {
                write!(f, "camera unavailable ({detail}), continuing without engagement tracking")
            }
        }
    }
}

/// Silence-driven auto submission. Disabled by default; the realistic
/// interview flow opts in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSubmitPolicy {
    /// Signal submission after a silence window with enough content.
    pub enabled: bool,

    /// Silence duration that triggers the content check.
    pub silence_ms: u64,

    /// Finalized transcript must exceed this many characters.
    pub min_chars: usize,
}

impl Default for AutoSubmitPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            silence_ms: 3000,
            min_chars: 20,
        }
    }
}

impl AutoSubmitPolicy {
    pub fn silence_window(&self) -> Duration {
        Duration::from_millis(self.silence_ms)
    }
}

/// Capture collaborators injected at start. Text mode needs none.
pub struct CaptureDevices {
    pub recognizer: Option<Box<dyn SpeechRecognizer>>,
    pub camera: Option<Box<dyn CameraFeed>>,
    pub detector: Option<Box<dyn FaceDetector>>,
}

impl CaptureDevices {
    pub fn none() -> Self {
        Self {
            recognizer: None,
            camera: None,
            detector: None,
        }
    }

    pub fn speech(recognizer: Box<dyn SpeechRecognizer>) -> Self {
        Self {
            recognizer: Some(recognizer),
            camera: None,
            detector: None,
        }
    }

    pub fn video(
        recognizer: Box<dyn SpeechRecognizer>,
        camera: Box<dyn CameraFeed>,
        detector: Box<dyn FaceDetector>,
    ) -> Self {
        Self {
            recognizer: Some(recognizer),
            camera: Some(camera),
            detector: Some(detector),
        }
    }
}

/// Unified answer capture across input modes.
pub struct AnswerCapture {
    /// Requested input mode
    mode: InputMode,

    /// Silence auto-submit policy
    auto_submit: AutoSubmitPolicy,

    /// Transcript for the answer in progress
    transcript: Arc<Mutex<TranscriptBuffer>>,

    /// Recognizer no-speech events this turn
    pause_count: Arc<AtomicU32>,

    /// Engagement counters for the whole capture run
    engagement: Arc<Mutex<EngagementTracker>>,

    /// Degradations recorded so far
    warnings: Arc<Mutex<Vec<ModeWarning>>>,

    /// Whether capture is currently active
    is_capturing: Arc<AtomicBool>,

    /// Whether the speech channel is live
    speech_active: Arc<AtomicBool>,

    /// Whether the camera channel is live
    camera_active: Arc<AtomicBool>,

    /// Shutdown signal observed by both capture tasks
    shutdown_tx: watch::Sender<bool>,

    /// Handle for the speech event task
    speech_task_handle: Arc<Mutex<Option<JoinHandle<()>>>>,

    /// Handle for the engagement analysis task
    camera_task_handle: Arc<Mutex<Option<JoinHandle<()>>>>,

    /// When the current turn's capture window opened
    turn_started_at: Arc<Mutex<Option<Instant>>>,

    /// Bumped on every state change, for live display
    updates_tx: Arc<watch::Sender<u64>>,

    /// Signaled when the silence policy decides the answer is done
    auto_submit_signal: Arc<Notify>,
}

impl AnswerCapture {
    pub fn new(mode: InputMode, auto_submit: AutoSubmitPolicy) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        let (updates_tx, _) = watch::channel(0u64);

        Self {
            mode,
            auto_submit,
            transcript: Arc::new(Mutex::new(TranscriptBuffer::new())),
            pause_count: Arc::new(AtomicU32::new(0)),
            engagement: Arc::new(Mutex::new(EngagementTracker::new())),
            warnings: Arc::new(Mutex::new(Vec::new())),
            is_capturing: Arc::new(AtomicBool::new(false)),
            speech_active: Arc::new(AtomicBool::new(false)),
            camera_active: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            speech_task_handle: Arc::new(Mutex::new(None)),
            camera_task_handle: Arc::new(Mutex::new(None)),
            turn_started_at: Arc::new(Mutex::new(None)),
            updates_tx: Arc::new(updates_tx),
            auto_submit_signal: Arc::new(Notify::new()),
        }
    }

    /// Start capture with the given collaborators.
    ///
    /// A restart clears engagement counters along with all per-turn
    /// state. Degradable collaborator failures are recorded as
    /// warnings; only unexpected failures surface as errors.
    pub async fn start(&self, devices: CaptureDevices) -> Result<()> {
        if self.is_capturing.load(Ordering::SeqCst) {
            warn!("Capture already started");
            return Ok(());
        }

        info!("Starting answer capture in {} mode", self.mode);

        // Fresh run: clear everything a previous run accumulated.
        self.transcript.lock().await.clear();
        self.engagement.lock().await.reset();
        self.warnings.lock().await.clear();
        self.pause_count.store(0, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(false);

        self.is_capturing.store(true, Ordering::SeqCst);
        *self.turn_started_at.lock().await = Some(Instant::now());

        if self.mode.wants_speech() {
            match devices.recognizer {
                Some(recognizer) => self.spawn_speech_task(recognizer).await?,
                None => {
                    self.record_warning(ModeWarning::SpeechUnavailable(
                        "no recognizer configured".to_string(),
                    ))
                    .await;
                }
            }
        }

        if self.mode.wants_camera() {
            match (devices.camera, devices.detector) {
                (Some(camera), Some(detector)) => {
                    self.spawn_camera_task(camera, detector).await?
                }
                _ => {
                    self.record_warning(ModeWarning::CameraUnavailable(
                        "no camera configured".to_string(),
                    ))
                    .await;
                }
            }
        }

        info!("Answer capture started");
        Ok(())
    }

    /// Stop capture and wait for both tasks to finish.
    ///
    /// Accumulated state (transcript, counters, warnings) stays
    /// readable after stop so reports can be assembled.
    pub async fn stop(&self) -> Result<()> {
        if !self.is_capturing.load(Ordering::SeqCst) {
            warn!("Capture not active");
            return Ok(());
        }

        info!("Stopping answer capture");

        self.is_capturing.store(false, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(true);

        {
            let mut handle = self.speech_task_handle.lock().await;
            if let Some(task) = handle.take() {
                if let Err(e) = task.await {
                    error!("Speech capture task panicked: {}", e);
                }
            }
        }

        {
            let mut handle = self.camera_task_handle.lock().await;
            if let Some(task) = handle.take() {
                if let Err(e) = task.await {
                    error!("Engagement analysis task panicked: {}", e);
                }
            }
        }

        self.speech_active.store(false, Ordering::SeqCst);
        self.camera_active.store(false, Ordering::SeqCst);

        info!("Answer capture stopped");
        Ok(())
    }

    /// Open the capture window for a new turn: transcript and pause
    /// counter reset, engagement counters deliberately kept.
    pub async fn begin_turn(&self) {
        self.transcript.lock().await.clear();
        self.pause_count.store(0, Ordering::SeqCst);
        *self.turn_started_at.lock().await = Some(Instant::now());
        self.updates_tx.send_modify(|v| *v += 1);
    }

    /// Typed input path. Usable in every mode; the only path once
    /// speech has degraded.
    pub async fn push_typed(&self, text: &str) {
        self.transcript.lock().await.push_final(text);
        self.updates_tx.send_modify(|v| *v += 1);
    }

    /// Replace the turn's transcript with typed text, keeping the
    /// turn clock. Retried submissions stay idempotent.
    pub async fn replace_typed(&self, text: &str) {
        {
            let mut transcript = self.transcript.lock().await;
            transcript.clear();
            transcript.push_final(text);
        }
        self.updates_tx.send_modify(|v| *v += 1);
    }

    /// Finalized answer text for the current turn.
    pub async fn answer_text(&self) -> String {
        self.transcript.lock().await.finalized().to_string()
    }

    /// Finalized plus interim text, for live display.
    pub async fn display_text(&self) -> String {
        self.transcript.lock().await.display_text()
    }

    /// Recompute speech metrics from the current turn state.
    pub async fn speech_metrics(&self) -> SpeechMetrics {
        let text = self.answer_text().await;
        speech::analyze(&text, self.turn_elapsed().await, self.pause_count())
    }

    /// Current engagement summary across the capture run.
    pub async fn engagement_metrics(&self) -> EngagementMetrics {
        self.engagement.lock().await.snapshot()
    }

    pub async fn turn_elapsed(&self) -> Duration {
        self.turn_started_at
            .lock()
            .await
            .map(|t| t.elapsed())
            .unwrap_or_default()
    }

    pub fn pause_count(&self) -> u32 {
        self.pause_count.load(Ordering::SeqCst)
    }

    pub fn is_capturing(&self) -> bool {
        self.is_capturing.load(Ordering::SeqCst)
    }

    /// Mode the capture was asked for.
    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Mode actually in effect after degradations.
    pub fn effective_mode(&self) -> InputMode {
        if self.camera_active.load(Ordering::SeqCst) {
            InputMode::Video
        } else if self.speech_active.load(Ordering::SeqCst) {
            InputMode::Speech
        } else {
            InputMode::Text
        }
    }

    pub async fn warnings(&self) -> Vec<ModeWarning> {
        self.warnings.lock().await.clone()
    }

    /// Watch channel bumped on every capture state change.
    pub fn subscribe_updates(&self) -> watch::Receiver<u64> {
        self.updates_tx.subscribe()
    }

    /// Notified when the silence policy decides the answer is done.
    pub fn auto_submit_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.auto_submit_signal)
    }

    async fn record_warning(&self, warning: ModeWarning) {
        warn!("{}", warning);
        self.warnings.lock().await.push(warning);
        self.updates_tx.send_modify(|v| *v += 1);
    }

    async fn spawn_speech_task(&self, mut recognizer: Box<dyn SpeechRecognizer>) -> Result<()> {
        let mut rx = match recognizer.start().await {
            Ok(rx) => rx,
            Err(e) if e.is_degradable() => {
                self.record_warning(ModeWarning::SpeechUnavailable(e.to_string()))
                    .await;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        self.speech_active.store(true, Ordering::SeqCst);

        let transcript = Arc::clone(&self.transcript);
        let pause_count = Arc::clone(&self.pause_count);
        let warnings = Arc::clone(&self.warnings);
        let is_capturing = Arc::clone(&self.is_capturing);
        let speech_active = Arc::clone(&self.speech_active);
        let updates = Arc::clone(&self.updates_tx);
        let auto_submit = Arc::clone(&self.auto_submit_signal);
        let policy = self.auto_submit.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let task = tokio::spawn(async move {
            info!("Speech capture task started ({})", recognizer.name());

            let silence = policy.silence_window();
            let idle = tokio::time::sleep(silence);
            tokio::pin!(idle);
            // Set once the signal fires, cleared by new speech, so a
            // long silence does not signal repeatedly.
            let mut silence_fired = false;

            loop {
                if !is_capturing.load(Ordering::SeqCst) {
                    break;
                }

                tokio::select! {
                    _ = shutdown_rx.changed() => break,

                    () = &mut idle, if policy.enabled && !silence_fired => {
                        let chars = transcript.lock().await.finalized_len();
                        if chars > policy.min_chars {
                            info!("Silence window elapsed with {} chars, signaling auto submit", chars);
                            silence_fired = true;
                            auto_submit.notify_one();
                        } else {
                            idle.as_mut().reset(tokio::time::Instant::now() + silence);
                        }
                    }

                    event = rx.recv() => match event {
                        Some(RecognizerEvent::Partial(text)) => {
                            if !is_capturing.load(Ordering::SeqCst) {
                                break;
                            }
                            transcript.lock().await.set_interim(&text);
                            silence_fired = false;
                            idle.as_mut().reset(tokio::time::Instant::now() + silence);
                            updates.send_modify(|v| *v += 1);
                        }
                        Some(RecognizerEvent::Final(text)) => {
                            if !is_capturing.load(Ordering::SeqCst) {
                                break;
                            }
                            transcript.lock().await.push_final(&text);
                            silence_fired = false;
                            idle.as_mut().reset(tokio::time::Instant::now() + silence);
                            updates.send_modify(|v| *v += 1);
                        }
                        Some(RecognizerEvent::NoSpeech) => {
                            pause_count.fetch_add(1, Ordering::SeqCst);
                            updates.send_modify(|v| *v += 1);
                        }
                        Some(RecognizerEvent::Failed(message)) => {
                            error!("Recognizer failed: {}", message);
                            warnings
                                .lock()
                                .await
                                .push(ModeWarning::SpeechUnavailable(message));
                            speech_active.store(false, Ordering::SeqCst);
                            updates.send_modify(|v| *v += 1);
                            break;
                        }
                        None => {
                            // Recognition session ended on its own;
                            // restart it while capture is still active.
                            if !is_capturing.load(Ordering::SeqCst) {
                                break;
                            }
                            match recognizer.start().await {
                                Ok(new_rx) => {
                                    debug!("Recognizer session restarted");
                                    rx = new_rx;
                                }
                                Err(e) => {
                                    warn!("Recognizer restart failed: {}", e);
                                    warnings
                                        .lock()
                                        .await
                                        .push(ModeWarning::SpeechUnavailable(e.to_string()));
                                    speech_active.store(false, Ordering::SeqCst);
                                    break;
                                }
                            }
                        }
                    }
                }
            }

            info!("Speech capture task stopped");

            if let Err(e) = recognizer.stop().await {
                error!("Failed to stop recognizer: {}", e);
            }
        });

        {
            let mut handle = self.speech_task_handle.lock().await;
            *handle = Some(task);
        }

        Ok(())
    }

    async fn spawn_camera_task(
        &self,
        mut camera: Box<dyn CameraFeed>,
        mut detector: Box<dyn FaceDetector>,
    ) -> Result<()> {
        let mut frame_rx = match camera.start().await {
            Ok(rx) => rx,
            Err(e) if e.is_degradable() => {
                self.record_warning(ModeWarning::CameraUnavailable(e.to_string()))
                    .await;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        self.camera_active.store(true, Ordering::SeqCst);

        let engagement = Arc::clone(&self.engagement);
        let is_capturing = Arc::clone(&self.is_capturing);
        let camera_active = Arc::clone(&self.camera_active);
        let updates = Arc::clone(&self.updates_tx);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let task = tokio::spawn(async move {
            info!(
                "Engagement analysis task started ({}, {})",
                camera.name(),
                detector.name()
            );

            loop {
                if !is_capturing.load(Ordering::SeqCst) {
                    break;
                }

                tokio::select! {
                    _ = shutdown_rx.changed() => break,

                    frame = frame_rx.recv() => match frame {
                        Some(frame) => {
                            if !is_capturing.load(Ordering::SeqCst) {
                                break;
                            }
                            let observation = detector.detect(&frame);
                            {
                                let mut tracker = engagement.lock().await;
                                tracker.observe_frame(
                                    frame.width,
                                    frame.height,
                                    observation.as_ref().map(|o| &o.bounding_box),
                                );
                                if let Some(reading) =
                                    observation.as_ref().and_then(|o| o.emotion)
                                {
                                    tracker.record_emotion(reading);
                                }
                            }
                            updates.send_modify(|v| *v += 1);
                        }
                        None => {
                            debug!("Camera feed ended");
                            camera_active.store(false, Ordering::SeqCst);
                            break;
                        }
                    }
                }
            }

            info!("Engagement analysis task stopped");

            if let Err(e) = camera.stop().await {
                error!("Failed to stop camera feed: {}", e);
            }
        });

        {
            let mut handle = self.camera_task_handle.lock().await;
            *handle = Some(task);
        }

        Ok(())
    }
}
