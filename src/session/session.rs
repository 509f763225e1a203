use super::config::SessionConfig;
use super::history::{self, MetricsSnapshot, SessionReport, Turn};
use crate::api::{AnswerOutcome, AnswerRequest, InterviewApi};
use crate::capture::{AnswerCapture, CaptureDevices, ModeWarning};
use crate::error::{CoachError, Result};
use crate::metrics::speech;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Session lifecycle states.
///
/// `Submitting` is only observable from other tasks; the submitting
/// call itself always leaves in `AwaitingAnswer`, `Complete`, or an
/// error with the previous state restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Configured but not started.
    Idle,
    /// Start call in flight.
    Starting,
    /// A question is on the table.
    AwaitingAnswer,
    /// Answer call in flight.
    Submitting,
    /// Finished, by completion or cancellation.
    Complete,
    /// Capture broke in a way the adapter could not degrade around.
    Failed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SessionState::Idle => "idle",
            SessionState::Starting => "starting",
            SessionState::AwaitingAnswer => "awaiting-answer",
            SessionState::Submitting => "submitting",
            SessionState::Complete => "complete",
            SessionState::Failed => "failed",
        };
        write!(f, "{label}")
    }
}

/// An interview session that manages the question loop, answer
/// capture, live metrics, and the exchange history
pub struct InterviewSession {
    /// Session setup
    config: SessionConfig,

    /// Remote question service
    api: Arc<dyn InterviewApi>,

    /// Input capture, running for the lifetime of the session
    capture: AnswerCapture,

    /// Lifecycle state
    state: SessionState,

    /// Server-assigned id, present once started
    session_id: Option<String>,

    /// Question currently awaiting an answer
    current_question: Option<String>,

    /// When the current question was asked
    question_asked_at: Option<chrono::DateTime<Utc>>,

    /// Questions asked so far, answered or not
    questions_asked: u32,

    /// Completed exchanges
    turns: Vec<Turn>,

    /// Feedback carried by the completion response
    feedback: Option<String>,

    /// When the session started
    started_at: Option<chrono::DateTime<Utc>>,
}

impl InterviewSession {
    /// Create a new session. Nothing runs until `start`.
    pub fn new(config: SessionConfig, api: Arc<dyn InterviewApi>) -> Self {
        info!("Creating interview session: {}", config.label);

        let capture = AnswerCapture::new(config.input_mode, config.auto_submit.clone());

        Self {
            config,
            api,
            capture,
            state: SessionState::Idle,
            session_id: None,
            current_question: None,
            question_asked_at: None,
            questions_asked: 0,
            turns: Vec::new(),
            feedback: None,
            started_at: None,
        }
    }

    /// Start the session: validate the setup, bring up capture, and
    /// fetch the first question.
    ///
    /// A failed start call releases capture and returns to `Idle` so
    /// the caller can retry. A capture failure the adapter could not
    /// degrade around is terminal.
    pub async fn start(&mut self, devices: CaptureDevices) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(CoachError::InvalidState(format!(
                "cannot start a session in {} state",
                self.state
            )));
        }
        self.config.validate()?;

        info!("Starting interview session: {}", self.config.label);
        self.state = SessionState::Starting;

        if let Err(e) = self.capture.start(devices).await {
            error!("Capture failed to start: {}", e);
            // A partially started capture (say, speech up but camera
            // broken) still holds device handles.
            if let Err(stop_err) = self.capture.stop().await {
                error!("Failed to release capture: {}", stop_err);
            }
            self.state = SessionState::Failed;
            return Err(e);
        }

        match self.api.start_interview(&self.config.start_request()).await {
            Ok(opened) => {
                self.session_id = Some(opened.session_id);
                self.started_at = Some(Utc::now());
                if self.config.position.trim().is_empty() {
                    // The service extracts a position from the resume
                    // when none was given; adopt it so later requests
                    // and the report carry it.
                    if let Some(position) =
                        opened.position.filter(|p| !p.trim().is_empty())
                    {
                        info!("Using position from the service: {}", position);
                        self.config.position = position;
                    }
                }
                self.ask(opened.first_question).await;
                self.state = SessionState::AwaitingAnswer;
                Ok(())
            }
            Err(e) => {
                warn!("Interview start failed: {}", e);
                if let Err(stop_err) = self.capture.stop().await {
                    error!("Failed to release capture: {}", stop_err);
                }
                self.state = SessionState::Idle;
                Err(e)
            }
        }
    }

    /// Submit the captured answer for the current question.
    ///
    /// Rejected locally, with no network call, unless a question is
    /// awaiting an answer and the transcript is non-empty. On failure
    /// the transcript is kept so the caller can retry; on success the
    /// exchange is appended to history exactly once.
    pub async fn submit_answer(&mut self) -> Result<AnswerOutcome> {
        if self.state != SessionState::AwaitingAnswer {
            return Err(CoachError::InvalidState(format!(
                "cannot submit an answer in {} state",
                self.state
            )));
        }

        let answer = self.capture.answer_text().await;
        if answer.trim().is_empty() {
            return Err(CoachError::Validation(
                "answer is empty; say or type something first".to_string(),
            ));
        }

        let question = self.current_question.clone().ok_or_else(|| {
            CoachError::InvalidState("no question is awaiting an answer".to_string())
        })?;
        let session_id = self
            .session_id
            .clone()
            .ok_or_else(|| CoachError::InvalidState("session was never opened".to_string()))?;

        // Metrics freeze at submission time.
        let metrics = self.snapshot().await;

        info!(
            "Submitting answer {} ({} words)",
            self.turns.len() + 1,
            metrics.speech.word_count
        );
        self.state = SessionState::Submitting;

        // History sent with the request covers every question asked so
        // far including the current one; the current answer travels in
        // its own field.
        let mut past_questions: Vec<String> =
            self.turns.iter().map(|t| t.question.clone()).collect();
        past_questions.push(question.clone());
        let past_answers: Vec<String> = self.turns.iter().map(|t| t.answer.clone()).collect();

        let request = AnswerRequest {
            session_id,
            position: self.config.position.clone(),
            job_description: self.config.job_description.clone(),
            difficulty: self.config.difficulty,
            question_types: self.config.question_types.clone(),
            past_questions,
            past_answers,
            answer: answer.clone(),
            resume: self.config.resume.clone(),
        };

        match self.api.submit_answer(&request).await {
            Ok(outcome) => {
                let asked_at = self.question_asked_at.take().unwrap_or_else(Utc::now);
                self.turns.push(Turn {
                    number: self.turns.len() as u32 + 1,
                    question,
                    answer,
                    metrics,
                    asked_at,
                    answered_at: Utc::now(),
                });

                match &outcome {
                    AnswerOutcome::NextQuestion(next) => {
                        self.ask(next.clone()).await;
                        self.state = SessionState::AwaitingAnswer;
                    }
                    AnswerOutcome::Complete { feedback } => {
                        info!("Interview complete after {} answers", self.turns.len());
                        self.feedback = feedback.clone();
                        self.current_question = None;
                        if let Err(e) = self.capture.stop().await {
                            error!("Failed to release capture: {}", e);
                        }
                        self.state = SessionState::Complete;
                    }
                }
                Ok(outcome)
            }
            Err(e) => {
                warn!("Answer submission failed: {}", e);
                // Transcript untouched; the caller may retry.
                self.state = SessionState::AwaitingAnswer;
                Err(e)
            }
        }
    }

    /// Typed-answer convenience: replace the turn transcript with
    /// `text` and submit. Retrying after an error does not duplicate
    /// the text.
    pub async fn answer_with_text(&mut self, text: &str) -> Result<AnswerOutcome> {
        if self.state != SessionState::AwaitingAnswer {
            return Err(CoachError::InvalidState(format!(
                "cannot submit an answer in {} state",
                self.state
            )));
        }
        self.capture.replace_typed(text).await;
        self.submit_answer().await
    }

    /// Abandon the session from any live state, releasing capture.
    pub async fn cancel(&mut self) -> Result<()> {
        if matches!(self.state, SessionState::Complete | SessionState::Failed) {
            warn!("Session already finished");
            return Ok(());
        }

        info!("Cancelling interview session: {}", self.config.label);
        self.current_question = None;
        if let Err(e) = self.capture.stop().await {
            error!("Failed to release capture: {}", e);
        }
        self.state = SessionState::Complete;
        Ok(())
    }

    /// Wipe a finished session back to `Idle` so the same setup can be
    /// run again from scratch. Only `Complete` and `Failed` sessions
    /// can be reset; a live one must be cancelled first.
    pub async fn reset(&mut self) -> Result<()> {
        if !matches!(self.state, SessionState::Complete | SessionState::Failed) {
            return Err(CoachError::InvalidState(format!(
                "cannot reset a session in {} state",
                self.state
            )));
        }

        info!("Resetting interview session: {}", self.config.label);
        if let Err(e) = self.capture.stop().await {
            error!("Failed to release capture: {}", e);
        }
        self.session_id = None;
        self.current_question = None;
        self.question_asked_at = None;
        self.questions_asked = 0;
        self.turns.clear();
        self.feedback = None;
        self.started_at = None;
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Fetch overall feedback for a completed session, caching it on
    /// the session.
    pub async fn fetch_feedback(&mut self) -> Result<String> {
        if self.state != SessionState::Complete {
            return Err(CoachError::InvalidState(format!(
                "feedback is only available once complete, not in {} state",
                self.state
            )));
        }
        if let Some(feedback) = &self.feedback {
            return Ok(feedback.clone());
        }

        let session_id = self
            .session_id
            .clone()
            .ok_or_else(|| CoachError::InvalidState("session was never opened".to_string()))?;

        let feedback = self.api.final_feedback(&session_id).await?;
        self.feedback = Some(feedback.clone());
        Ok(feedback)
    }

    /// Live metrics recomputed in full from the current capture state
    /// rather than patched incrementally. Word, filler, and pause
    /// counts move only when new input arrives.
    pub async fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            speech: self.capture.speech_metrics().await,
            engagement: self.capture.engagement_metrics().await,
        }
    }

    /// Coaching hints for the answer in progress.
    pub async fn coaching_hints(&self) -> Vec<String> {
        let metrics = self.capture.speech_metrics().await;
        speech::coaching_hints(&metrics, self.capture.turn_elapsed().await)
    }

    /// Assemble the end-of-session report from the turn history and
    /// the engagement counters.
    pub async fn report(&self) -> SessionReport {
        let engagement = self.capture.engagement_metrics().await;
        let average_wpm = history::average_wpm(&self.turns);
        let total_filler_words = history::total_fillers(&self.turns);
        let answered = self.turns.len() as u32;
        let all_answered = answered > 0 && answered == self.questions_asked;
        let started_at = self.started_at.unwrap_or_else(Utc::now);
        let duration = Utc::now().signed_duration_since(started_at);

        SessionReport {
            label: self.config.label.clone(),
            session_id: self.session_id.clone().unwrap_or_default(),
            position: self.config.position.clone(),
            difficulty: self.config.difficulty,
            started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            questions_asked: self.questions_asked,
            questions_answered: answered,
            average_wpm,
            total_filler_words,
            average_confidence: history::average_confidence(&self.turns),
            engagement,
            overall_score: history::performance_score(
                average_wpm,
                total_filler_words,
                all_answered,
            ),
            feedback: self.feedback.clone(),
            turns: self.turns.clone(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn current_question(&self) -> Option<&str> {
        self.current_question.as_deref()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The capture surface, for live display and typed input.
    pub fn capture(&self) -> &AnswerCapture {
        &self.capture
    }

    /// Degradations recorded by the capture layer.
    pub async fn warnings(&self) -> Vec<ModeWarning> {
        self.capture.warnings().await
    }

    async fn ask(&mut self, question: String) {
        self.questions_asked += 1;
        info!("Question {}: {}", self.questions_asked, question);
        self.current_question = Some(question);
        self.question_asked_at = Some(Utc::now());
        self.capture.begin_turn().await;
    }
}
