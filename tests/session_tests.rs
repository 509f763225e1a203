// Integration tests for the interview session lifecycle.
//
// These tests drive InterviewSession against a scripted in-memory
// implementation of the interview service, checking state transitions,
// history bookkeeping, and that rejected operations never reach the
// service.

use anyhow::Result;
use async_trait::async_trait;
use interview_coach::api::{
    AnswerOutcome, AnswerRequest, InterviewApi, InterviewRecord, InterviewSummary, SessionOpened,
    StartRequest,
};
use interview_coach::{
    CaptureDevices, CoachError, InputMode, InterviewSession, SessionConfig, SessionState,
    StartPolicy,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Scripted stand-in for the remote service. Start and answer calls
/// pop pre-seeded results; every answer request is recorded so tests
/// can assert on the history fields that were sent.
struct ScriptedApi {
    start_results: Mutex<VecDeque<interview_coach::Result<SessionOpened>>>,
    answer_results: Mutex<VecDeque<interview_coach::Result<AnswerOutcome>>>,
    start_calls: AtomicUsize,
    answer_calls: AtomicUsize,
    feedback_calls: AtomicUsize,
    seen_answers: Mutex<Vec<AnswerRequest>>,
}

impl ScriptedApi {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            start_results: Mutex::new(VecDeque::new()),
            answer_results: Mutex::new(VecDeque::new()),
            start_calls: AtomicUsize::new(0),
            answer_calls: AtomicUsize::new(0),
            feedback_calls: AtomicUsize::new(0),
            seen_answers: Mutex::new(Vec::new()),
        })
    }

    fn with_answers(results: Vec<interview_coach::Result<AnswerOutcome>>) -> Arc<Self> {
        let api = Self::new();
        *api.answer_results.lock().unwrap() = results.into();
        api
    }

    /// Script of `n` questions: n-1 follow-ups, then completion.
    fn questions(n: usize, feedback: Option<&str>) -> Arc<Self> {
        let mut results: Vec<interview_coach::Result<AnswerOutcome>> = (2..=n)
            .map(|i| Ok(AnswerOutcome::NextQuestion(format!("Question {i}"))))
            .collect();
        results.push(Ok(AnswerOutcome::Complete {
            feedback: feedback.map(String::from),
        }));
        Self::with_answers(results)
    }

    fn seed_start(&self, result: interview_coach::Result<SessionOpened>) {
        self.start_results.lock().unwrap().push_back(result);
    }

    fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    fn answer_calls(&self) -> usize {
        self.answer_calls.load(Ordering::SeqCst)
    }

    fn seen_answers(&self) -> Vec<AnswerRequest> {
        self.seen_answers.lock().unwrap().clone()
    }
}

#[async_trait]
impl InterviewApi for ScriptedApi {
    async fn start_interview(
        &self,
        _request: &StartRequest,
    ) -> interview_coach::Result<SessionOpened> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        self.start_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(SessionOpened {
                    session_id: "session-1".to_string(),
                    first_question: "Question 1".to_string(),
                    position: None,
                })
            })
    }

    async fn submit_answer(
        &self,
        request: &AnswerRequest,
    ) -> interview_coach::Result<AnswerOutcome> {
        self.answer_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_answers.lock().unwrap().push(request.clone());
        self.answer_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(CoachError::MalformedResponse(
                    "answer script exhausted".to_string(),
                ))
            })
    }

    async fn final_feedback(&self, _session_id: &str) -> interview_coach::Result<String> {
        self.feedback_calls.fetch_add(1, Ordering::SeqCst);
        Ok("Good session overall".to_string())
    }

    async fn past_interviews(&self) -> interview_coach::Result<Vec<InterviewSummary>> {
        Ok(Vec::new())
    }

    async fn past_interview(&self, id: &str) -> interview_coach::Result<InterviewRecord> {
        Ok(InterviewRecord {
            id: id.to_string(),
            position: None,
            difficulty: None,
            questions: Vec::new(),
            answers: Vec::new(),
            feedback: None,
        })
    }
}

fn text_session(api: Arc<ScriptedApi>) -> InterviewSession {
    let config = SessionConfig {
        position: "Backend Engineer".to_string(),
        input_mode: InputMode::Text,
        ..SessionConfig::default()
    };
    let api: Arc<dyn InterviewApi> = api;
    InterviewSession::new(config, api)
}

#[tokio::test]
async fn test_five_turn_session_completes() -> Result<()> {
    let api = ScriptedApi::questions(5, Some("Nice work"));
    let mut session = text_session(api.clone());

    session.start(CaptureDevices::none()).await?;
    assert_eq!(session.state(), SessionState::AwaitingAnswer);
    assert_eq!(session.session_id(), Some("session-1"));
    assert_eq!(session.current_question(), Some("Question 1"));

    let answers = [
        "I spent four years building payment systems",
        "The hardest bug involved a race in our retry queue",
        "I prefer pairing on gnarly problems",
        "My testing philosophy starts with integration coverage",
        "I want to grow into a staff role",
    ];

    for (i, text) in answers.iter().enumerate() {
        let outcome = session.answer_with_text(text).await?;
        if i < answers.len() - 1 {
            assert!(
                matches!(outcome, AnswerOutcome::NextQuestion(_)),
                "turn {} should produce a follow-up",
                i + 1
            );
            assert_eq!(session.state(), SessionState::AwaitingAnswer);
        } else {
            assert!(matches!(outcome, AnswerOutcome::Complete { .. }));
        }
    }

    // Verify: terminal state, history, and released capture.
    assert_eq!(session.state(), SessionState::Complete);
    assert_eq!(session.turns().len(), 5);
    assert!(session.current_question().is_none());
    assert!(!session.capture().is_capturing(), "capture should be released");
    assert_eq!(session.feedback(), Some("Nice work"));

    for (i, turn) in session.turns().iter().enumerate() {
        assert_eq!(turn.number as usize, i + 1);
        assert_eq!(turn.question, format!("Question {}", i + 1));
        assert_eq!(turn.answer, answers[i]);
    }

    // Verify: the third answer request carried the full history.
    let seen = api.seen_answers();
    assert_eq!(seen.len(), 5);
    let third = &seen[2];
    assert_eq!(third.session_id, "session-1");
    assert_eq!(
        third.past_questions,
        vec!["Question 1", "Question 2", "Question 3"]
    );
    assert_eq!(third.past_answers, vec![answers[0], answers[1]]);
    assert_eq!(third.answer, answers[2]);

    // Verify: report totals. No fillers (+10) and everything answered
    // (+5); typed answers are far above the ideal pacing band, so no
    // pacing bonus.
    let report = session.report().await;
    assert_eq!(report.questions_asked, 5);
    assert_eq!(report.questions_answered, 5);
    assert_eq!(report.total_filler_words, 0);
    assert_eq!(report.overall_score, 85);
    assert_eq!(report.feedback.as_deref(), Some("Nice work"));

    Ok(())
}

#[tokio::test]
async fn test_submit_before_start_is_rejected_locally() -> Result<()> {
    let api = ScriptedApi::new();
    let mut session = text_session(api.clone());

    let err = session.submit_answer().await.unwrap_err();
    assert!(matches!(err, CoachError::InvalidState(_)));
    assert_eq!(api.answer_calls(), 0, "no network call should be made");
    assert_eq!(session.state(), SessionState::Idle);

    Ok(())
}

#[tokio::test]
async fn test_submit_after_complete_is_rejected_locally() -> Result<()> {
    let api = ScriptedApi::questions(1, None);
    let mut session = text_session(api.clone());

    session.start(CaptureDevices::none()).await?;
    session.answer_with_text("only answer").await?;
    assert_eq!(session.state(), SessionState::Complete);

    let err = session.answer_with_text("extra").await.unwrap_err();
    assert!(matches!(err, CoachError::InvalidState(_)));
    assert_eq!(api.answer_calls(), 1, "completed session must not submit again");

    Ok(())
}

#[tokio::test]
async fn test_empty_answer_is_rejected_locally() -> Result<()> {
    let api = ScriptedApi::questions(3, None);
    let mut session = text_session(api.clone());

    session.start(CaptureDevices::none()).await?;
    let err = session.submit_answer().await.unwrap_err();
    assert!(matches!(err, CoachError::Validation(_)));
    assert_eq!(api.answer_calls(), 0);
    assert_eq!(session.state(), SessionState::AwaitingAnswer);

    Ok(())
}

#[tokio::test]
async fn test_failed_submission_keeps_answer_for_retry() -> Result<()> {
    let api = ScriptedApi::with_answers(vec![
        Err(CoachError::Api {
            status: 503,
            message: "overloaded".to_string(),
        }),
        Ok(AnswerOutcome::NextQuestion("Question 2".to_string())),
    ]);
    let mut session = text_session(api.clone());

    session.start(CaptureDevices::none()).await?;
    let err = session
        .answer_with_text("my answer about caching")
        .await
        .unwrap_err();
    assert!(matches!(err, CoachError::Api { status: 503, .. }));

    // The session is still answerable and the transcript survived.
    assert_eq!(session.state(), SessionState::AwaitingAnswer);
    assert!(session.turns().is_empty(), "failed turn must not enter history");
    assert_eq!(session.capture().answer_text().await, "my answer about caching");

    // Retry without retyping.
    let outcome = session.submit_answer().await?;
    assert!(matches!(outcome, AnswerOutcome::NextQuestion(_)));
    assert_eq!(session.turns().len(), 1);
    assert_eq!(session.turns()[0].answer, "my answer about caching");

    Ok(())
}

#[tokio::test]
async fn test_retry_after_error_does_not_duplicate_text() -> Result<()> {
    let api = ScriptedApi::with_answers(vec![
        Err(CoachError::Api {
            status: 500,
            message: "boom".to_string(),
        }),
        Ok(AnswerOutcome::NextQuestion("Question 2".to_string())),
    ]);
    let mut session = text_session(api.clone());

    session.start(CaptureDevices::none()).await?;
    assert!(session.answer_with_text("same answer").await.is_err());
    // Retyping the same answer replaces the buffer instead of
    // appending to it.
    session.answer_with_text("same answer").await?;

    assert_eq!(session.turns()[0].answer, "same answer");

    Ok(())
}

#[tokio::test]
async fn test_start_policy_violation_never_reaches_network() -> Result<()> {
    let api = ScriptedApi::new();
    let config = SessionConfig {
        position: String::new(),
        ..SessionConfig::default()
    };
    let api_dyn: Arc<dyn InterviewApi> = api.clone();
    let mut session = InterviewSession::new(config, api_dyn);

    let err = session.start(CaptureDevices::none()).await.unwrap_err();
    assert!(matches!(err, CoachError::Validation(_)));
    assert_eq!(api.start_calls(), 0);
    assert_eq!(session.state(), SessionState::Idle);

    Ok(())
}

#[tokio::test]
async fn test_failed_start_returns_to_idle_and_can_retry() -> Result<()> {
    let api = ScriptedApi::new();
    api.seed_start(Err(CoachError::Api {
        status: 500,
        message: "cold start".to_string(),
    }));
    let mut session = text_session(api.clone());

    assert!(session.start(CaptureDevices::none()).await.is_err());
    assert_eq!(session.state(), SessionState::Idle);
    assert!(!session.capture().is_capturing(), "capture must be released");

    // Second attempt uses the default scripted success.
    session.start(CaptureDevices::none()).await?;
    assert_eq!(session.state(), SessionState::AwaitingAnswer);
    assert_eq!(api.start_calls(), 2);

    Ok(())
}

#[tokio::test]
async fn test_position_extracted_by_service_is_adopted() -> Result<()> {
    let api = ScriptedApi::with_answers(vec![Ok(AnswerOutcome::NextQuestion(
        "Question 2".to_string(),
    ))]);
    api.seed_start(Ok(SessionOpened {
        session_id: "session-7".to_string(),
        first_question: "Question 1".to_string(),
        position: Some("Data Scientist".to_string()),
    }));

    let config = SessionConfig {
        position: String::new(),
        start_policy: StartPolicy {
            require_position: false,
            require_job_description: false,
        },
        ..SessionConfig::default()
    };
    let api_dyn: Arc<dyn InterviewApi> = api.clone();
    let mut session = InterviewSession::new(config, api_dyn);

    session.start(CaptureDevices::none()).await?;
    assert_eq!(session.config().position, "Data Scientist");

    // Follow-up requests carry the adopted position.
    session.answer_with_text("I build forecasting models").await?;
    assert_eq!(api.seen_answers()[0].position, "Data Scientist");

    Ok(())
}

#[tokio::test]
async fn test_configured_position_is_not_overwritten() -> Result<()> {
    let api = ScriptedApi::new();
    api.seed_start(Ok(SessionOpened {
        session_id: "session-8".to_string(),
        first_question: "Question 1".to_string(),
        position: Some("Something Else".to_string()),
    }));
    let mut session = text_session(api.clone());

    session.start(CaptureDevices::none()).await?;
    assert_eq!(session.config().position, "Backend Engineer");

    Ok(())
}

#[tokio::test]
async fn test_reset_returns_finished_session_to_idle() -> Result<()> {
    let api = ScriptedApi::questions(1, None);
    let mut session = text_session(api.clone());

    session.start(CaptureDevices::none()).await?;
    // A live session cannot be reset, only cancelled.
    let err = session.reset().await.unwrap_err();
    assert!(matches!(err, CoachError::InvalidState(_)));

    session.answer_with_text("short but complete").await?;
    assert_eq!(session.state(), SessionState::Complete);

    session.reset().await?;
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.session_id().is_none());
    assert!(session.current_question().is_none());
    assert!(session.turns().is_empty());
    assert!(session.feedback().is_none());

    // The wiped session starts again from scratch.
    session.start(CaptureDevices::none()).await?;
    assert_eq!(session.state(), SessionState::AwaitingAnswer);
    assert_eq!(session.session_id(), Some("session-1"));
    assert_eq!(api.start_calls(), 2);

    Ok(())
}

#[tokio::test]
async fn test_cancel_releases_capture_and_scores_partial_session() -> Result<()> {
    let api = ScriptedApi::questions(5, None);
    let mut session = text_session(api.clone());

    session.start(CaptureDevices::none()).await?;
    session.cancel().await?;

    assert_eq!(session.state(), SessionState::Complete);
    assert!(!session.capture().is_capturing());
    assert!(session.current_question().is_none());

    let report = session.report().await;
    assert_eq!(report.questions_asked, 1);
    assert_eq!(report.questions_answered, 0);
    // Baseline 70 plus the few-fillers bonus; nothing was answered.
    assert_eq!(report.overall_score, 80);

    // Cancelling again is a no-op.
    session.cancel().await?;
    assert_eq!(session.state(), SessionState::Complete);

    Ok(())
}

#[tokio::test]
async fn test_feedback_is_fetched_lazily_and_cached() -> Result<()> {
    let api = ScriptedApi::questions(1, None);
    let mut session = text_session(api.clone());

    // Not available before completion.
    assert!(session.fetch_feedback().await.is_err());

    session.start(CaptureDevices::none()).await?;
    session.answer_with_text("an answer").await?;
    assert_eq!(session.state(), SessionState::Complete);
    assert!(session.feedback().is_none());

    let feedback = session.fetch_feedback().await?;
    assert_eq!(feedback, "Good session overall");
    assert_eq!(api.feedback_calls.load(Ordering::SeqCst), 1);

    // Second call serves the cached copy.
    session.fetch_feedback().await?;
    assert_eq!(api.feedback_calls.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn test_snapshot_is_stable_without_new_input() -> Result<()> {
    let api = ScriptedApi::questions(3, None);
    let mut session = text_session(api.clone());

    session.start(CaptureDevices::none()).await?;
    session.capture().replace_typed("um I think this works").await;

    let first = session.snapshot().await;
    let second = session.snapshot().await;
    assert_eq!(first.speech.word_count, second.speech.word_count);
    assert_eq!(first.speech.filler_word_count, 1);
    assert_eq!(
        first.speech.filler_word_count,
        second.speech.filler_word_count
    );

    Ok(())
}
