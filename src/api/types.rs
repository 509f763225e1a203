//! Wire types for the remote interview service.
//!
//! The service is tolerant in what it sends: question payloads appear
//! as bare strings or as objects, identifiers move between `id` and
//! `session_id`, and completion is signaled three different ways
//! depending on server version. Deserialization here absorbs all of
//! that so the rest of the crate sees one shape.

use crate::error::{CoachError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Separator the service uses for history fields carried as a single
/// form value.
pub const HISTORY_SEPARATOR: &str = "||,";

/// Sentinel question text older server versions send instead of a
/// completion flag.
pub const END_OF_INTERVIEW: &str = "End of Interview";

/// Interview difficulty, sent as a lowercase form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Medium
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!(
                "unknown difficulty '{other}' (expected easy, medium, or hard)"
            )),
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        write!(f, "{label}")
    }
}

/// Document types the service can extract text from.
pub const SUPPORTED_DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "docx", "txt"];

/// An uploaded document (resume, job description file).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a document from disk, rejecting types the service cannot
    /// extract text from before any bytes move.
    pub fn load(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !SUPPORTED_DOCUMENT_EXTENSIONS.contains(&extension.as_str()) {
            return Err(CoachError::Validation(format!(
                "unsupported document type '{}' (expected {})",
                path.display(),
                SUPPORTED_DOCUMENT_EXTENSIONS.join(", ")
            )));
        }

        let bytes = std::fs::read(path).map_err(|e| {
            CoachError::Validation(format!("could not read {}: {e}", path.display()))
        })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        Ok(Self::new(file_name, bytes))
    }
}

/// Question payload: either a bare string or an object carrying the
/// text under `text` or `question`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum QuestionText {
    Plain(String),
    Object {
        #[serde(alias = "question")]
        text: String,
    },
}

impl QuestionText {
    pub fn as_str(&self) -> &str {
        match self {
            QuestionText::Plain(text) => text,
            QuestionText::Object { text } => text,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            QuestionText::Plain(text) => text,
            QuestionText::Object { text } => text,
        }
    }
}

/// Parameters for opening a session.
#[derive(Debug, Clone, Default)]
pub struct StartRequest {
    pub position: String,
    pub job_description: String,
    pub difficulty: Difficulty,
    pub question_types: Vec<String>,
    pub resume: Option<Artifact>,
    pub job_description_file: Option<Artifact>,
}

/// Parameters for submitting one answer. The full setup and history
/// travel with every request because the service holds no state
/// between calls.
#[derive(Debug, Clone)]
pub struct AnswerRequest {
    pub session_id: String,
    pub position: String,
    pub job_description: String,
    pub difficulty: Difficulty,
    pub question_types: Vec<String>,
    pub past_questions: Vec<String>,
    pub past_answers: Vec<String>,
    pub answer: String,
    pub resume: Option<Artifact>,
}

/// Raw body of a successful start call.
#[derive(Debug, Clone, Deserialize)]
pub struct StartResponse {
    #[serde(default)]
    pub question: Option<QuestionText>,
    #[serde(default)]
    pub session_id: Option<String>,
    /// Position the service extracted from the resume, echoed back when
    /// the request did not name one.
    #[serde(default)]
    pub position: Option<String>,
}

/// Validated result of opening a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOpened {
    pub session_id: String,
    pub first_question: String,
    pub position: Option<String>,
}

/// Raw body of a successful answer call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnswerResponse {
    #[serde(default)]
    pub question: Option<QuestionText>,
    #[serde(default, rename = "type")]
    pub response_type: Option<String>,
    #[serde(default)]
    pub interview_complete: bool,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// What an answer submission resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    NextQuestion(String),
    Complete { feedback: Option<String> },
}

impl AnswerResponse {
    /// Decide between next-question and completion.
    ///
    /// Completion wins when any of the three signals is present: the
    /// typed `interview_complete` response, the boolean flag, or the
    /// legacy sentinel question. A body with neither signal nor a
    /// usable question is malformed.
    pub fn classify(self) -> Result<AnswerOutcome> {
        let question = self
            .question
            .map(QuestionText::into_string)
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());

        let complete = self.interview_complete
            || self.response_type.as_deref() == Some("interview_complete")
            || question.as_deref() == Some(END_OF_INTERVIEW);

        if complete {
            return Ok(AnswerOutcome::Complete {
                feedback: self.feedback.or(self.message),
            });
        }

        match question {
            Some(text) => Ok(AnswerOutcome::NextQuestion(text)),
            None => Err(CoachError::MalformedResponse(
                "answer response carried neither a question nor a completion signal".to_string(),
            )),
        }
    }
}

/// One row of the past interview listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSummary {
    #[serde(alias = "session_id")]
    pub id: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default, alias = "question_count")]
    pub total_questions: Option<u32>,
    #[serde(default, alias = "duration_minutes")]
    pub duration: Option<f64>,
    #[serde(default, alias = "created_at")]
    pub date: Option<String>,
}

/// Full record of one past interview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewRecord {
    #[serde(alias = "session_id")]
    pub id: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub answers: Vec<String>,
    #[serde(default)]
    pub feedback: Option<String>,
}

/// Raw body of the final feedback call.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackResponse {
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl FeedbackResponse {
    pub fn into_text(self) -> Result<String> {
        self.feedback.or(self.message).ok_or_else(|| {
            CoachError::MalformedResponse("feedback response carried no text".to_string())
        })
    }
}
