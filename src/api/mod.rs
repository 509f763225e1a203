pub mod client;
pub mod retry;
pub mod types;

pub use client::{HttpInterviewApi, InterviewApi};
pub use retry::{with_backoff, Retriable};
pub use types::{
    AnswerOutcome, AnswerRequest, AnswerResponse, Artifact, Difficulty, InterviewRecord,
    InterviewSummary, QuestionText, SessionOpened, StartRequest, StartResponse, END_OF_INTERVIEW,
    HISTORY_SEPARATOR, SUPPORTED_DOCUMENT_EXTENSIONS,
};
