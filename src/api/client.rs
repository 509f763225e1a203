//! HTTP client for the remote interview service.
//!
//! The service is stateless between calls: the full setup and history
//! travel with every answer as multipart form fields. All calls go
//! through the shared backoff helper, so rate limits and transient
//! 5xx responses are absorbed before an error reaches the session.

use super::retry::with_backoff;
use super::types::{
    AnswerOutcome, AnswerRequest, AnswerResponse, Artifact, FeedbackResponse, InterviewRecord,
    InterviewSummary, QuestionText, SessionOpened, StartRequest, StartResponse,
    HISTORY_SEPARATOR,
};
use crate::config::ApiConfig;
use crate::error::{CoachError, Result};
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, info};

/// Remote interview service operations.
///
/// The HTTP implementation below talks to the hosted service; tests
/// drive sessions with scripted implementations instead.
#[async_trait::async_trait]
pub trait InterviewApi: Send + Sync {
    /// Open a session, returning its id and the first question.
    async fn start_interview(&self, request: &StartRequest) -> Result<SessionOpened>;

    /// Submit one answer, returning the next question or completion.
    async fn submit_answer(&self, request: &AnswerRequest) -> Result<AnswerOutcome>;

    /// Fetch overall feedback for a finished session.
    async fn final_feedback(&self, session_id: &str) -> Result<String>;

    /// List previously recorded interviews.
    async fn past_interviews(&self) -> Result<Vec<InterviewSummary>>;

    /// Fetch one recorded interview by id.
    async fn past_interview(&self, id: &str) -> Result<InterviewRecord>;
}

/// `InterviewApi` over HTTP multipart, with retry and optional bearer
/// authentication.
pub struct HttpInterviewApi {
    client: reqwest::Client,
    config: ApiConfig,
}

impl HttpInterviewApi {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn post_form<T>(&self, url: &str, form: Form) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .authorize(self.client.post(url))
            .multipart(form)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn get_json<T>(&self, url: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.authorize(self.client.get(url)).send().await?;
        Self::read_json(response).await
    }

    async fn read_json<T>(response: reqwest::Response) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoachError::Api {
                status: status.as_u16(),
                message: Self::error_detail(&body),
            });
        }
        response
            .json()
            .await
            .map_err(|e| CoachError::MalformedResponse(e.to_string()))
    }

    /// Pull the human-readable message out of an error body. FastAPI
    /// servers use `detail`, older ones `error`; anything else is
    /// surfaced verbatim.
    fn error_detail(body: &str) -> String {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
            for key in ["detail", "error"] {
                if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                    return text.to_string();
                }
            }
        }
        body.to_string()
    }

    fn attach(form: Form, field: &'static str, artifact: &Artifact) -> Form {
        form.part(
            field,
            Part::bytes(artifact.bytes.clone()).file_name(artifact.file_name.clone()),
        )
    }

    fn start_form(request: &StartRequest) -> Form {
        let mut form = Form::new()
            .text("position", request.position.clone())
            .text("job_description", request.job_description.clone())
            .text("difficulty", request.difficulty.to_string());
        for question_type in &request.question_types {
            form = form.text("question_types", question_type.clone());
        }
        if let Some(resume) = &request.resume {
            form = Self::attach(form, "file", resume);
        }
        if let Some(jd_file) = &request.job_description_file {
            form = Self::attach(form, "jd_file", jd_file);
        }
        form
    }

    fn answer_form(request: &AnswerRequest) -> Form {
        let mut form = Form::new()
            .text("session_id", request.session_id.clone())
            .text("position", request.position.clone())
            .text("job_description", request.job_description.clone())
            .text("difficulty", request.difficulty.to_string())
            .text(
                "past_questions",
                request.past_questions.join(HISTORY_SEPARATOR),
            )
            .text("past_answers", request.past_answers.join(HISTORY_SEPARATOR))
            .text("answer", request.answer.clone());
        for question_type in &request.question_types {
            form = form.text("question_types", question_type.clone());
        }
        if let Some(resume) = &request.resume {
            form = Self::attach(form, "file", resume);
        }
        form
    }
}

#[async_trait::async_trait]
impl InterviewApi for HttpInterviewApi {
    async fn start_interview(&self, request: &StartRequest) -> Result<SessionOpened> {
        let url = self.endpoint("start");
        debug!("POST {}", url);

        let response: StartResponse = with_backoff(
            "start interview",
            self.config.max_retries,
            self.config.retry_base(),
            || self.post_form(&url, Self::start_form(request)),
        )
        .await?;

        let first_question = response
            .question
            .map(QuestionText::into_string)
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .ok_or_else(|| {
                CoachError::MalformedResponse("start response missing question".to_string())
            })?;
        let session_id = response
            .session_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                CoachError::MalformedResponse("start response missing session_id".to_string())
            })?;

        info!("Interview session opened: {}", session_id);
        Ok(SessionOpened {
            session_id,
            first_question,
            position: response.position.filter(|p| !p.trim().is_empty()),
        })
    }

    async fn submit_answer(&self, request: &AnswerRequest) -> Result<AnswerOutcome> {
        let url = self.endpoint("answer");
        debug!("POST {}", url);

        let response: AnswerResponse = with_backoff(
            "submit answer",
            self.config.max_retries,
            self.config.retry_base(),
            || self.post_form(&url, Self::answer_form(request)),
        )
        .await?;

        response.classify()
    }

    async fn final_feedback(&self, session_id: &str) -> Result<String> {
        let url = self.endpoint("feedback");
        debug!("POST {}", url);

        let response: FeedbackResponse = with_backoff(
            "final feedback",
            self.config.max_retries,
            self.config.retry_base(),
            || {
                self.post_form(
                    &url,
                    Form::new().text("session_id", session_id.to_string()),
                )
            },
        )
        .await?;

        response.into_text()
    }

    async fn past_interviews(&self) -> Result<Vec<InterviewSummary>> {
        let url = self.endpoint("past_interviews");
        debug!("GET {}", url);

        with_backoff(
            "list past interviews",
            self.config.max_retries,
            self.config.retry_base(),
            || self.get_json(&url),
        )
        .await
    }

    async fn past_interview(&self, id: &str) -> Result<InterviewRecord> {
        let url = self.endpoint(&format!("past_interview/{id}"));
        debug!("GET {}", url);

        with_backoff(
            "fetch past interview",
            self.config.max_retries,
            self.config.retry_base(),
            || self.get_json(&url),
        )
        .await
    }
}
