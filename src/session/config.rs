use crate::api::{Artifact, Difficulty, StartRequest};
use crate::capture::{AutoSubmitPolicy, InputMode};
use crate::error::{CoachError, Result};
use serde::{Deserialize, Serialize};

/// Which setup fields must be present before the start call is made.
/// Validation failures never reach the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartPolicy {
    pub require_position: bool,
    pub require_job_description: bool,
}

impl Default for StartPolicy {
    fn default() -> Self {
        Self {
            require_position: true,
            require_job_description: false,
        }
    }
}

/// Configuration for an interview session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Local label for logs and reports (the server assigns the real id)
    pub label: String,

    /// Role being interviewed for
    pub position: String,

    /// Job description as pasted text
    pub job_description: String,

    /// Requested question difficulty
    pub difficulty: Difficulty,

    /// Question categories to draw from
    pub question_types: Vec<String>,

    /// How the candidate answers
    pub input_mode: InputMode,

    /// Silence auto-submit policy
    pub auto_submit: AutoSubmitPolicy,

    /// Resume uploaded with every request
    pub resume: Option<Artifact>,

    /// Job description as an uploaded file
    pub job_description_file: Option<Artifact>,

    /// Local validation applied before starting
    pub start_policy: StartPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            label: format!("interview-{}", uuid::Uuid::new_v4()),
            position: String::new(),
            job_description: String::new(),
            difficulty: Difficulty::default(),
            question_types: vec!["technical".to_string(), "behavioral".to_string()],
            input_mode: InputMode::Text,
            auto_submit: AutoSubmitPolicy::default(),
            resume: None,
            job_description_file: None,
            start_policy: StartPolicy::default(),
        }
    }
}

impl SessionConfig {
    /// Check the start policy against the filled-in fields.
    pub fn validate(&self) -> Result<()> {
        if self.start_policy.require_position && self.position.trim().is_empty() {
            return Err(CoachError::Validation(
                "position is required to start an interview".to_string(),
            ));
        }
        if self.start_policy.require_job_description
            && self.job_description.trim().is_empty()
            && self.job_description_file.is_none()
        {
            return Err(CoachError::Validation(
                "a job description is required to start an interview".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn start_request(&self) -> StartRequest {
        StartRequest {
            position: self.position.clone(),
            job_description: self.job_description.clone(),
            difficulty: self.difficulty,
            question_types: self.question_types.clone(),
            resume: self.resume.clone(),
            job_description_file: self.job_description_file.clone(),
        }
    }
}
