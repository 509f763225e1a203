use crate::api::Difficulty;
use crate::capture::{AutoSubmitPolicy, InputMode};
use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub interview: InterviewDefaults,
    #[serde(default)]
    pub capture: CaptureConfig,
}

/// Remote interview service settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_ms: default_retry_base_ms(),
            bearer_token: None,
        }
    }
}

impl ApiConfig {
    pub fn retry_base(&self) -> Duration {
        Duration::from_millis(self.retry_base_ms)
    }
}

/// Defaults for session setup fields the CLI does not override.
#[derive(Debug, Clone, Deserialize)]
pub struct InterviewDefaults {
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_question_types")]
    pub question_types: Vec<String>,
    #[serde(default)]
    pub input_mode: InputMode,
}

impl Default for InterviewDefaults {
    fn default() -> Self {
        Self {
            position: String::new(),
            job_description: String::new(),
            difficulty: Difficulty::default(),
            question_types: default_question_types(),
            input_mode: InputMode::default(),
        }
    }
}

/// Capture settings shared by all sessions.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    #[serde(default)]
    pub auto_submit: AutoSubmitPolicy,
    #[serde(default = "default_frame_width")]
    pub frame_width: u32,
    #[serde(default = "default_frame_height")]
    pub frame_height: u32,
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            auto_submit: AutoSubmitPolicy::default(),
            frame_width: default_frame_width(),
            frame_height: default_frame_height(),
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

impl CaptureConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

fn default_base_url() -> String {
    "https://interviewbot-rjsi.onrender.com/api/interview".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_ms() -> u64 {
    1000
}

fn default_question_types() -> Vec<String> {
    vec!["technical".to_string(), "behavioral".to_string()]
}

fn default_frame_width() -> u32 {
    640
}

fn default_frame_height() -> u32 {
    480
}

fn default_frame_interval_ms() -> u64 {
    1000
}
