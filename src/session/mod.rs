//! Interview session management
//!
//! This module provides the `InterviewSession` abstraction that manages:
//! - The session lifecycle state machine
//! - Answer capture across input modes
//! - Live speech and engagement metrics
//! - The question/answer exchange history
//! - End-of-session reporting

mod config;
mod history;
mod session;

pub use config::{SessionConfig, StartPolicy};
pub use history::{MetricsSnapshot, SessionReport, Turn};
pub use session::{InterviewSession, SessionState};
