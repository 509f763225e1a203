use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CoachError>;

/// Top-level error taxonomy. Display strings double as the inline
/// messages shown to the user, so they stay human-readable.
#[derive(Debug, Error)]
pub enum CoachError {
    /// Local input validation failed; no network call was made.
    #[error("{0}")]
    Validation(String),

    /// The operation is not allowed in the session's current state.
    #[error("{0}")]
    InvalidState(String),

    /// Transport-level failure (connect, timeout, TLS, ...).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error status.
    #[error("server error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The server answered 200 but the body was missing expected fields.
    #[error("server responded unexpectedly: {0}")]
    MalformedResponse(String),

    /// A capture collaborator failed in a way the adapter could not
    /// degrade around.
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),
}

/// Errors raised by capture collaborators (recognizer, camera).
///
/// `Unavailable` and `PermissionDenied` are degradable: the input mode
/// adapter falls back to typed text / audio-only and records a warning
/// instead of failing the session.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("{0} is not available")]
    Unavailable(String),

    #[error("permission denied for {0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Failed(String),
}

impl CaptureError {
    /// True when the input mode adapter may continue in a degraded mode
    /// rather than surfacing a fatal error.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            CaptureError::Unavailable(_) | CaptureError::PermissionDenied(_)
        )
    }
}
