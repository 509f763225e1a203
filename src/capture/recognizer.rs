//! Speech recognition backend trait.
//!
//! Recognizers push events over a channel; closing the channel means
//! the recognition session ended on its own. The adapter restarts an
//! ended recognizer while capture is still active, which mirrors how
//! continuous dictation engines cycle through short internal sessions.

use crate::error::CaptureError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Events emitted by a speech recognizer.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognizerEvent {
    /// Low-latency hypothesis, replaced by the next event.
    Partial(String),

    /// Committed segment, appended to the turn transcript.
    Final(String),

    /// The recognizer heard nothing over its detection window. Counted
    /// as a pause; recognition keeps running.
    NoSpeech,

    /// Unrecoverable recognizer failure. The adapter degrades to typed
    /// input after this.
    Failed(String),
}

/// Speech recognition backend
///
/// Implementations wrap a realtime engine (platform dictation, a cloud
/// streaming API, a local model). The scripted implementation below
/// replays a fixed event sequence for demos and tests.
#[async_trait::async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Start recognizing
    ///
    /// Returns a channel receiver for recognition events. The channel
    /// closes when the recognition session ends.
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognizerEvent>, CaptureError>;

    /// Stop recognizing
    async fn stop(&mut self) -> Result<(), CaptureError>;

    /// Check if the recognizer is currently listening
    fn is_listening(&self) -> bool;

    /// Get recognizer name for logging
    fn name(&self) -> &str;
}

/// Replays scripted event sequences with per-event delays.
///
/// Each call to `start` consumes the next script; when a script runs
/// out the event channel closes, which exercises the adapter's restart
/// path. Once the queue is exhausted, `start` fails with a degradable
/// error so the restart loop terminates instead of cycling through
/// empty sessions.
pub struct ScriptedRecognizer {
    scripts: VecDeque<Vec<(Duration, RecognizerEvent)>>,
    listening: Arc<AtomicBool>,
    starts: Arc<AtomicUsize>,
}

impl ScriptedRecognizer {
    /// Single-session recognizer: one script, then the channel closes.
    pub fn new(script: Vec<(Duration, RecognizerEvent)>) -> Self {
        Self::with_sessions(vec![script])
    }

    /// Multi-session recognizer: one script per `start` call.
    pub fn with_sessions(scripts: Vec<Vec<(Duration, RecognizerEvent)>>) -> Self {
        Self {
            scripts: scripts.into(),
            listening: Arc::new(AtomicBool::new(false)),
            starts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Script with every event delivered immediately.
    pub fn immediate(events: Vec<RecognizerEvent>) -> Self {
        Self::new(events.into_iter().map(|e| (Duration::ZERO, e)).collect())
    }

    /// How many times `start` has been called. Lets tests assert on the
    /// adapter's restart behavior.
    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Shared handle to the start counter, usable after the recognizer
    /// has been moved into the capture task.
    pub fn start_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.starts)
    }
}

#[async_trait::async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognizerEvent>, CaptureError> {
        let script = match self.scripts.pop_front() {
            Some(script) => script,
            None => {
                return Err(CaptureError::Unavailable(
                    "scripted sessions exhausted".to_string(),
                ))
            }
        };

        self.starts.fetch_add(1, Ordering::SeqCst);
        self.listening.store(true, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(64);
        let listening = Arc::clone(&self.listening);

        tokio::spawn(async move {
            for (delay, event) in script {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if !listening.load(Ordering::SeqCst) {
                    break;
                }
                debug!("scripted recognizer event: {:?}", event);
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        self.listening.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Recognizer that always fails to start. Exercises the degraded
/// typed-text fallback.
pub struct UnavailableRecognizer;

#[async_trait::async_trait]
impl SpeechRecognizer for UnavailableRecognizer {
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognizerEvent>, CaptureError> {
        Err(CaptureError::Unavailable("speech recognition".to_string()))
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn is_listening(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_recognizer_replays_events() {
        let mut recognizer = ScriptedRecognizer::immediate(vec![
            RecognizerEvent::Partial("hel".to_string()),
            RecognizerEvent::Final("hello".to_string()),
        ]);

        let mut rx = recognizer.start().await.unwrap();
        assert_eq!(
            rx.recv().await,
            Some(RecognizerEvent::Partial("hel".to_string()))
        );
        assert_eq!(
            rx.recv().await,
            Some(RecognizerEvent::Final("hello".to_string()))
        );
        // Script exhausted: channel closes.
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_each_start_consumes_one_session() {
        let mut recognizer = ScriptedRecognizer::with_sessions(vec![
            vec![(Duration::ZERO, RecognizerEvent::Final("one".to_string()))],
            vec![(Duration::ZERO, RecognizerEvent::Final("two".to_string()))],
        ]);

        let mut rx = recognizer.start().await.unwrap();
        assert_eq!(
            rx.recv().await,
            Some(RecognizerEvent::Final("one".to_string()))
        );
        assert_eq!(rx.recv().await, None);

        let mut rx = recognizer.start().await.unwrap();
        assert_eq!(
            rx.recv().await,
            Some(RecognizerEvent::Final("two".to_string()))
        );
        assert_eq!(recognizer.start_count(), 2);

        // Queue exhausted: the next start degrades instead of looping.
        let err = recognizer.start().await.unwrap_err();
        assert!(err.is_degradable());
        assert_eq!(recognizer.start_count(), 2);
    }

    #[tokio::test]
    async fn test_stop_halts_replay() {
        let mut recognizer = ScriptedRecognizer::new(vec![
            (Duration::ZERO, RecognizerEvent::Final("first".to_string())),
            (
                Duration::from_secs(60),
                RecognizerEvent::Final("never".to_string()),
            ),
        ]);

        let mut rx = recognizer.start().await.unwrap();
        assert!(rx.recv().await.is_some());
        recognizer.stop().await.unwrap();
        assert!(!recognizer.is_listening());
    }

    #[tokio::test]
    async fn test_unavailable_recognizer_is_degradable() {
        let mut recognizer = UnavailableRecognizer;
        let err = recognizer.start().await.unwrap_err();
        assert!(err.is_degradable());
    }
}
