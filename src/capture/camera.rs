//! Camera feed and face detection backends.
//!
//! The feed delivers frames over a channel like the speech recognizer
//! delivers events; a detector runs per frame and reports at most one
//! face. Detection output carries an optional emotion reading so a
//! real classifier can slot in behind the same trait later.

use crate::error::CaptureError;
use crate::metrics::{BoundingBox, EmotionReading, PlaceholderEmotionSampler};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// One frame from a camera feed.
///
/// Pixel data is optional; synthetic feeds send empty buffers since
/// the placeholder detector only needs the geometry.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Timestamp in milliseconds since the feed started
    pub timestamp_ms: u64,
    /// Raw pixel data, layout defined by the feed
    pub data: Vec<u8>,
}

/// A face found in a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceObservation {
    pub bounding_box: BoundingBox,
    pub emotion: Option<EmotionReading>,
}

/// Camera capture backend
#[async_trait::async_trait]
pub trait CameraFeed: Send + Sync {
    /// Start streaming frames
    ///
    /// Returns a channel receiver that will receive video frames
    async fn start(&mut self) -> Result<mpsc::Receiver<VideoFrame>, CaptureError>;

    /// Stop streaming
    async fn stop(&mut self) -> Result<(), CaptureError>;

    /// Check if the feed is currently streaming
    fn is_streaming(&self) -> bool;

    /// Get feed name for logging
    fn name(&self) -> &str;
}

/// Per-frame face detection.
///
/// `detect` takes `&mut self` so stateful detectors (model sessions,
/// scripted sequences) fit the same trait.
pub trait FaceDetector: Send + Sync {
    fn detect(&mut self, frame: &VideoFrame) -> Option<FaceObservation>;

    fn name(&self) -> &str;
}

/// Frame generator for demos and tests: emits empty frames of a fixed
/// size at a fixed interval until stopped or a frame limit is reached.
pub struct SyntheticCameraFeed {
    width: u32,
    height: u32,
    interval: Duration,
    frame_limit: Option<u64>,
    streaming: Arc<AtomicBool>,
}

impl SyntheticCameraFeed {
    pub fn new(width: u32, height: u32, interval: Duration) -> Self {
        Self {
            width,
            height,
            interval,
            frame_limit: None,
            streaming: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop on its own after `limit` frames.
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }
}

#[async_trait::async_trait]
impl CameraFeed for SyntheticCameraFeed {
    async fn start(&mut self) -> Result<mpsc::Receiver<VideoFrame>, CaptureError> {
        self.streaming.store(true, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(16);
        let streaming = Arc::clone(&self.streaming);
        let width = self.width;
        let height = self.height;
        let interval = self.interval;
        let frame_limit = self.frame_limit;

        tokio::spawn(async move {
            let mut sent: u64 = 0;
            loop {
                if !streaming.load(Ordering::SeqCst) {
                    break;
                }
                if let Some(limit) = frame_limit {
                    if sent >= limit {
                        break;
                    }
                }

                let frame = VideoFrame {
                    width,
                    height,
                    timestamp_ms: sent * interval.as_millis() as u64,
                    data: Vec::new(),
                };
                if tx.send(frame).await.is_err() {
                    break;
                }
                sent += 1;

                if !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
            }
            debug!("synthetic camera feed finished after {} frames", sent);
        });

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        self.streaming.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// Detector that reports the same face box on every frame, with a
/// sampled emotion attached. `never` builds one that finds no face.
pub struct StaticFaceDetector {
    face: Option<BoundingBox>,
    sampler: PlaceholderEmotionSampler,
}

impl StaticFaceDetector {
    pub fn always(face: BoundingBox) -> Self {
        Self {
            face: Some(face),
            sampler: PlaceholderEmotionSampler,
        }
    }

    pub fn never() -> Self {
        Self {
            face: None,
            sampler: PlaceholderEmotionSampler,
        }
    }
}

impl FaceDetector for StaticFaceDetector {
    fn detect(&mut self, _frame: &VideoFrame) -> Option<FaceObservation> {
        self.face.map(|bounding_box| FaceObservation {
            bounding_box,
            emotion: Some(self.sampler.sample()),
        })
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Camera feed that always fails to start. Exercises the audio-only
/// fallback.
pub struct UnavailableCamera;

#[async_trait::async_trait]
impl CameraFeed for UnavailableCamera {
    async fn start(&mut self) -> Result<mpsc::Receiver<VideoFrame>, CaptureError> {
        Err(CaptureError::Unavailable("camera".to_string()))
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn is_streaming(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}
