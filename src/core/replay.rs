//! Recorded sessions: a JSON file of per-frame snapshots replayed as a
//! frame source plus a matching landmark extractor.
//!
//! ```json
//! {
//!   "width": 640, "height": 480,
//!   "frames": [
//!     { "timestamp": 0.0, "snapshot": null },
//!     { "timestamp": 0.033, "snapshot": { "handedness": "Left", "confidence": 0.93,
//!                                         "landmarks": [{"x": 0.5, "y": 0.9}, ...] } }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::pipeline::{FrameSource, LandmarkExtractor, ReadOutcome};
use crate::error::{HandcueError, Result};
use crate::types::{Frame, LandmarkSnapshot};

/// One recorded frame: capture time and what the extractor saw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub timestamp: f64,
    #[serde(default)]
    pub snapshot: Option<LandmarkSnapshot>,
}

/// A full recorded session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
    pub frames: Vec<RecordedFrame>,
}

fn default_width() -> usize {
    640
}

fn default_height() -> usize {
    480
}

impl Recording {
    pub fn new(frames: Vec<RecordedFrame>) -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            frames,
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let recording: Recording = serde_json::from_str(json)?;
        recording.validate()?;
        Ok(recording)
    }

    /// Timestamps must be finite and non-decreasing
    pub fn validate(&self) -> Result<()> {
        let mut previous = f64::NEG_INFINITY;
        for (i, frame) in self.frames.iter().enumerate() {
            if !frame.timestamp.is_finite() {
                return Err(HandcueError::recording(format!("frame {} has a non-finite timestamp", i)));
            }
            if frame.timestamp < previous {
                return Err(HandcueError::recording(format!(
                    "frame {} goes back in time ({} < {})",
                    i, frame.timestamp, previous
                )));
            }
            previous = frame.timestamp;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Split into a frame source and the extractor that answers for it
    pub fn into_parts(self) -> (ReplaySource, ReplayExtractor) {
        let timestamps = self.frames.iter().map(|f| f.timestamp).collect();
        let snapshots = self.frames.into_iter().map(|f| f.snapshot).collect();
        (
            ReplaySource {
                width: self.width,
                height: self.height,
                timestamps,
                cursor: 0,
                open: false,
            },
            ReplayExtractor { snapshots },
        )
    }
}

/// Frame source yielding one blank frame per recorded timestamp
#[derive(Debug, Clone)]
pub struct ReplaySource {
    width: usize,
    height: usize,
    timestamps: Vec<f64>,
    cursor: usize,
    open: bool,
}

impl ReplaySource {
    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl FrameSource for ReplaySource {
    fn open(&mut self) -> Result<()> {
        if self.open {
            return Err(HandcueError::source_unavailable("recording already open"));
        }
        self.open = true;
        self.cursor = 0;
        debug!(frames = self.timestamps.len(), "replay opened");
        Ok(())
    }

    fn read(&mut self) -> Result<ReadOutcome> {
        if !self.open {
            return Err(HandcueError::source_read("recording not open"));
        }
        let Some(&timestamp) = self.timestamps.get(self.cursor) else {
            return Ok(ReadOutcome::EndOfStream);
        };
        let frame = Frame::blank(self.cursor as u64, timestamp, self.width, self.height);
        self.cursor += 1;
        Ok(ReadOutcome::Frame(frame))
    }

    fn release(&mut self) {
        self.open = false;
    }
}

/// Returns the recorded snapshot for each frame index
#[derive(Debug, Clone)]
pub struct ReplayExtractor {
    snapshots: Vec<Option<LandmarkSnapshot>>,
}

impl LandmarkExtractor for ReplayExtractor {
    fn infer(&mut self, frame: &Frame) -> Result<Option<LandmarkSnapshot>> {
        let idx = usize::try_from(frame.index)
            .map_err(|_| HandcueError::recording(format!("frame index {} out of range", frame.index)))?;
        Ok(self.snapshots.get(idx).cloned().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_FRAMES: &str = r#"{
        "frames": [
            {"timestamp": 0.0},
            {"timestamp": 0.1, "snapshot": {
                "handedness": "Left",
                "confidence": 0.9,
                "landmarks": [{"x": 0.5, "y": 0.5}]
            }}
        ]
    }"#;

    #[test]
    fn test_parse_defaults() {
        let rec = Recording::from_json_str(TWO_FRAMES).unwrap();
        assert_eq!(rec.len(), 2);
        assert_eq!((rec.width, rec.height), (640, 480));
        assert!(rec.frames[0].snapshot.is_none());
    }

    #[test]
    fn test_rejects_time_travel() {
        let json = r#"{"frames": [{"timestamp": 1.0}, {"timestamp": 0.5}]}"#;
        assert!(matches!(Recording::from_json_str(json), Err(HandcueError::Recording(_))));
    }

    #[test]
    fn test_source_requires_open_and_replays_after_reopen() {
        let (mut source, mut extractor) = Recording::from_json_str(TWO_FRAMES).unwrap().into_parts();
        assert!(source.read().is_err());

        source.open().unwrap();
        let ReadOutcome::Frame(first) = source.read().unwrap() else {
            panic!("expected a frame");
        };
        assert!(extractor.infer(&first).unwrap().is_none());
        let ReadOutcome::Frame(second) = source.read().unwrap() else {
            panic!("expected a frame");
        };
        assert!(extractor.infer(&second).unwrap().is_some());
        assert_eq!(source.read().unwrap(), ReadOutcome::EndOfStream);

        source.release();
        assert!(!source.is_open());
        source.open().unwrap();
        assert!(matches!(source.read().unwrap(), ReadOutcome::Frame(f) if f.index == 0));
    }

    #[test]
    fn test_double_open_rejected() {
        let (mut source, _) = Recording::from_json_str(TWO_FRAMES).unwrap().into_parts();
        source.open().unwrap();
        assert!(source.open().is_err());
    }
}
