//! Hand landmarks as produced by the external extractor

use serde::{Deserialize, Serialize};
use crate::error::{HandcueError, Result};
use crate::LANDMARK_COUNT;

// ============================================================================
// HAND LANDMARK INDICES
// ============================================================================

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// One keypoint in normalized image space (0.0–1.0 per axis, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    /// Relative depth, unused by the classifier
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub const fn with_depth(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Finite and inside the unit square
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && (0.0..=1.0).contains(&self.x)
            && (0.0..=1.0).contains(&self.y)
    }

    /// Euclidean distance in the image plane
    pub fn distance_2d(&self, other: &Landmark) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Which hand the extractor reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

impl std::fmt::Display for Handedness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handedness::Left => write!(f, "Left"),
            Handedness::Right => write!(f, "Right"),
        }
    }
}

/// One frame's keypoints for a single tracked hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSnapshot {
    /// Ordered by the anatomical index constants above
    pub landmarks: Vec<Landmark>,
    pub handedness: Handedness,
    /// Detection confidence reported by the extractor (0.0–1.0)
    pub confidence: f64,
}

impl LandmarkSnapshot {
    pub fn new(landmarks: Vec<Landmark>, handedness: Handedness, confidence: f64) -> Self {
        Self {
            landmarks,
            handedness,
            confidence,
        }
    }

    /// Borrow the landmarks as a fixed 21-point array
    pub fn points(&self) -> Result<&[Landmark; LANDMARK_COUNT]> {
        <&[Landmark; LANDMARK_COUNT]>::try_from(self.landmarks.as_slice())
            .map_err(|_| HandcueError::invalid_snapshot(self.landmarks.len()))
    }

    pub fn meets_confidence(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }
}
