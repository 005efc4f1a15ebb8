//! Geometry Evaluator: Bent/Straight per finger from one landmark snapshot
//!
//! Rules:
//! - Thumb: 1-D sign test of tip.x against the IP joint (direction set by
//!   [`ThumbSense`])
//! - Index, Pinky: tip.y > PIP.y ⇒ Bent (image y grows downward)
//! - Middle, Ring: (PIP→tip) / (MCP→PIP) < bend ratio ⇒ Bent
//!
//! Stateless: the same snapshot always yields the same result. Any finger
//! whose landmarks are NaN or outside the unit square falls back to Straight.

use tracing::trace;
use crate::error::Result;
use crate::types::{
    ClassificationResult, FingerId, FingerState, Landmark, LandmarkSnapshot,
    PipelineConfig, ThumbSense,
};
use crate::{BEND_RATIO_THRESHOLD, LANDMARK_COUNT};

/// Pure per-frame finger classifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryEvaluator {
    bend_ratio: f64,
    thumb: ThumbSense,
}

impl Default for GeometryEvaluator {
    fn default() -> Self {
        Self::new(BEND_RATIO_THRESHOLD, ThumbSense::TipLeftOfJoint)
    }
}

impl GeometryEvaluator {
    pub fn new(bend_ratio: f64, thumb: ThumbSense) -> Self {
        Self { bend_ratio, thumb }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.geometry.bend_ratio, config.thumb_sense())
    }

    pub fn bend_ratio(&self) -> f64 {
        self.bend_ratio
    }

    pub fn thumb_sense(&self) -> ThumbSense {
        self.thumb
    }

    /// Classify all five fingers.
    ///
    /// Fails only with `InvalidSnapshot` when the snapshot does not hold
    /// exactly 21 landmarks.
    pub fn classify(&self, snapshot: &LandmarkSnapshot) -> Result<ClassificationResult> {
        let points = snapshot.points()?;
        let states = FingerId::ALL.map(|finger| self.finger_state(points, finger));
        Ok(ClassificationResult::new(states, snapshot.handedness))
    }

    fn finger_state(&self, points: &[Landmark; LANDMARK_COUNT], finger: FingerId) -> FingerState {
        let base = &points[finger.base()];
        let joint = &points[finger.joint()];
        let tip = &points[finger.tip()];

        match finger {
            FingerId::Thumb => {
                if !(joint.is_valid() && tip.is_valid()) {
                    return FingerState::Straight;
                }
                thumb_state(tip, joint, self.thumb)
            }
            FingerId::Index | FingerId::Pinky => {
                if !(joint.is_valid() && tip.is_valid()) {
                    return FingerState::Straight;
                }
                vertical_state(tip, joint)
            }
            FingerId::Middle | FingerId::Ring => {
                if !(base.is_valid() && joint.is_valid() && tip.is_valid()) {
                    return FingerState::Straight;
                }
                bend_from_ratio(segment_ratio(base, joint, tip), self.bend_ratio)
            }
        }
    }
}

/// Thumb flexes sideways: compare x only
pub fn thumb_state(tip: &Landmark, ip: &Landmark, sense: ThumbSense) -> FingerState {
    let bent = match sense {
        ThumbSense::TipLeftOfJoint => tip.x < ip.x,
        ThumbSense::TipRightOfJoint => tip.x > ip.x,
    };
    if bent {
        FingerState::Bent
    } else {
        FingerState::Straight
    }
}

/// Tip dropped below the joint ⇒ Bent; equal y stays Straight
pub fn vertical_state(tip: &Landmark, joint: &Landmark) -> FingerState {
    if tip.y > joint.y {
        FingerState::Bent
    } else {
        FingerState::Straight
    }
}

/// (mid→tip) / (base→mid); 0 when base and mid coincide
pub fn segment_ratio(base: &Landmark, mid: &Landmark, tip: &Landmark) -> f64 {
    let base_to_mid = base.distance_2d(mid);
    if base_to_mid == 0.0 {
        trace!("degenerate finger segment at ({:.3}, {:.3}), ratio forced to 0", base.x, base.y);
        return 0.0;
    }
    mid.distance_2d(tip) / base_to_mid
}

pub fn bend_from_ratio(ratio: f64, threshold: f64) -> FingerState {
    if ratio < threshold {
        FingerState::Bent
    } else {
        FingerState::Straight
    }
}

// =============================================================================
// TESTS
// =============================================================================
