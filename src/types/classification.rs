//! Per-frame classification output and its overlay text

use serde::{Deserialize, Serialize};
use crate::types::{FingerId, FingerState, Handedness};

/// Overlay text when no hand passed the detection gate
pub const NO_HAND_TEXT: &str = "No hand detected";

/// Finger states for one snapshot, all five fingers always present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Indexed by [`FingerId::ordinal`]
    states: [FingerState; 5],
    pub handedness: Handedness,
}

impl ClassificationResult {
    pub fn new(states: [FingerState; 5], handedness: Handedness) -> Self {
        Self { states, handedness }
    }

    pub fn state(&self, finger: FingerId) -> FingerState {
        self.states[finger.ordinal()]
    }

    /// (finger, state) pairs in anatomical order
    pub fn iter(&self) -> impl Iterator<Item = (FingerId, FingerState)> + '_ {
        FingerId::ALL.into_iter().map(move |f| (f, self.state(f)))
    }

    pub fn bent_count(&self) -> usize {
        self.states.iter().filter(|s| s.is_bent()).count()
    }

    /// "Thumb: Bent | Index: Straight | ..."
    pub fn status_text(&self) -> String {
        self.iter()
            .map(|(f, s)| format!("{}: {}", f, s))
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// Status line with ANSI colors per finger state
    pub fn to_terminal_string(&self) -> String {
        let fingers = self
            .iter()
            .map(|(f, s)| format!("{}{}: {}\x1b[0m", s.color_code(), f, s))
            .collect::<Vec<_>>()
            .join(" | ");
        format!("[{}] {}", self.handedness, fingers)
    }
}

/// Overlay label for a frame, "Finger Status: ..." as shown under the video
pub fn overlay_text(result: Option<&ClassificationResult>) -> String {
    match result {
        Some(r) => format!("Finger Status: {}", r.status_text()),
        None => format!("Finger Status: {}", NO_HAND_TEXT),
    }
}
