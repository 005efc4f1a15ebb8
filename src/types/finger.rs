//! Finger identities and their per-frame states

use serde::{Deserialize, Serialize};
use crate::types::landmark::*;

/// The five tracked fingers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FingerId {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl FingerId {
    pub const ALL: [FingerId; 5] = [
        FingerId::Thumb,
        FingerId::Index,
        FingerId::Middle,
        FingerId::Ring,
        FingerId::Pinky,
    ];

    /// Position in [`FingerId::ALL`]
    pub const fn ordinal(self) -> usize {
        match self {
            FingerId::Thumb => 0,
            FingerId::Index => 1,
            FingerId::Middle => 2,
            FingerId::Ring => 3,
            FingerId::Pinky => 4,
        }
    }

    /// Knuckle landmark (thumb MCP for the thumb)
    pub const fn base(self) -> usize {
        match self {
            FingerId::Thumb => THUMB_MCP,
            FingerId::Index => INDEX_MCP,
            FingerId::Middle => MIDDLE_MCP,
            FingerId::Ring => RING_MCP,
            FingerId::Pinky => PINKY_MCP,
        }
    }

    /// Middle joint (IP for the thumb, PIP otherwise)
    pub const fn joint(self) -> usize {
        match self {
            FingerId::Thumb => THUMB_IP,
            FingerId::Index => INDEX_PIP,
            FingerId::Middle => MIDDLE_PIP,
            FingerId::Ring => RING_PIP,
            FingerId::Pinky => PINKY_PIP,
        }
    }

    pub const fn tip(self) -> usize {
        match self {
            FingerId::Thumb => THUMB_TIP,
            FingerId::Index => INDEX_TIP,
            FingerId::Middle => MIDDLE_TIP,
            FingerId::Ring => RING_TIP,
            FingerId::Pinky => PINKY_TIP,
        }
    }

    /// Lowercase name used in channel ids
    pub const fn slug(self) -> &'static str {
        match self {
            FingerId::Thumb => "thumb",
            FingerId::Index => "index",
            FingerId::Middle => "middle",
            FingerId::Ring => "ring",
            FingerId::Pinky => "pinky",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        FingerId::ALL.into_iter().find(|f| f.slug() == s)
    }
}

impl std::fmt::Display for FingerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FingerId::Thumb => "Thumb",
            FingerId::Index => "Index",
            FingerId::Middle => "Middle",
            FingerId::Ring => "Ring",
            FingerId::Pinky => "Pinky",
        };
        write!(f, "{}", name)
    }
}

/// Discrete state of one finger in one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FingerState {
    Bent,
    Straight,
}

impl FingerState {
    pub fn is_bent(self) -> bool {
        self == FingerState::Bent
    }

    /// ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            FingerState::Bent => "\x1b[33m",
            FingerState::Straight => "\x1b[32m",
        }
    }
}

impl std::fmt::Display for FingerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FingerState::Bent => write!(f, "Bent"),
            FingerState::Straight => write!(f, "Straight"),
        }
    }
}
