//! Raw per-frame signals derived from a classification, one per channel

use serde_json::{json, Value};
use crate::types::{ChannelId, ClassificationResult, FingerState, Handedness};

/// Undebounced boolean for `channel` in this frame; "no hand" is false
/// for every channel
pub fn raw_signal(channel: ChannelId, result: Option<&ClassificationResult>) -> bool {
    let Some(result) = result else {
        return false;
    };
    match channel {
        ChannelId::HandPresent => true,
        ChannelId::LeftHandPresent => result.handedness == Handedness::Left,
        ChannelId::RightHandPresent => result.handedness == Handedness::Right,
        ChannelId::FingerBent(finger) => result.state(finger) == FingerState::Bent,
        ChannelId::FingerStraight(finger) => result.state(finger) == FingerState::Straight,
    }
}

/// JSON payload carried by an event on `channel`
pub fn event_payload(channel: ChannelId, result: Option<&ClassificationResult>) -> Value {
    let hand = result.map(|r| r.handedness.to_string().to_lowercase());
    match channel {
        ChannelId::HandPresent | ChannelId::LeftHandPresent | ChannelId::RightHandPresent => {
            json!({ "hand": hand })
        }
        ChannelId::FingerBent(finger) | ChannelId::FingerStraight(finger) => json!({
            "hand": hand,
            "finger": finger.slug(),
            "state": result.map(|r| r.state(finger).to_string().to_lowercase()),
        }),
    }
}
