//! Debounce channel ids and the events/updates delivered to sinks

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::types::{overlay_text, ClassificationResult, FingerId};

/// A named logical event stream with its own debounce state
///
/// Text form: `hand-present`, `left-hand-present`, `right-hand-present`,
/// `<finger>-bent`, `<finger>-straight`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChannelId {
    HandPresent,
    LeftHandPresent,
    RightHandPresent,
    FingerBent(FingerId),
    FingerStraight(FingerId),
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelId::HandPresent => write!(f, "hand-present"),
            ChannelId::LeftHandPresent => write!(f, "left-hand-present"),
            ChannelId::RightHandPresent => write!(f, "right-hand-present"),
            ChannelId::FingerBent(finger) => write!(f, "{}-bent", finger.slug()),
            ChannelId::FingerStraight(finger) => write!(f, "{}-straight", finger.slug()),
        }
    }
}

impl std::str::FromStr for ChannelId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hand-present" => return Ok(ChannelId::HandPresent),
            "left-hand-present" => return Ok(ChannelId::LeftHandPresent),
            "right-hand-present" => return Ok(ChannelId::RightHandPresent),
            _ => {}
        }
        let parsed = s
            .rsplit_once('-')
            .and_then(|(finger, state)| Some((FingerId::from_slug(finger)?, state)));
        match parsed {
            Some((finger, "bent")) => Ok(ChannelId::FingerBent(finger)),
            Some((finger, "straight")) => Ok(ChannelId::FingerStraight(finger)),
            _ => Err(format!("unknown channel id '{}'", s)),
        }
    }
}

impl TryFrom<String> for ChannelId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChannelId> for String {
    fn from(id: ChannelId) -> Self {
        id.to_string()
    }
}

/// One debounced edge on a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureEvent {
    pub channel: ChannelId,
    /// Frame that produced the edge
    pub frame_index: u64,
    /// Frame capture time (seconds)
    pub timestamp: f64,
    /// Wall-clock time the driver dispatched the event
    pub emitted_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl GestureEvent {
    pub fn new(channel: ChannelId, frame_index: u64, timestamp: f64, payload: serde_json::Value) -> Self {
        Self {
            channel,
            frame_index,
            timestamp,
            emitted_at: Utc::now(),
            payload,
        }
    }

    /// Format for terminal display
    pub fn to_terminal_string(&self) -> String {
        format!(
            "\x1b[36m⚡ {} @ frame {} (t={:.2}s) {}\x1b[0m",
            self.channel, self.frame_index, self.timestamp, self.payload
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "event={} | frame={} | t={:.3} | payload={}",
            self.channel, self.frame_index, self.timestamp, self.payload
        )
    }
}

/// What the rendering surface shows for one frame, never debounced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderUpdate {
    pub frame_index: u64,
    pub timestamp: f64,
    pub result: Option<ClassificationResult>,
    pub overlay: String,
}

impl RenderUpdate {
    pub fn new(frame_index: u64, timestamp: f64, result: Option<ClassificationResult>) -> Self {
        Self {
            frame_index,
            timestamp,
            result,
            overlay: overlay_text(result.as_ref()),
        }
    }

    pub fn hand_detected(&self) -> bool {
        self.result.is_some()
    }
}
