//! Pipeline configuration, loadable from JSON

use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::error::{HandcueError, Result};
use crate::types::{ChannelId, FingerId};
use crate::{
    BEND_RATIO_THRESHOLD, DEFAULT_COOLDOWN_SECS, FRAME_INTERVAL_MS,
    MIN_DETECTION_CONFIDENCE, RENDER_BACKLOG,
};

/// How a fired channel becomes armed again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DebouncePolicy {
    /// Re-arm when the raw signal goes false: once per sustained true period
    EdgeReset,
    /// Re-arm once the cooldown has elapsed: at most once per interval
    TimeBased,
}

impl std::fmt::Display for DebouncePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DebouncePolicy::EdgeReset => write!(f, "edge-reset"),
            DebouncePolicy::TimeBased => write!(f, "time-based"),
        }
    }
}

/// Which side of the interphalangeal joint the thumb tip moves to when bent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThumbSense {
    /// Bent ⇔ tip.x < ip.x (mirrored selfie view)
    TipLeftOfJoint,
    /// Bent ⇔ tip.x > ip.x (unmirrored view)
    TipRightOfJoint,
}

impl ThumbSense {
    pub fn for_view(mirrored: bool) -> Self {
        if mirrored {
            ThumbSense::TipLeftOfJoint
        } else {
            ThumbSense::TipRightOfJoint
        }
    }
}

/// Knobs for the geometry evaluator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Ratio fingers are Bent below this segment ratio
    pub bend_ratio: f64,
    /// Thumb direction; follows the mirror setting when unset
    pub thumb: Option<ThumbSense>,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            bend_ratio: BEND_RATIO_THRESHOLD,
            thumb: None,
        }
    }
}

/// Debounce settings for one event channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub id: ChannelId,
    pub policy: DebouncePolicy,
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: f64,
}

fn default_cooldown() -> f64 {
    DEFAULT_COOLDOWN_SECS
}

impl ChannelConfig {
    pub fn new(id: ChannelId, policy: DebouncePolicy, cooldown_secs: f64) -> Self {
        Self {
            id,
            policy,
            cooldown_secs,
        }
    }

    pub fn edge_reset(id: ChannelId) -> Self {
        Self::new(id, DebouncePolicy::EdgeReset, DEFAULT_COOLDOWN_SECS)
    }

    pub fn time_based(id: ChannelId) -> Self {
        Self::new(id, DebouncePolicy::TimeBased, DEFAULT_COOLDOWN_SECS)
    }
}

/// Full configuration surface of the capture loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Flip frames horizontally before inference (selfie view)
    pub mirror_view: bool,
    /// Snapshots below this confidence count as "no hand detected"
    pub min_detection_confidence: f64,
    pub geometry: GeometryConfig,
    pub channels: Vec<ChannelConfig>,
    /// Queued render updates per threaded sink before stale ones are dropped
    pub render_backlog: usize,
    /// Pause between frame reads in milliseconds, 0 = as fast as the source
    pub frame_interval_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mirror_view: true,
            min_detection_confidence: MIN_DETECTION_CONFIDENCE,
            geometry: GeometryConfig::default(),
            channels: vec![
                ChannelConfig::time_based(ChannelId::LeftHandPresent),
                ChannelConfig::edge_reset(ChannelId::FingerBent(FingerId::Index)),
            ],
            render_backlog: RENDER_BACKLOG,
            frame_interval_ms: FRAME_INTERVAL_MS,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Thumb direction after applying the mirror default
    pub fn thumb_sense(&self) -> ThumbSense {
        self.geometry
            .thumb
            .unwrap_or_else(|| ThumbSense::for_view(self.mirror_view))
    }

    pub fn channel(&self, id: ChannelId) -> Option<&ChannelConfig> {
        self.channels.iter().find(|c| c.id == id)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if !self.geometry.bend_ratio.is_finite() || self.geometry.bend_ratio <= 0.0 {
            return Err(HandcueError::invalid_config(format!(
                "bend_ratio must be a positive number, got {}",
                self.geometry.bend_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.min_detection_confidence) {
            return Err(HandcueError::invalid_config(format!(
                "min_detection_confidence must be within 0..=1, got {}",
                self.min_detection_confidence
            )));
        }
        if self.render_backlog == 0 {
            return Err(HandcueError::invalid_config("render_backlog must be at least 1"));
        }
        for (i, channel) in self.channels.iter().enumerate() {
            if !channel.cooldown_secs.is_finite() || channel.cooldown_secs < 0.0 {
                return Err(HandcueError::invalid_config(format!(
                    "channel '{}' has invalid cooldown {}",
                    channel.id, channel.cooldown_secs
                )));
            }
            if self.channels[..i].iter().any(|c| c.id == channel.id) {
                return Err(HandcueError::invalid_config(format!(
                    "channel '{}' configured twice",
                    channel.id
                )));
            }
        }
        Ok(())
    }
}
