//! Core types for handcue

mod landmark;
mod finger;
mod classification;
mod frame;
mod event;
mod config;

pub use landmark::*;
pub use finger::{FingerId, FingerState};
pub use classification::{ClassificationResult, overlay_text, NO_HAND_TEXT};
pub use frame::Frame;
pub use event::{ChannelId, GestureEvent, RenderUpdate};
pub use config::{PipelineConfig, GeometryConfig, ChannelConfig, DebouncePolicy, ThumbSense};
