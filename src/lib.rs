//! Handcue: per-frame hand landmark classification with debounced events
//!
//! Frame source → landmark extractor → geometry evaluator → debouncer → sinks

pub mod core;
pub mod error;
pub mod types;

pub use error::{HandcueError, Result};

// =============================================================================
// LANDMARK LAYOUT
// =============================================================================

/// Number of keypoints in one hand snapshot
pub const LANDMARK_COUNT: usize = 21;

/// Number of tracked fingers
pub const FINGER_COUNT: usize = 5;

// =============================================================================
// CLASSIFICATION THRESHOLDS
// =============================================================================

/// Ratio fingers are Bent when (mid→tip) / (base→mid) falls below this
pub const BEND_RATIO_THRESHOLD: f64 = 0.6;

/// Snapshots below this detection confidence are treated as "no hand"
pub const MIN_DETECTION_CONFIDENCE: f64 = 0.5;

// =============================================================================
// DEBOUNCE
// =============================================================================

/// Default per-channel cooldown (seconds)
pub const DEFAULT_COOLDOWN_SECS: f64 = 1.0;

// =============================================================================
// CAPTURE LOOP
// =============================================================================

/// Pause between frame reads (milliseconds), 0 disables pacing
pub const FRAME_INTERVAL_MS: u64 = 30;

/// Render updates allowed to queue on a threaded sink before dropping
pub const RENDER_BACKLOG: usize = 4;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
