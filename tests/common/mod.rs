//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use handcue::core::Sink;
use handcue::types::{
    ClassificationResult, Frame, GestureEvent, Handedness, Landmark, LandmarkSnapshot, INDEX_TIP,
};

/// Upright open hand, every finger Straight in the mirrored view
pub fn open_hand() -> Vec<Landmark> {
    vec![
        Landmark::new(0.50, 0.90),
        Landmark::new(0.40, 0.80),
        Landmark::new(0.35, 0.72),
        Landmark::new(0.30, 0.66),
        Landmark::new(0.32, 0.60),
        Landmark::new(0.45, 0.60),
        Landmark::new(0.45, 0.48),
        Landmark::new(0.45, 0.41),
        Landmark::new(0.45, 0.35),
        Landmark::new(0.50, 0.58),
        Landmark::new(0.50, 0.45),
        Landmark::new(0.50, 0.38),
        Landmark::new(0.50, 0.32),
        Landmark::new(0.55, 0.60),
        Landmark::new(0.55, 0.48),
        Landmark::new(0.55, 0.42),
        Landmark::new(0.55, 0.37),
        Landmark::new(0.60, 0.64),
        Landmark::new(0.60, 0.55),
        Landmark::new(0.60, 0.50),
        Landmark::new(0.60, 0.46),
    ]
}

/// Open hand with the index tip dropped below its PIP joint
pub fn index_curled() -> Vec<Landmark> {
    let mut points = open_hand();
    points[INDEX_TIP] = Landmark::new(0.45, 0.55);
    points
}

pub fn left(points: Vec<Landmark>) -> LandmarkSnapshot {
    LandmarkSnapshot::new(points, Handedness::Left, 0.95)
}

pub fn right(points: Vec<Landmark>) -> LandmarkSnapshot {
    LandmarkSnapshot::new(points, Handedness::Right, 0.95)
}

/// Everything a sink observed, shared with the test body
#[derive(Default)]
pub struct Observed {
    pub events: Vec<GestureEvent>,
    pub renders: Vec<(u64, Option<ClassificationResult>)>,
    pub closed: bool,
}

/// Sink that records every call
#[derive(Clone, Default)]
pub struct RecordingSink(pub Arc<Mutex<Observed>>);

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<GestureEvent> {
        self.0.lock().unwrap().events.clone()
    }

    pub fn render_count(&self) -> usize {
        self.0.lock().unwrap().renders.len()
    }

    pub fn closed(&self) -> bool {
        self.0.lock().unwrap().closed
    }
}

impl Sink for RecordingSink {
    fn on_frame_rendered(&mut self, frame: &Frame, result: Option<&ClassificationResult>) {
        self.0.lock().unwrap().renders.push((frame.index, result.copied()));
    }

    fn on_event(&mut self, event: &GestureEvent) {
        self.0.lock().unwrap().events.push(event.clone());
    }

    fn name(&self) -> &str {
        "recording"
    }

    fn close(&mut self) {
        self.0.lock().unwrap().closed = true;
    }
}
