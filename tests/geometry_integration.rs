//! Integration tests for the geometry evaluator
//!
//! Tests the path: landmark snapshot → GeometryEvaluator → ClassificationResult

mod common;

use approx::assert_relative_eq;
use common::{index_curled, left, open_hand, right};
use handcue::core::geometry::segment_ratio;
use handcue::core::GeometryEvaluator;
use handcue::types::{
    overlay_text, FingerId, FingerState, Handedness, Landmark, PipelineConfig, ThumbSense,
    INDEX_PIP, INDEX_TIP, MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP, PINKY_TIP, RING_MCP, RING_PIP, RING_TIP,
    THUMB_TIP,
};
use handcue::HandcueError;
use pretty_assertions::assert_eq;

#[test]
fn test_open_hand_is_all_straight() {
    let result = GeometryEvaluator::default().classify(&right(open_hand())).unwrap();
    assert_eq!(result.bent_count(), 0);
    assert_eq!(result.handedness, Handedness::Right);
    assert_eq!(
        overlay_text(Some(&result)),
        "Finger Status: Thumb: Straight | Index: Straight | Middle: Straight | Ring: Straight | Pinky: Straight"
    );
}

#[test]
fn test_fist_is_all_bent() {
    let mut points = open_hand();
    points[THUMB_TIP] = Landmark::new(0.25, 0.66);
    points[INDEX_TIP] = Landmark::new(0.45, 0.55);
    points[MIDDLE_TIP] = Landmark::new(0.50, 0.50);
    points[RING_TIP] = Landmark::new(0.55, 0.52);
    points[PINKY_TIP] = Landmark::new(0.60, 0.60);

    let result = GeometryEvaluator::default().classify(&left(points)).unwrap();
    for finger in FingerId::ALL {
        assert_eq!(result.state(finger), FingerState::Bent, "{} should be bent", finger);
    }
}

/// Every well-formed snapshot yields a state for all five fingers
#[test]
fn test_classification_is_total_over_the_unit_square() {
    let evaluator = GeometryEvaluator::default();
    for step in 0..50u32 {
        let points = (0..21u32)
            .map(|i| {
                let x = ((i * 7 + step * 13) % 101) as f64 / 100.0;
                let y = ((i * 11 + step * 17) % 101) as f64 / 100.0;
                Landmark::new(x, y)
            })
            .collect();
        let result = evaluator.classify(&right(points)).unwrap();
        assert_eq!(result.iter().count(), 5);
    }
}

#[test]
fn test_index_tip_level_with_joint_is_straight() {
    let mut points = open_hand();
    points[INDEX_TIP] = Landmark::new(0.45, points[INDEX_PIP].y);
    let result = GeometryEvaluator::default().classify(&right(points)).unwrap();
    assert_eq!(result.state(FingerId::Index), FingerState::Straight);

    let result = GeometryEvaluator::default().classify(&right(index_curled())).unwrap();
    assert_eq!(result.state(FingerId::Index), FingerState::Bent);
}

#[test]
fn test_middle_ratio_either_side_of_threshold() {
    // MCP→PIP is 0.1 long; tip distance sets the ratio
    let with_tip = |tip_y: f64| {
        let mut points = open_hand();
        points[MIDDLE_MCP] = Landmark::new(0.50, 0.60);
        points[MIDDLE_PIP] = Landmark::new(0.50, 0.50);
        points[MIDDLE_TIP] = Landmark::new(0.50, tip_y);
        GeometryEvaluator::default()
            .classify(&right(points))
            .unwrap()
            .state(FingerId::Middle)
    };
    assert_eq!(with_tip(0.441), FingerState::Bent);
    assert_eq!(with_tip(0.439), FingerState::Straight);
}

#[test]
fn test_thumb_follows_view_orientation() {
    let mut points = open_hand();
    points[THUMB_TIP] = Landmark::new(0.25, 0.60);

    let mirrored = GeometryEvaluator::from_config(&PipelineConfig::default());
    assert_eq!(mirrored.thumb_sense(), ThumbSense::TipLeftOfJoint);
    let result = mirrored.classify(&right(points.clone())).unwrap();
    assert_eq!(result.state(FingerId::Thumb), FingerState::Bent);

    let config = PipelineConfig {
        mirror_view: false,
        ..PipelineConfig::default()
    };
    let unmirrored = GeometryEvaluator::from_config(&config);
    let result = unmirrored.classify(&right(points)).unwrap();
    assert_eq!(result.state(FingerId::Thumb), FingerState::Straight);
}

#[test]
fn test_classification_is_repeatable() {
    let evaluator = GeometryEvaluator::default();
    let snapshot = left(index_curled());
    let first = evaluator.classify(&snapshot).unwrap();
    let second = evaluator.classify(&snapshot).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_short_snapshot_rejected() {
    let mut points = open_hand();
    points.truncate(20);
    let err = GeometryEvaluator::default().classify(&right(points)).unwrap_err();
    assert!(matches!(err, HandcueError::InvalidSnapshot { count: 20 }));
}

#[test]
fn test_open_hand_segment_ratios() {
    let points = open_hand();
    assert_relative_eq!(
        segment_ratio(&points[MIDDLE_MCP], &points[MIDDLE_PIP], &points[MIDDLE_TIP]),
        1.0,
        epsilon = 1e-9
    );
    assert_relative_eq!(
        segment_ratio(&points[RING_MCP], &points[RING_PIP], &points[RING_TIP]),
        0.11 / 0.12,
        epsilon = 1e-9
    );
}
