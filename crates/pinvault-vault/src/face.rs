// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Face-template similarity and capture collection.
//!
//! Scores combine mean landmark distance (weight 0.7) and summed head-angle
//! difference (weight 0.3). Distances are normalised by 100 px and angles by
//! 180 degrees, matching the detector's coordinate space.

use pinvault_config::model::FaceConfig;
use pinvault_core::{FaceTemplate, HeadAngles};

const LANDMARK_WEIGHT: f64 = 0.7;
const ANGLE_WEIGHT: f64 = 0.3;
const LANDMARK_SCALE: f64 = 100.0;
const ANGLE_SCALE: f64 = 180.0;

/// Similarity of two templates in `[.., 1.0]`; `1.0` means identical.
pub fn similarity(a: &FaceTemplate, b: &FaceTemplate) -> f64 {
    let (total, count) = a
        .landmarks
        .iter()
        .filter_map(|(name, pa)| b.landmarks.get(name).map(|pb| (pa, pb)))
        .fold((0.0_f64, 0_usize), |(total, count), (pa, pb)| {
            let distance = ((pa.x - pb.x).powi(2) + (pa.y - pb.y).powi(2)).sqrt();
            (total + distance, count + 1)
        });

    let landmark_score = if count > 0 {
        1.0 - total / (count as f64 * LANDMARK_SCALE)
    } else {
        0.0
    };

    let angle_diff = (a.angles.roll - b.angles.roll).abs()
        + (a.angles.pitch - b.angles.pitch).abs()
        + (a.angles.yaw - b.angles.yaw).abs();
    let angle_score = 1.0 - angle_diff / ANGLE_SCALE;

    LANDMARK_WEIGHT * landmark_score + ANGLE_WEIGHT * angle_score
}

/// Thresholds for accepting captures and matches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceMatcher {
    pub match_threshold: f64,
    pub max_angle_degrees: f64,
    pub required_templates: usize,
}

impl Default for FaceMatcher {
    fn default() -> Self {
        Self::from(&FaceConfig::default())
    }
}

impl From<&FaceConfig> for FaceMatcher {
    fn from(config: &FaceConfig) -> Self {
        Self {
            match_threshold: config.match_threshold,
            max_angle_degrees: config.max_angle_degrees,
            required_templates: config.required_templates,
        }
    }
}

impl FaceMatcher {
    /// Roll, pitch and yaw each within `±max_angle_degrees`.
    pub fn is_front_facing(&self, angles: &HeadAngles) -> bool {
        [angles.roll, angles.pitch, angles.yaw]
            .iter()
            .all(|angle| angle.abs() <= self.max_angle_degrees)
    }

    /// Highest similarity between `candidate` and any enrolled template.
    pub fn best_match(&self, candidate: &FaceTemplate, enrolled: &[FaceTemplate]) -> Option<f64> {
        enrolled
            .iter()
            .map(|template| similarity(candidate, template))
            .reduce(f64::max)
    }

    /// Whether the best score strictly exceeds the match threshold.
    pub fn matches(&self, candidate: &FaceTemplate, enrolled: &[FaceTemplate]) -> bool {
        self.best_match(candidate, enrolled)
            .is_some_and(|score| score > self.match_threshold)
    }
}

/// Result of offering one snapshot to a [`FaceEnrollment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The face was not front-facing; nothing was recorded.
    Rejected,
    /// Recorded; more captures are needed.
    Accepted { captured: usize, required: usize },
    /// Enough captures have been collected.
    Complete,
}

/// Collects front-facing snapshots until enough have been accepted.
#[derive(Debug, Clone)]
pub struct FaceEnrollment {
    matcher: FaceMatcher,
    templates: Vec<FaceTemplate>,
}

impl FaceEnrollment {
    pub fn new(matcher: FaceMatcher) -> Self {
        Self {
            matcher,
            templates: Vec::new(),
        }
    }

    /// Offer a snapshot. Once complete, further snapshots are ignored.
    pub fn offer(&mut self, snapshot: FaceTemplate) -> CaptureOutcome {
        if self.is_complete() {
            return CaptureOutcome::Complete;
        }
        if !self.matcher.is_front_facing(&snapshot.angles) {
            return CaptureOutcome::Rejected;
        }
        self.templates.push(snapshot);
        if self.is_complete() {
            CaptureOutcome::Complete
        } else {
            CaptureOutcome::Accepted {
                captured: self.templates.len(),
                required: self.matcher.required_templates,
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.templates.len() >= self.matcher.required_templates
    }

    /// Fraction of required captures collected, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        let required = self.matcher.required_templates.max(1);
        (self.templates.len().min(required)) as f64 / required as f64
    }

    pub fn templates(&self) -> &[FaceTemplate] {
        &self.templates
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pinvault_core::Point;

    use super::*;

    const EPSILON: f64 = 1e-9;

    fn template(points: &[(&str, f64, f64)], roll: f64, pitch: f64, yaw: f64) -> FaceTemplate {
        FaceTemplate {
            landmarks: points
                .iter()
                .map(|(name, x, y)| (name.to_string(), Point { x: *x, y: *y }))
                .collect::<BTreeMap<_, _>>(),
            angles: HeadAngles { roll, pitch, yaw },
        }
    }

    fn front(x: f64) -> FaceTemplate {
        template(&[("leftEye", x, 10.0), ("rightEye", x + 40.0, 10.0)], 0.0, 0.0, 0.0)
    }

    #[test]
    fn identical_templates_score_one() {
        let face = front(100.0);
        assert!((similarity(&face, &face) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn no_common_landmarks_leaves_only_angle_score() {
        let a = template(&[("leftEye", 0.0, 0.0)], 0.0, 0.0, 0.0);
        let b = template(&[("noseBase", 0.0, 0.0)], 0.0, 0.0, 0.0);
        assert!((similarity(&a, &b) - 0.3).abs() < EPSILON);
    }

    #[test]
    fn distance_and_angle_are_weighted() {
        // 3-4-5 triangle: distance 5 gives 0.95; 9 degrees of roll gives 0.95.
        let a = template(&[("leftEye", 0.0, 0.0)], 0.0, 0.0, 0.0);
        let b = template(&[("leftEye", 3.0, 4.0)], 9.0, 0.0, 0.0);
        assert!((similarity(&a, &b) - 0.95).abs() < EPSILON);
    }

    #[test]
    fn match_requires_score_strictly_above_threshold() {
        let matcher = FaceMatcher::default();
        let enrolled = vec![front(100.0)];

        assert!(matcher.matches(&front(100.0), &enrolled));
        // Far away landmarks and no angle change: 0.7 * low + 0.3 stays below 0.8.
        assert!(!matcher.matches(&front(160.0), &enrolled));
    }

    #[test]
    fn best_match_takes_the_maximum() {
        let matcher = FaceMatcher::default();
        let enrolled = vec![front(160.0), front(100.0), front(130.0)];
        let best = matcher.best_match(&front(100.0), &enrolled).unwrap();
        assert!((best - 1.0).abs() < EPSILON);
    }

    #[test]
    fn empty_enrollment_never_matches() {
        let matcher = FaceMatcher::default();
        assert!(matcher.best_match(&front(100.0), &[]).is_none());
        assert!(!matcher.matches(&front(100.0), &[]));
    }

    #[test]
    fn front_facing_bounds_are_inclusive() {
        let matcher = FaceMatcher::default();
        assert!(matcher.is_front_facing(&HeadAngles {
            roll: 20.0,
            pitch: -20.0,
            yaw: 0.0
        }));
        assert!(!matcher.is_front_facing(&HeadAngles {
            roll: 0.0,
            pitch: 0.0,
            yaw: 20.5
        }));
    }

    #[test]
    fn enrollment_completes_after_required_captures() {
        let mut enrollment = FaceEnrollment::new(FaceMatcher::default());

        assert_eq!(
            enrollment.offer(template(&[], 0.0, 45.0, 0.0)),
            CaptureOutcome::Rejected
        );
        for captured in 1..=3 {
            assert_eq!(
                enrollment.offer(front(100.0)),
                CaptureOutcome::Accepted {
                    captured,
                    required: 4
                }
            );
        }
        assert!((enrollment.progress() - 0.75).abs() < EPSILON);
        assert_eq!(enrollment.offer(front(100.0)), CaptureOutcome::Complete);
        assert!(enrollment.is_complete());

        // Extra snapshots are not recorded.
        assert_eq!(enrollment.offer(front(100.0)), CaptureOutcome::Complete);
        assert_eq!(enrollment.templates().len(), 4);
    }

    #[test]
    fn matcher_follows_config() {
        let config = FaceConfig {
            match_threshold: 0.9,
            max_angle_degrees: 10.0,
            required_templates: 2,
        };
        let matcher = FaceMatcher::from(&config);
        assert_eq!(matcher.required_templates, 2);
        assert!(!matcher.is_front_facing(&HeadAngles {
            roll: 15.0,
            ..Default::default()
        }));
    }
}
