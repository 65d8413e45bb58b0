//! Hand landmarks to fixed-layout feature vectors.
//!
//! One-hand layout (73 values):
//! - `0..63`   raw x, y, z of the 21 landmarks
//! - `63..68`  fingertip direction angles, `atan2(dy, dx)` of tip minus landmark `tip - 2`
//! - `68..73`  planar fingertip-to-wrist distances
//!
//! Two-hand layout (148 values): hand A (73), hand B (73), wrist-to-wrist 3-D
//! distance, wrist-to-wrist planar angle.
//!
//! Stored templates depend on this layout; indices must never move.

use serde::{Deserialize, Serialize};
use crate::common::{GestureAuthError, Result};

pub const LANDMARK_COUNT: usize = 21;
/// Wrist landmark, used as the palm center of a hand.
pub const PALM_CENTER: usize = 0;
pub const FINGERTIP_IDS: [usize; 5] = [4, 8, 12, 16, 20];
/// Fingertip angles are taken against the landmark this many places back.
pub const ANGLE_JOINT_OFFSET: usize = 2;

pub const ONE_HAND_FEATURES: usize = LANDMARK_COUNT * 3 + FINGERTIP_IDS.len() * 2;
pub const TWO_HAND_FEATURES: usize = ONE_HAND_FEATURES * 2 + 2;

pub type FeatureVector = Vec<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl LandmarkPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<[f64; 3]> for LandmarkPoint {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<LandmarkPoint> for [f64; 3] {
    fn from(p: LandmarkPoint) -> Self {
        [p.x, p.y, p.z]
    }
}

/// Landmarks of one detected hand, as reported by the detector.
///
/// Well-formed observations have exactly [`LANDMARK_COUNT`] points; the type
/// accepts anything so a misbehaving detector can be rejected per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandObservation {
    landmarks: Vec<LandmarkPoint>,
}

impl HandObservation {
    pub fn new(landmarks: Vec<LandmarkPoint>) -> Self {
        Self { landmarks }
    }

    pub fn landmarks(&self) -> &[LandmarkPoint] {
        &self.landmarks
    }

    pub fn is_well_formed(&self) -> bool {
        self.landmarks.len() == LANDMARK_COUNT
    }

    pub fn palm_center(&self) -> Option<LandmarkPoint> {
        self.landmarks.get(PALM_CENTER).copied()
    }

    fn checked(&self) -> Result<&[LandmarkPoint]> {
        if self.is_well_formed() {
            Ok(&self.landmarks)
        } else {
            Err(GestureAuthError::MalformedObservation(self.landmarks.len()))
        }
    }
}

impl From<Vec<[f64; 3]>> for HandObservation {
    fn from(points: Vec<[f64; 3]>) -> Self {
        Self::new(points.into_iter().map(LandmarkPoint::from).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandMode {
    One,
    Two,
}

impl HandMode {
    pub fn from_two_hands(two_hands: bool) -> Self {
        if two_hands { Self::Two } else { Self::One }
    }

    pub fn required_hands(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    pub fn feature_len(self) -> usize {
        match self {
            Self::One => ONE_HAND_FEATURES,
            Self::Two => TWO_HAND_FEATURES,
        }
    }

    /// Hand-mode implied by a vector length, if it is one of the two layouts.
    pub fn for_feature_len(len: usize) -> Option<Self> {
        match len {
            ONE_HAND_FEATURES => Some(Self::One),
            TWO_HAND_FEATURES => Some(Self::Two),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::One => "One-Hand",
            Self::Two => "Two-Hand",
        }
    }
}

impl std::fmt::Display for HandMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

pub fn extract_one(hand: &HandObservation) -> Result<FeatureVector> {
    let lm = hand.checked()?;
    let mut features = Vec::with_capacity(ONE_HAND_FEATURES);

    for p in lm {
        features.extend_from_slice(&[p.x, p.y, p.z]);
    }

    // Fixed topological offset: for the thumb this is landmark 2, not the adjacent joint.
    for &tip in &FINGERTIP_IDS {
        let joint = lm[tip - ANGLE_JOINT_OFFSET];
        features.push((lm[tip].y - joint.y).atan2(lm[tip].x - joint.x));
    }

    let palm = lm[PALM_CENTER];
    for &tip in &FINGERTIP_IDS {
        let dx = lm[tip].x - palm.x;
        let dy = lm[tip].y - palm.y;
        features.push((dx * dx + dy * dy).sqrt());
    }

    Ok(features)
}

pub fn extract_two(hand_a: &HandObservation, hand_b: &HandObservation) -> Result<FeatureVector> {
    let a = extract_one(hand_a)?;
    let b = extract_one(hand_b)?;

    let ca = hand_a.checked()?[PALM_CENTER];
    let cb = hand_b.checked()?[PALM_CENTER];
    let (dx, dy, dz) = (cb.x - ca.x, cb.y - ca.y, cb.z - ca.z);

    let mut features = Vec::with_capacity(TWO_HAND_FEATURES);
    features.extend(a);
    features.extend(b);
    features.push((dx * dx + dy * dy + dz * dz).sqrt());
    features.push(dy.atan2(dx));
    Ok(features)
}

/// Features for one frame under the given hand-mode.
///
/// `Ok(None)` when too few hands were detected. Extra hands beyond the
/// mode's requirement are ignored in detector order.
pub fn extract_frame(mode: HandMode, hands: &[HandObservation]) -> Result<Option<FeatureVector>> {
    if hands.len() < mode.required_hands() {
        return Ok(None);
    }

    match mode {
        HandMode::One => extract_one(&hands[0]).map(Some),
        HandMode::Two => extract_two(&hands[0], &hands[1]).map(Some),
    }
}
