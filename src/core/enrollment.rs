use crate::common::{GestureAuthError, Result};
use crate::core::features::{extract_frame, FeatureVector, HandMode, HandObservation};

/// Outcome of offering one frame to the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Accepted,
    /// Not enough hands for the hand-mode.
    NoHands,
    /// Detector returned an observation without 21 landmarks.
    Malformed,
}

/// Running per-index mean of the feature vectors seen during a recording window.
///
/// Skipped frames leave the accumulator untouched; only `finish` decides
/// whether enough frames were captured.
#[derive(Debug, Clone)]
pub struct EnrollmentAggregator {
    mode: HandMode,
    min_frames: usize,
    mean: Vec<f64>,
    frames: usize,
    skipped: usize,
}

impl EnrollmentAggregator {
    pub fn new(mode: HandMode, min_frames: usize) -> Self {
        Self {
            mode,
            min_frames,
            mean: vec![0.0; mode.feature_len()],
            frames: 0,
            skipped: 0,
        }
    }

    pub fn mode(&self) -> HandMode {
        self.mode
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn push_frame(&mut self, hands: &[HandObservation]) -> FrameOutcome {
        match extract_frame(self.mode, hands) {
            Ok(Some(features)) => {
                self.accumulate(&features);
                FrameOutcome::Accepted
            }
            Ok(None) => {
                self.skipped += 1;
                FrameOutcome::NoHands
            }
            Err(e) => {
                tracing::warn!("Skipping frame: {}", e);
                self.skipped += 1;
                FrameOutcome::Malformed
            }
        }
    }

    /// Adds an already extracted vector; it must match the hand-mode's layout.
    pub fn push_features(&mut self, features: &[f64]) -> Result<()> {
        if features.len() != self.mean.len() {
            return Err(GestureAuthError::IncompatibleVectors {
                left: features.len(),
                right: self.mean.len(),
            });
        }
        self.accumulate(features);
        Ok(())
    }

    fn accumulate(&mut self, features: &[f64]) {
        self.frames += 1;
        let n = self.frames as f64;
        // Incremental mean stays exact when every frame carries the same vector.
        for (m, &x) in self.mean.iter_mut().zip(features) {
            *m += (x - *m) / n;
        }
    }

    pub fn finish(self) -> Result<FeatureVector> {
        if self.frames < self.min_frames {
            return Err(GestureAuthError::InsufficientSamples {
                captured: self.frames,
                required: self.min_frames,
            });
        }
        Ok(self.mean)
    }
}
