use crate::common::{GestureAuthError, Result};
use crate::core::features::{extract_frame, FeatureVector, HandMode, HandObservation};
use crate::core::similarity::{check_threshold, similarity_with_scale};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LivenessState {
    WaitingForHand,
    Scoring,
    Authenticated { score: f64 },
    Cancelled,
    StreamEnded,
    TimedOut,
}

impl LivenessState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::WaitingForHand | Self::Scoring)
    }
}

/// Per-frame verdict handed back to whoever drives the capture loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Required hands not visible; the stable run was reset.
    Waiting,
    Scored { score: f64, matched: bool, stable_frames: u32 },
    Authenticated { score: f64 },
    Cancelled,
    StreamEnded,
    TimedOut,
}

impl Decision {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Authenticated { .. } | Self::Cancelled | Self::StreamEnded | Self::TimedOut
        )
    }
}

#[derive(Debug, Clone)]
pub struct LivenessPolicy {
    pub threshold: f64,
    pub required_stable_frames: u32,
    pub distance_scale: f64,
}

impl LivenessPolicy {
    /// Threshold within `[0, 100]`, at least one stable frame, positive scale.
    pub fn validate(&self) -> Result<()> {
        check_threshold(self.threshold)?;
        if self.required_stable_frames == 0 {
            return Err(GestureAuthError::Config(
                "Required stable frames must be at least 1".into()
            ));
        }
        if !(self.distance_scale.is_finite() && self.distance_scale > 0.0) {
            return Err(GestureAuthError::Config(format!(
                "Distance scale must be a positive number, got {}", self.distance_scale
            )));
        }
        Ok(())
    }
}

/// Consecutive-match gate for live verification.
///
/// Authenticates only after `required_stable_frames` matching frames in a
/// row. Any miss, or any frame without the required hands, restarts the run
/// from zero. Once terminal, further input is ignored.
#[derive(Debug, Clone)]
pub struct LivenessVerifier {
    template: FeatureVector,
    mode: HandMode,
    policy: LivenessPolicy,
    state: LivenessState,
    stable_frames: u32,
    last_score: Option<f64>,
    frames_seen: u64,
}

impl LivenessVerifier {
    pub fn new(template: FeatureVector, mode: HandMode, policy: LivenessPolicy) -> Result<Self> {
        policy.validate()?;
        if template.len() != mode.feature_len() {
            return Err(GestureAuthError::IncompatibleVectors {
                left: mode.feature_len(),
                right: template.len(),
            });
        }

        Ok(Self {
            template,
            mode,
            policy,
            state: LivenessState::WaitingForHand,
            stable_frames: 0,
            last_score: None,
            frames_seen: 0,
        })
    }

    pub fn state(&self) -> LivenessState {
        self.state
    }

    pub fn stable_frames(&self) -> u32 {
        self.stable_frames
    }

    pub fn last_score(&self) -> Option<f64> {
        self.last_score
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    pub fn required_stable_frames(&self) -> u32 {
        self.policy.required_stable_frames
    }

    pub fn step(&mut self, hands: &[HandObservation]) -> Result<Decision> {
        if let Some(decision) = self.terminal_decision() {
            return Ok(decision);
        }
        self.frames_seen += 1;

        let features = match extract_frame(self.mode, hands) {
            Ok(Some(features)) => features,
            Ok(None) => return Ok(self.wait()),
            Err(e) => {
                tracing::warn!("Treating frame as no detection: {}", e);
                return Ok(self.wait());
            }
        };

        let score = similarity_with_scale(&features, &self.template, self.policy.distance_scale)?;
        let matched = score >= self.policy.threshold;
        self.last_score = Some(score);
        self.stable_frames = if matched { self.stable_frames + 1 } else { 0 };

        tracing::debug!(
            "Frame {}: match {:.1}% {} (stable {}/{})",
            self.frames_seen,
            score,
            if matched { "✓" } else { "✗" },
            self.stable_frames,
            self.policy.required_stable_frames
        );

        if self.stable_frames >= self.policy.required_stable_frames {
            self.state = LivenessState::Authenticated { score };
            return Ok(Decision::Authenticated { score });
        }

        self.state = LivenessState::Scoring;
        Ok(Decision::Scored { score, matched, stable_frames: self.stable_frames })
    }

    pub fn cancel(&mut self) -> Decision {
        self.finish_with(LivenessState::Cancelled)
    }

    pub fn end_of_stream(&mut self) -> Decision {
        self.finish_with(LivenessState::StreamEnded)
    }

    pub fn time_out(&mut self) -> Decision {
        self.finish_with(LivenessState::TimedOut)
    }

    fn wait(&mut self) -> Decision {
        self.stable_frames = 0;
        self.state = LivenessState::WaitingForHand;
        Decision::Waiting
    }

    fn finish_with(&mut self, state: LivenessState) -> Decision {
        if !self.state.is_terminal() {
            self.state = state;
        }
        self.terminal_decision().unwrap_or(Decision::Waiting)
    }

    fn terminal_decision(&self) -> Option<Decision> {
        match self.state {
            LivenessState::Authenticated { score } => Some(Decision::Authenticated { score }),
            LivenessState::Cancelled => Some(Decision::Cancelled),
            LivenessState::StreamEnded => Some(Decision::StreamEnded),
            LivenessState::TimedOut => Some(Decision::TimedOut),
            LivenessState::WaitingForHand | LivenessState::Scoring => None,
        }
    }
}
