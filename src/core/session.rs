use std::time::Duration;
use crate::capture::{CancelSignal, FrameSource};
use crate::common::{GestureAuthError, Result};
use crate::core::enrollment::{EnrollmentAggregator, FrameOutcome};
use crate::core::features::{FeatureVector, HandMode};
use crate::core::liveness::{Decision, LivenessVerifier};

/// Recording window for one enrollment-style capture.
#[derive(Debug, Clone, Copy)]
pub struct RecordingPolicy {
    pub duration: Duration,
    pub min_frames: usize,
}

/// Progress of a recording, reported after every frame.
#[derive(Debug, Clone, Copy)]
pub struct RecordingProgress {
    pub elapsed: Duration,
    pub remaining: Duration,
    pub frames: usize,
    pub outcome: FrameOutcome,
}

/// Records a gesture for `policy.duration` and averages it into one vector.
///
/// Ends early when the source runs dry or fails; the minimum-frame rule
/// still decides the result. Cancellation discards everything captured.
pub fn record_gesture<S, C, F>(
    source: &mut S,
    cancel: &mut C,
    mode: HandMode,
    policy: RecordingPolicy,
    mut on_progress: F,
) -> Result<FeatureVector>
where
    S: FrameSource + ?Sized,
    C: CancelSignal + ?Sized,
    F: FnMut(&RecordingProgress),
{
    let mut aggregator = EnrollmentAggregator::new(mode, policy.min_frames);
    tracing::info!("Recording {} gesture for {:?}", mode, policy.duration);

    loop {
        if cancel.is_cancelled() {
            tracing::info!("Recording cancelled after {} frames", aggregator.frames());
            return Err(GestureAuthError::Cancelled);
        }

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::debug!("Frame source exhausted");
                break;
            }
            Err(e) => {
                tracing::warn!("Frame source failed, ending recording: {}", e);
                break;
            }
        };

        if frame.elapsed >= policy.duration {
            break;
        }

        let outcome = aggregator.push_frame(&frame.hands);
        on_progress(&RecordingProgress {
            elapsed: frame.elapsed,
            remaining: policy.duration.saturating_sub(frame.elapsed),
            frames: aggregator.frames(),
            outcome,
        });
    }

    tracing::info!(
        "Recording finished: {} frames used, {} skipped",
        aggregator.frames(),
        aggregator.skipped()
    );
    aggregator.finish()
}

/// Feeds live frames to `verifier` until it reaches a terminal decision.
///
/// Every decision, including the terminal one, is passed to `on_decision`.
pub fn run_live<S, C, F>(
    verifier: &mut LivenessVerifier,
    source: &mut S,
    cancel: &mut C,
    max_duration: Option<Duration>,
    mut on_decision: F,
) -> Result<Decision>
where
    S: FrameSource + ?Sized,
    C: CancelSignal + ?Sized,
    F: FnMut(&Decision),
{
    loop {
        let decision = if cancel.is_cancelled() {
            verifier.cancel()
        } else {
            match source.next_frame() {
                Ok(Some(frame)) => match max_duration {
                    Some(limit) if frame.elapsed >= limit => verifier.time_out(),
                    _ => verifier.step(&frame.hands)?,
                },
                Ok(None) => verifier.end_of_stream(),
                Err(e) => {
                    tracing::warn!("Frame source failed: {}", e);
                    verifier.end_of_stream()
                }
            }
        };

        on_decision(&decision);
        if decision.is_terminal() {
            tracing::info!("Live verification ended after {} frames: {:?}",
                           verifier.frames_seen(), decision);
            return Ok(decision);
        }
    }
}
