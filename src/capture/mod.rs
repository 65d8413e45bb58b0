pub mod replay;

pub use replay::ReplaySource;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use crate::common::Result;
use crate::core::features::HandObservation;

/// One camera frame after landmark detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Monotonic time since the capture session started.
    pub elapsed: Duration,
    pub hands: Vec<HandObservation>,
}

/// Anything that yields detected hands frame by frame: a camera plus
/// detector, a recorded stream, or a test script.
pub trait FrameSource {
    /// `Ok(None)` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Cooperative abort, polled once per frame boundary.
pub trait CancelSignal {
    fn is_cancelled(&mut self) -> bool;
}

pub struct NeverCancel;

impl CancelSignal for NeverCancel {
    fn is_cancelled(&mut self) -> bool {
        false
    }
}

/// Cancel flag shareable with another thread (a GUI button, a signal handler).
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl CancelSignal for CancelFlag {
    fn is_cancelled(&mut self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// In-memory frames delivered at a fixed rate.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    frames: VecDeque<Vec<HandObservation>>,
    interval: Duration,
    index: u32,
}

impl ScriptedSource {
    pub fn new(frames: impl IntoIterator<Item = Vec<HandObservation>>, fps: u32) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            interval: Duration::from_secs(1) / fps.max(1),
            index: 0,
        }
    }

    /// The same detection repeated `count` times.
    pub fn repeat(hands: Vec<HandObservation>, count: usize, fps: u32) -> Self {
        Self::new(std::iter::repeat(hands).take(count), fps)
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(hands) = self.frames.pop_front() else {
            return Ok(None);
        };
        let elapsed = self.interval * self.index;
        self.index += 1;
        Ok(Some(Frame { elapsed, hands }))
    }
}
