// Core modules
pub mod capture;
pub mod cli;
pub mod common;
pub mod core;
pub mod storage;

// Re-export commonly used types
pub use capture::{CancelFlag, CancelSignal, Frame, FrameSource, NeverCancel, ReplaySource, ScriptedSource};
pub use common::{Config, DevMode, GestureAuthError, Result};
pub use self::core::{
    Decision, EnrollmentAggregator, FeatureVector, GestureAuth, HandMode, HandObservation,
    LandmarkPoint, LivenessVerifier, VerifyOutcome,
};
pub use storage::{EnrollmentTemplate, MemoryStore, TemplateStore, UserStore};
