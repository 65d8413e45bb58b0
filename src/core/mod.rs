pub mod auth;
pub mod enrollment;
pub mod features;
pub mod liveness;
pub mod session;
pub mod similarity;

pub use auth::{GestureAuth, UserInfo, VerifyOutcome};
pub use enrollment::{EnrollmentAggregator, FrameOutcome};
pub use features::{extract_frame, extract_one, extract_two, FeatureVector, HandMode, HandObservation, LandmarkPoint};
pub use liveness::{Decision, LivenessPolicy, LivenessState, LivenessVerifier};
pub use session::{record_gesture, run_live, RecordingPolicy, RecordingProgress};
pub use similarity::{check_threshold, euclidean_distance, score_optional, similarity_score, similarity_with_scale, DISTANCE_SCALE};
