use thiserror::Error;

#[derive(Error, Debug)]
pub enum GestureAuthError {
    #[error("Username already exists: {0}")]
    DuplicateUser(String),

    #[error("User not found: {0}")]
    UnknownUser(String),

    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),

    #[error("Incompatible vectors: {left} values vs {right} values (hand-mode mismatch)")]
    IncompatibleVectors { left: usize, right: usize },

    #[error("Gesture recording failed: captured {captured} frames, need at least {required}")]
    InsufficientSamples { captured: usize, required: usize },

    #[error("Cancelled by user")]
    Cancelled,

    #[error("Frame source ended before authentication completed")]
    StreamEnded,

    #[error("Verification timed out after {0} seconds")]
    TimedOut(u64),

    #[error("Gesture doesn't match! (Match: {score:.2}%)")]
    BelowThreshold { score: f64 },

    #[error("Malformed hand observation: expected 21 landmarks, got {0}")]
    MalformedObservation(usize),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl GestureAuthError {
    /// Expected authentication outcomes, as opposed to environment failures.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DuplicateUser(_)
                | Self::UnknownUser(_)
                | Self::InvalidUsername(_)
                | Self::IncompatibleVectors { .. }
                | Self::InsufficientSamples { .. }
                | Self::Cancelled
                | Self::StreamEnded
                | Self::TimedOut(_)
                | Self::BelowThreshold { .. }
                | Self::MalformedObservation(_)
        )
    }

    /// Match percentage attached to the outcome, if any.
    pub fn score(&self) -> Option<f64> {
        match self {
            Self::BelowThreshold { score } => Some(*score),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GestureAuthError>;
