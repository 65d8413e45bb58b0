use crate::{
    capture::{CancelSignal, FrameSource},
    common::{Config, GestureAuthError, Result},
    core::{
        features::HandMode,
        liveness::{Decision, LivenessPolicy, LivenessVerifier},
        session::{record_gesture, run_live, RecordingPolicy, RecordingProgress},
        similarity::{check_threshold, similarity_with_scale},
    },
    storage::{EnrollmentTemplate, TemplateStore},
};
use chrono::NaiveDateTime;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Successful verification.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyOutcome {
    pub username: String,
    pub hand_mode: HandMode,
    pub score: f64,
}

impl VerifyOutcome {
    pub fn message(&self) -> String {
        format!("Authentication successful! (Match: {:.2}%)", self.score)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserInfo {
    pub username: String,
    pub hand_mode: HandMode,
    pub created_at: NaiveDateTime,
    pub vector_len: usize,
}

/// Registration and verification on top of a template store.
///
/// The store sits behind a lock that is only held for lookups and for the
/// final insert, so a verification never waits on another user's recording.
pub struct GestureAuth<S> {
    store: RwLock<S>,
    config: Config,
}

impl<S: TemplateStore> GestureAuth<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self { store: RwLock::new(store), config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_store(self) -> Result<S> {
        self.store
            .into_inner()
            .map_err(|_| GestureAuthError::Storage("Template store lock poisoned".into()))
    }

    fn read_store(&self) -> Result<RwLockReadGuard<'_, S>> {
        self.store
            .read()
            .map_err(|_| GestureAuthError::Storage("Template store lock poisoned".into()))
    }

    fn write_store(&self) -> Result<RwLockWriteGuard<'_, S>> {
        self.store
            .write()
            .map_err(|_| GestureAuthError::Storage("Template store lock poisoned".into()))
    }

    fn recording_policy(&self) -> RecordingPolicy {
        RecordingPolicy {
            duration: self.config.enrollment.duration(),
            min_frames: self.config.enrollment.min_frames,
        }
    }

    pub fn template(&self, username: &str) -> Result<EnrollmentTemplate> {
        self.read_store()?
            .get(username)
            .ok_or_else(|| GestureAuthError::UnknownUser(username.to_string()))
    }

    pub fn list_users(&self) -> Result<Vec<String>> {
        Ok(self.read_store()?.list_usernames())
    }

    pub fn user_info(&self, username: &str) -> Result<UserInfo> {
        let template = self.template(username)?;
        Ok(UserInfo {
            username: username.to_string(),
            hand_mode: template.hand_mode(),
            created_at: template.created_at(),
            vector_len: template.vector().len(),
        })
    }

    /// Records a new gesture and stores it under `username`.
    ///
    /// An existing username fails before any frame is read. Nothing is
    /// stored unless the recording succeeds.
    pub fn register(
        &self,
        username: &str,
        mode: HandMode,
        source: &mut dyn FrameSource,
        cancel: &mut dyn CancelSignal,
        on_progress: impl FnMut(&RecordingProgress),
    ) -> Result<EnrollmentTemplate> {
        if username.trim().is_empty() {
            return Err(GestureAuthError::InvalidUsername(username.to_string()));
        }
        if self.read_store()?.exists(username) {
            return Err(GestureAuthError::DuplicateUser(username.to_string()));
        }

        tracing::info!("Registering '{}' ({})", username, mode);
        let vector = record_gesture(source, cancel, mode, self.recording_policy(), on_progress)?;
        let template = EnrollmentTemplate::new(vector, mode)?;

        // put re-checks the username, covering a concurrent registration
        self.write_store()?.put(username, template.clone())?;
        tracing::info!("User '{}' registered", username);
        Ok(template)
    }

    /// Records one averaged gesture in the stored hand-mode and scores it once.
    pub fn verify_once(
        &self,
        username: &str,
        threshold: f64,
        source: &mut dyn FrameSource,
        cancel: &mut dyn CancelSignal,
        on_progress: impl FnMut(&RecordingProgress),
    ) -> Result<VerifyOutcome> {
        check_threshold(threshold)?;
        let template = self.template(username)?;
        let mode = template.hand_mode();

        let vector = record_gesture(source, cancel, mode, self.recording_policy(), on_progress)?;
        let score = similarity_with_scale(
            &vector,
            template.vector(),
            self.config.matching.distance_scale,
        )?;

        tracing::info!("Single-shot verification for '{}': {:.2}%", username, score);
        if score >= threshold {
            Ok(VerifyOutcome { username: username.to_string(), hand_mode: mode, score })
        } else {
            Err(GestureAuthError::BelowThreshold { score })
        }
    }

    /// Scores every live frame until `required_stable_frames` consecutive
    /// frames match, or the session is cancelled, times out, or runs dry.
    pub fn verify_live(
        &self,
        username: &str,
        threshold: f64,
        required_stable_frames: u32,
        source: &mut dyn FrameSource,
        cancel: &mut dyn CancelSignal,
        on_decision: impl FnMut(&Decision),
    ) -> Result<VerifyOutcome> {
        let policy = LivenessPolicy {
            threshold,
            required_stable_frames,
            distance_scale: self.config.matching.distance_scale,
        };
        policy.validate()?;
        let template = self.template(username)?;
        let mode = template.hand_mode();

        let mut verifier = LivenessVerifier::new(template.vector().to_vec(), mode, policy)?;

        let max_duration = self.config.verification.max_duration();
        match run_live(&mut verifier, source, cancel, max_duration, on_decision)? {
            Decision::Authenticated { score } => {
                Ok(VerifyOutcome { username: username.to_string(), hand_mode: mode, score })
            }
            Decision::Cancelled => Err(GestureAuthError::Cancelled),
            Decision::TimedOut => Err(GestureAuthError::TimedOut(
                max_duration.map(|d| d.as_secs()).unwrap_or_default(),
            )),
            _ => Err(GestureAuthError::StreamEnded),
        }
    }
}
