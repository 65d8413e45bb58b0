use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::common::error::{GestureAuthError, Result};
use crate::core::similarity::{check_threshold, DISTANCE_SCALE};

pub const DEFAULT_CONFIG_PATH: &str = "configs/gesture-auth.toml";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub enrollment: EnrollmentConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Recording window shared by registration and single-shot verification.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EnrollmentConfig {
    #[serde(default = "default_duration_seconds")]
    pub duration_seconds: u64,
    #[serde(default = "default_min_frames")]
    pub min_frames: usize,
}

fn default_duration_seconds() -> u64 { 8 }
fn default_min_frames() -> usize { 60 }

impl Default for EnrollmentConfig {
    fn default() -> Self {
        Self {
            duration_seconds: default_duration_seconds(),
            min_frames: default_min_frames(),
        }
    }
}

impl EnrollmentConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_seconds)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VerificationConfig {
    /// Minimum similarity score (0-100) for a frame or session to count as a match.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Consecutive matching frames needed by live verification.
    #[serde(default = "default_required_stable_frames")]
    pub required_stable_frames: u32,
    /// Live verification runs until cancel or stream end when unset.
    #[serde(default)]
    pub max_duration_seconds: Option<u64>,
}

fn default_threshold() -> f64 { 75.0 }
fn default_required_stable_frames() -> u32 { 15 }

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            required_stable_frames: default_required_stable_frames(),
            max_duration_seconds: None,
        }
    }
}

impl VerificationConfig {
    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration_seconds.map(Duration::from_secs)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MatchingConfig {
    /// Euclidean distance at which the similarity score reaches zero.
    /// Templates enrolled with a different value are not comparable.
    #[serde(default = "default_distance_scale")]
    pub distance_scale: f64,
}

fn default_distance_scale() -> f64 { DISTANCE_SCALE }

impl Default for MatchingConfig {
    fn default() -> Self {
        Self { distance_scale: default_distance_scale() }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CaptureConfig {
    /// Frame rate assumed for replayed frames that carry no timestamp.
    #[serde(default = "default_replay_fps")]
    pub replay_fps: u32,
}

fn default_replay_fps() -> u32 { 30 }

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { replay_fps: default_replay_fps() }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    /// File name of the user database, relative to the data directory.
    #[serde(default = "default_users_db")]
    pub users_db: PathBuf,
}

fn default_users_db() -> PathBuf { PathBuf::from("users_db.json") }

impl Default for StorageConfig {
    fn default() -> Self {
        Self { users_db: default_users_db() }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_or_default(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Like `load_from_path`, but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GestureAuthError::Config(format!(
                "Config file not found: {}", path.display()
            )));
        }

        tracing::info!("Loading config from: {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| GestureAuthError::Config(format!("Config parse error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.enrollment.duration_seconds == 0 {
            return Err(GestureAuthError::Config(
                "Enrollment duration must be at least 1 second".into()
            ));
        }
        if self.enrollment.min_frames == 0 {
            return Err(GestureAuthError::Config(
                "Minimum enrollment frames must be at least 1".into()
            ));
        }

        check_threshold(self.verification.threshold)?;
        if self.verification.required_stable_frames == 0 {
            return Err(GestureAuthError::Config(
                "Required stable frames must be at least 1".into()
            ));
        }
        if self.verification.max_duration_seconds == Some(0) {
            return Err(GestureAuthError::Config(
                "Max verification duration must be at least 1 second when set".into()
            ));
        }

        let scale = self.matching.distance_scale;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(GestureAuthError::Config(format!(
                "Distance scale must be a positive number, got {}", scale
            )));
        }

        if self.capture.replay_fps == 0 {
            return Err(GestureAuthError::Config("Replay fps must be at least 1".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.enrollment.duration_seconds, 8);
        assert_eq!(config.enrollment.min_frames, 60);
        assert_eq!(config.verification.threshold, 75.0);
        assert_eq!(config.verification.required_stable_frames, 15);
        assert!(config.verification.max_duration().is_none());
        assert_eq!(config.matching.distance_scale, 5.0);
        assert_eq!(config.storage.users_db, PathBuf::from("users_db.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = Config::from_toml(
            "[verification]\nthreshold = 80.0\nmax_duration_seconds = 30\n",
        ).unwrap();
        assert_eq!(config.verification.threshold, 80.0);
        assert_eq!(config.verification.required_stable_frames, 15);
        assert_eq!(config.verification.max_duration(), Some(Duration::from_secs(30)));
        assert_eq!(config.enrollment.min_frames, 60);
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let err = Config::from_toml("[verification]\nthreshold = 120.0\n").unwrap_err();
        assert!(matches!(err, GestureAuthError::Config(_)));
    }

    #[test]
    fn rejects_zero_distance_scale() {
        let err = Config::from_toml("[matching]\ndistance_scale = 0.0\n").unwrap_err();
        assert!(matches!(err, GestureAuthError::Config(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load_or_default(Path::new("/nonexistent/gesture.toml")).unwrap();
        assert_eq!(config.enrollment.min_frames, 60);
        assert!(Config::load_from_path(Path::new("/nonexistent/gesture.toml")).is_err());
    }
}
