use std::path::PathBuf;
use std::fs;
use directories::ProjectDirs;
use crate::common::error::{GestureAuthError, Result};

const DEV_BASE_DIR: &str = "./dev_data";

/// Resolves where the user database lives.
///
/// Dev mode keeps everything under `./dev_data` so a test run never touches
/// the real enrollment data.
#[derive(Debug, Clone)]
pub struct DevMode {
    enabled: bool,
    base_dir: PathBuf,
}

impl DevMode {
    pub fn new(enabled: bool) -> Result<Self> {
        let base_dir = if enabled {
            PathBuf::from(DEV_BASE_DIR)
        } else {
            let dirs = ProjectDirs::from("com", "gesturesup", "GestureSup")
                .ok_or_else(|| GestureAuthError::Storage("Failed to get project dirs".into()))?;
            dirs.data_dir().to_path_buf()
        };

        Self::with_base_dir(enabled, base_dir)
    }

    pub fn with_base_dir(enabled: bool, base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(base_dir.join("users"))?;

        if enabled {
            tracing::info!("Development mode enabled - data will be saved to: {}",
                           base_dir.display());
        }

        Ok(Self { enabled, base_dir })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("users")
    }
}
