use crate::common::{Config, DevMode, GestureAuthError, Result};
use crate::storage::{EnrollmentTemplate, TemplateStore};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::fs;

/// JSON-file template store.
///
/// The whole file is read once on open and rewritten on every successful
/// `put`. Writes go to a sibling temp file that is renamed over the database,
/// so a crash mid-write leaves the previous contents intact.
pub struct UserStore {
    path: PathBuf,
    users: BTreeMap<String, EnrollmentTemplate>,
}

impl UserStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let users = Self::load(&path)?;
        tracing::debug!("Loaded {} user(s) from {}", users.len(), path.display());
        Ok(Self { path, users })
    }

    pub fn new_with_dev_mode(dev_mode: &DevMode, config: &Config) -> Result<Self> {
        let path = dev_mode.data_dir().join(&config.storage.users_db);

        if dev_mode.is_enabled() {
            tracing::debug!("UserStore using dev database: {:?}", path);
        }

        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<BTreeMap<String, EnrollmentTemplate>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let data = fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&data).map_err(|e| {
            GestureAuthError::Storage(format!("Failed to read {}: {}", path.display(), e))
        })
    }

    fn flush(&self, users: &BTreeMap<String, EnrollmentTemplate>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let encoded = serde_json::to_vec_pretty(users)
            .map_err(|e| GestureAuthError::Storage(format!("Failed to serialize: {}", e)))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, encoded)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl TemplateStore for UserStore {
    fn get(&self, username: &str) -> Option<EnrollmentTemplate> {
        self.users.get(username).cloned()
    }

    fn exists(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    fn put(&mut self, username: &str, template: EnrollmentTemplate) -> Result<()> {
        if self.users.contains_key(username) {
            return Err(GestureAuthError::DuplicateUser(username.to_string()));
        }

        // Commit in memory only once the file is durably written.
        let mut next = self.users.clone();
        next.insert(username.to_string(), template);
        self.flush(&next)?;
        self.users = next;

        tracing::info!("Saved template for '{}' to {}", username, self.path.display());
        Ok(())
    }

    fn list_usernames(&self) -> Vec<String> {
        self.users.keys().cloned().collect()
    }
}
