pub mod user_store;

pub use user_store::UserStore;

use std::collections::BTreeMap;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use crate::common::{GestureAuthError, Result};
use crate::core::features::{FeatureVector, HandMode};

/// A user's enrolled gesture: the averaged feature vector and the hand-mode
/// it was recorded in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StoredRecord")]
pub struct EnrollmentTemplate {
    vector: FeatureVector,
    hand_mode: HandMode,
    created_at: NaiveDateTime,
}

impl EnrollmentTemplate {
    pub fn new(vector: FeatureVector, hand_mode: HandMode) -> Result<Self> {
        Self::with_created_at(vector, hand_mode, chrono::Local::now().naive_local())
    }

    pub fn with_created_at(
        vector: FeatureVector,
        hand_mode: HandMode,
        created_at: NaiveDateTime,
    ) -> Result<Self> {
        if vector.len() != hand_mode.feature_len() {
            return Err(GestureAuthError::IncompatibleVectors {
                left: vector.len(),
                right: hand_mode.feature_len(),
            });
        }
        Ok(Self { vector, hand_mode, created_at })
    }

    pub fn vector(&self) -> &[f64] {
        &self.vector
    }

    pub fn hand_mode(&self) -> HandMode {
        self.hand_mode
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }
}

/// On-disk shape of a record. Also accepts the older
/// `{gesture, two_hands, created_at}` layout.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord {
    #[serde(alias = "gesture")]
    vector: FeatureVector,
    #[serde(default)]
    hand_mode: Option<HandMode>,
    #[serde(default, rename = "two_hands")]
    two_hands: Option<bool>,
    #[serde(alias = "created_at")]
    created_at: NaiveDateTime,
}

impl TryFrom<StoredRecord> for EnrollmentTemplate {
    type Error = GestureAuthError;

    fn try_from(record: StoredRecord) -> Result<Self> {
        // Untagged records predate one-hand support and are two-hand.
        let mode = record
            .hand_mode
            .or(record.two_hands.map(HandMode::from_two_hands))
            .unwrap_or(HandMode::Two);
        Self::with_created_at(record.vector, mode, record.created_at)
    }
}

/// Per-username template storage.
///
/// `put` never replaces an existing record; a second registration of the
/// same username fails with `DuplicateUser` and leaves the first intact.
pub trait TemplateStore {
    fn get(&self, username: &str) -> Option<EnrollmentTemplate>;

    fn exists(&self, username: &str) -> bool {
        self.get(username).is_some()
    }

    fn put(&mut self, username: &str, template: EnrollmentTemplate) -> Result<()>;

    /// Usernames in ascending order.
    fn list_usernames(&self) -> Vec<String>;
}

/// Non-persistent store, for tests and embedding callers that persist elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: BTreeMap<String, EnrollmentTemplate>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TemplateStore for MemoryStore {
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
        self.users.insert(username.to_string(), template);
        Ok(())
    }

    fn list_usernames(&self) -> Vec<String> {
        self.users.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(value: f64) -> EnrollmentTemplate {
        EnrollmentTemplate::new(vec![value; HandMode::One.feature_len()], HandMode::One).unwrap()
    }

    #[test]
    fn template_rejects_inconsistent_hand_mode() {
        let err = EnrollmentTemplate::new(vec![0.0; 73], HandMode::Two).unwrap_err();
        assert!(matches!(err, GestureAuthError::IncompatibleVectors { left: 73, right: 148 }));
    }

    #[test]
    fn put_never_overwrites() {
        let mut store = MemoryStore::new();
        store.put("alice", template(1.0)).unwrap();
        let before = store.get("alice");

        let err = store.put("alice", template(2.0)).unwrap_err();
        assert!(matches!(err, GestureAuthError::DuplicateUser(ref u) if u == "alice"));
        assert_eq!(store.get("alice"), before);
    }

    #[test]
    fn lists_usernames_sorted() {
        let mut store = MemoryStore::new();
        store.put("carol", template(0.0)).unwrap();
        store.put("alice", template(0.0)).unwrap();
        assert_eq!(store.list_usernames(), vec!["alice", "carol"]);
        assert!(store.exists("carol"));
        assert!(!store.exists("bob"));
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let t = template(0.5);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["handMode"], "one");
        assert!(json["createdAt"].is_string());
        assert_eq!(json["vector"].as_array().unwrap().len(), 73);

        let back: EnrollmentTemplate = serde_json::from_value(json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn reads_legacy_record() {
        let json = serde_json::json!({
            "gesture": vec![0.25; 73],
            "two_hands": false,
            "created_at": "2024-03-09T14:22:05.123456"
        });
        let t: EnrollmentTemplate = serde_json::from_value(json).unwrap();
        assert_eq!(t.hand_mode(), HandMode::One);
        assert_eq!(t.created_at().format("%Y-%m-%d").to_string(), "2024-03-09");
    }

    #[test]
    fn untagged_legacy_record_defaults_to_two_hands() {
        let json = serde_json::json!({
            "gesture": vec![0.0; 148],
            "created_at": "2024-03-09T14:22:05"
        });
        let t: EnrollmentTemplate = serde_json::from_value(json).unwrap();
        assert_eq!(t.hand_mode(), HandMode::Two);
    }

    #[test]
    fn rejects_record_with_mismatched_length() {
        let json = serde_json::json!({
            "vector": vec![0.0; 73],
            "handMode": "two",
            "createdAt": "2024-03-09T14:22:05"
        });
        assert!(serde_json::from_value::<EnrollmentTemplate>(json).is_err());
    }
}
