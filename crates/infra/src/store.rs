use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use podium_domain::identity::Identity;
use podium_domain::ports::identity::{IdentityStore, StoreError};
use serde::Serialize;
use serde::de::DeserializeOwned;

const IDENTITY_FILE: &str = "user.json";
const VOTED_FILE: &str = "voted_questions.json";

/// One JSON document per key under `state_dir`, mirroring the key-value
/// layout the web client kept in browser storage. Unreadable state is
/// discarded with a warning, never surfaced to callers.
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    dir: PathBuf,
}

impl FileIdentityStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read_key<T: DeserializeOwned>(&self, file: &str) -> Option<T> {
        let path = self.dir.join(file);
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "discarding unreadable state file"
                );
                None
            }
        }
    }

    fn write_key<T: Serialize>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|err| StoreError::Io(err.to_string()))?;
        let payload =
            serde_json::to_string(value).map_err(|err| StoreError::Encode(err.to_string()))?;
        fs::write(self.dir.join(file), payload).map_err(|err| StoreError::Io(err.to_string()))
    }
}

impl IdentityStore for FileIdentityStore {
    fn identity(&self) -> Option<Identity> {
        self.read_key(IDENTITY_FILE)
    }

    fn set_identity(&self, identity: &Identity) -> Result<(), StoreError> {
        self.write_key(IDENTITY_FILE, identity)
    }

    fn voted_ids(&self) -> HashSet<i64> {
        self.read_key::<Vec<i64>>(VOTED_FILE)
            .map(|ids| ids.into_iter().collect())
            .unwrap_or_default()
    }

    fn add_voted_id(&self, question_id: i64) -> Result<(), StoreError> {
        let mut ids = self.voted_ids();
        if !ids.insert(question_id) {
            return Ok(());
        }
        let mut sorted: Vec<i64> = ids.into_iter().collect();
        sorted.sort_unstable();
        self.write_key(VOTED_FILE, &sorted)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    fn temp_store() -> (FileIdentityStore, PathBuf) {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let dir = std::env::temp_dir().join(format!(
            "podium-store-test-{}-{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        (FileIdentityStore::new(&dir), dir)
    }

    fn alice() -> Identity {
        Identity {
            name: "Alice".to_string(),
            phone_number: "9812345678".to_string(),
        }
    }

    #[test]
    fn identity_round_trips() {
        let (store, dir) = temp_store();
        assert_eq!(store.identity(), None);

        store.set_identity(&alice()).unwrap();
        assert_eq!(store.identity(), Some(alice()));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn voted_ids_persist_sorted_and_idempotent() {
        let (store, dir) = temp_store();
        store.add_voted_id(9).unwrap();
        store.add_voted_id(3).unwrap();
        store.add_voted_id(9).unwrap();

        assert_eq!(store.voted_ids(), [3, 9].into_iter().collect());
        let raw = fs::read_to_string(dir.join(VOTED_FILE)).unwrap();
        assert_eq!(raw, "[3,9]");

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn corrupt_state_degrades_to_defaults() {
        let (store, dir) = temp_store();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(IDENTITY_FILE), "not json").unwrap();
        fs::write(dir.join(VOTED_FILE), "{\"nope\":1}").unwrap();

        assert_eq!(store.identity(), None);
        assert!(store.voted_ids().is_empty());

        // A write after corruption starts clean.
        store.add_voted_id(5).unwrap();
        assert_eq!(store.voted_ids(), [5].into_iter().collect());

        let _ = fs::remove_dir_all(dir);
    }
}
