use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::ports::identity::{IdentityStore, StoreError};

const MIN_NAME_CHARS: usize = 2;
const MAX_NAME_CHARS: usize = 50;
const PHONE_DIGITS: usize = 10;

/// Self-asserted and purely local. Never checked against a server record.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub phone_number: String,
}

#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn IdentityStore>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    pub fn sign_in(&self, name: &str, phone_number: &str) -> DomainResult<Identity> {
        let identity = validate_sign_in(name, phone_number)?;
        self.store.set_identity(&identity)?;
        Ok(identity)
    }

    pub fn current(&self) -> Option<Identity> {
        self.store.identity()
    }
}

fn validate_sign_in(name: &str, phone_number: &str) -> Result<Identity, DomainError> {
    let name = name.trim();
    let name_chars = name.chars().count();
    if name_chars < MIN_NAME_CHARS {
        return Err(DomainError::Validation(format!(
            "name must be at least {MIN_NAME_CHARS} characters long"
        )));
    }
    if name_chars > MAX_NAME_CHARS {
        return Err(DomainError::Validation(format!(
            "name must be at most {MAX_NAME_CHARS} characters"
        )));
    }

    let phone_number = phone_number.trim();
    if phone_number.len() != PHONE_DIGITS || !phone_number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DomainError::Validation(format!(
            "phone number must be {PHONE_DIGITS} digits"
        )));
    }

    Ok(Identity {
        name: name.to_string(),
        phone_number: phone_number.to_string(),
    })
}

/// In-memory store for tests.
#[derive(Clone, Debug, Default)]
pub struct InMemoryIdentityStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    identity: Option<Identity>,
    voted: HashSet<i64>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(name: &str, phone_number: &str) -> Self {
        let store = Self::default();
        store.inner.lock().expect("identity store lock").identity = Some(Identity {
            name: name.to_string(),
            phone_number: phone_number.to_string(),
        });
        store
    }
}

impl IdentityStore for InMemoryIdentityStore {
    fn identity(&self) -> Option<Identity> {
        self.inner.lock().expect("identity store lock").identity.clone()
    }

    fn set_identity(&self, identity: &Identity) -> Result<(), StoreError> {
        self.inner.lock().expect("identity store lock").identity = Some(identity.clone());
        Ok(())
    }

    fn voted_ids(&self) -> HashSet<i64> {
        self.inner.lock().expect("identity store lock").voted.clone()
    }

    fn add_voted_id(&self, question_id: i64) -> Result<(), StoreError> {
        self.inner
            .lock()
            .expect("identity store lock")
            .voted
            .insert(question_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_trims_and_persists() {
        let store = Arc::new(InMemoryIdentityStore::new());
        let service = IdentityService::new(store.clone());

        let identity = service.sign_in("  Alice ", "9812345678").unwrap();
        assert_eq!(identity.name, "Alice");
        assert_eq!(service.current(), Some(identity));
    }

    #[test]
    fn sign_in_overwrites_unconditionally() {
        let store = Arc::new(InMemoryIdentityStore::signed_in("Alice", "9812345678"));
        let service = IdentityService::new(store);

        service.sign_in("Bob", "9800000000").unwrap();
        assert_eq!(service.current().unwrap().name, "Bob");
    }

    #[test]
    fn rejects_short_and_long_names() {
        assert!(validate_sign_in("A", "9812345678").is_err());
        assert!(validate_sign_in(&"x".repeat(51), "9812345678").is_err());
        assert!(validate_sign_in(&"x".repeat(50), "9812345678").is_ok());
    }

    #[test]
    fn rejects_malformed_phone_numbers() {
        assert!(validate_sign_in("Alice", "98123").is_err());
        assert!(validate_sign_in("Alice", "98123456789").is_err());
        assert!(validate_sign_in("Alice", "98123456ab").is_err());
        assert!(validate_sign_in("Alice", "9812345678").is_ok());
    }

    #[test]
    fn add_voted_id_is_idempotent() {
        let store = InMemoryIdentityStore::new();
        store.add_voted_id(5).unwrap();
        let once = store.voted_ids();
        store.add_voted_id(5).unwrap();
        assert_eq!(store.voted_ids(), once);
    }
}
