use std::collections::HashSet;

use thiserror::Error;

use crate::identity::Identity;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(String),
    #[error("store encode error: {0}")]
    Encode(String),
}

/// Local key-value persistence for the self-asserted identity and the set of
/// question ids it has voted for. Reads never fail: absent or unreadable
/// state degrades to the empty default.
pub trait IdentityStore: Send + Sync {
    fn identity(&self) -> Option<Identity>;

    fn set_identity(&self, identity: &Identity) -> Result<(), StoreError>;

    fn voted_ids(&self) -> HashSet<i64>;

    /// Idempotent: adding a present id leaves the set observably unchanged.
    fn add_voted_id(&self, question_id: i64) -> Result<(), StoreError>;
}
