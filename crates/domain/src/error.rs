use thiserror::Error;

use crate::ports::identity::StoreError;
use crate::ports::questions::ServiceError;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("you have already voted for this question")]
    AlreadyVoted,
    #[error("you cannot vote for your own question")]
    OwnQuestion,
    #[error("no identity is signed in")]
    NotSignedIn,
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
