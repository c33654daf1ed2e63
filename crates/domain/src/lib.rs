pub mod error;
pub mod feed;
pub mod identity;
pub mod leaderboard;
pub mod ports;
pub mod questions;
pub mod sessions;
pub mod submit;
pub mod vote;

pub type DomainResult<T> = Result<T, error::DomainError>;
