use thiserror::Error;

use crate::ports::BoxFuture;
use crate::questions::{Question, QuestionDraft, QuestionSnapshot, VoteBallot};

/// Failure taxonomy for remote calls: transport never reached the service,
/// a rejection carries the server's own message, and a response that cannot
/// be parsed against the endpoint schema fails closed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// The remote question service. Authoritative for question existence and
/// vote counts; this client never invents either.
pub trait QuestionService: Send + Sync {
    /// `GET questions/`: the full question list.
    fn questions(&self) -> BoxFuture<'_, ServiceResult<QuestionSnapshot>>;

    /// `GET running-session/questions/`: the running session's list plus
    /// its title.
    fn live_questions(&self) -> BoxFuture<'_, ServiceResult<QuestionSnapshot>>;

    /// `GET top-questions/`.
    fn top_questions(&self) -> BoxFuture<'_, ServiceResult<Vec<Question>>>;

    /// `POST questions/`: returns the created record with its
    /// server-assigned id.
    fn create_question(&self, draft: &QuestionDraft) -> BoxFuture<'_, ServiceResult<Question>>;

    /// `POST questions/{id}/vote/`: success is the 2xx status alone; the
    /// updated record in the body is advisory and unused.
    fn cast_vote(&self, question_id: i64, ballot: &VoteBallot)
    -> BoxFuture<'_, ServiceResult<()>>;
}
