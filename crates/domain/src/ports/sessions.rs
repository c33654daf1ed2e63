use crate::ports::BoxFuture;
use crate::ports::questions::ServiceResult;
use crate::questions::{RunningSession, Session};

/// Admin session surface. An external, versioned contract: schemas are
/// consumed exactly as the service publishes them.
pub trait SessionService: Send + Sync {
    /// `GET sessions/`.
    fn sessions(&self) -> BoxFuture<'_, ServiceResult<Vec<Session>>>;

    /// `GET running-sessions/`.
    fn running_sessions(&self) -> BoxFuture<'_, ServiceResult<Vec<RunningSession>>>;

    /// `PATCH running-session/toggle-questions/` with
    /// `{ session_id, is_active }`.
    fn toggle_questions(
        &self,
        session_id: i64,
        accepting: bool,
    ) -> BoxFuture<'_, ServiceResult<()>>;

    /// `PATCH running-session/{id}/`.
    fn refresh_running_session(&self, session_id: i64) -> BoxFuture<'_, ServiceResult<()>>;
}
