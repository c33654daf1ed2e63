use std::sync::Arc;

use crate::DomainResult;
use crate::error::DomainError;
use crate::ports::sessions::SessionService;
use crate::questions::Session;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionOverview {
    pub sessions: Vec<Session>,
    pub running_session_id: Option<i64>,
}

impl SessionOverview {
    pub fn running(&self) -> Option<&Session> {
        self.running_session_id
            .and_then(|id| self.sessions.iter().find(|session| session.id == id))
    }
}

/// Organizer-side session management. Holds no state of its own; every
/// mutation re-fetches the overview so the caller sees what the service
/// actually did.
#[derive(Clone)]
pub struct SessionAdmin {
    service: Arc<dyn SessionService>,
}

impl SessionAdmin {
    pub fn new(service: Arc<dyn SessionService>) -> Self {
        Self { service }
    }

    pub async fn overview(&self) -> DomainResult<SessionOverview> {
        let sessions = self.service.sessions().await?;
        let running = self.service.running_sessions().await?;
        let running_session_id = running.first().map(|entry| entry.session.id);
        Ok(SessionOverview {
            sessions,
            running_session_id,
        })
    }

    /// Flips whether the session accepts questions, based on the flag as
    /// currently published.
    pub async fn toggle_questions(&self, session_id: i64) -> DomainResult<SessionOverview> {
        let overview = self.overview().await?;
        let session = overview
            .sessions
            .iter()
            .find(|session| session.id == session_id)
            .ok_or_else(|| DomainError::Validation(format!("unknown session {session_id}")))?;

        self.service
            .toggle_questions(session_id, !session.is_accepting_questions)
            .await?;
        self.overview().await
    }

    pub async fn refresh_running(&self, session_id: i64) -> DomainResult<SessionOverview> {
        self.service.refresh_running_session(session_id).await?;
        self.overview().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::{RemoteCall, RunningSession, ScriptedQuestionService};

    fn session(id: i64, accepting: bool) -> Session {
        Session {
            id,
            title: format!("session {id}"),
            is_accepting_questions: accepting,
        }
    }

    #[tokio::test]
    async fn overview_picks_the_first_running_session() {
        let service = Arc::new(ScriptedQuestionService::new());
        service.set_sessions(vec![session(1, true), session(2, false)]);
        service.set_running_sessions(vec![RunningSession {
            id: 10,
            session: session(2, false),
        }]);

        let overview = SessionAdmin::new(service).overview().await.unwrap();
        assert_eq!(overview.running_session_id, Some(2));
        assert_eq!(overview.running().unwrap().id, 2);
    }

    #[tokio::test]
    async fn toggle_sends_the_inverted_flag() {
        let service = Arc::new(ScriptedQuestionService::new());
        service.set_sessions(vec![session(3, true)]);

        SessionAdmin::new(service.clone())
            .toggle_questions(3)
            .await
            .unwrap();

        assert!(service.calls().contains(&RemoteCall::ToggleQuestions {
            session_id: 3,
            accepting: false,
        }));
    }

    #[tokio::test]
    async fn toggling_an_unknown_session_is_rejected_locally() {
        let service = Arc::new(ScriptedQuestionService::new());
        service.set_sessions(vec![session(1, true)]);

        let err = SessionAdmin::new(service.clone())
            .toggle_questions(99)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(
            !service
                .calls()
                .iter()
                .any(|call| matches!(call, RemoteCall::ToggleQuestions { .. }))
        );
    }

    #[tokio::test]
    async fn refresh_patches_then_refetches() {
        let service = Arc::new(ScriptedQuestionService::new());
        service.set_sessions(vec![session(1, true)]);

        SessionAdmin::new(service.clone())
            .refresh_running(1)
            .await
            .unwrap();

        let calls = service.calls();
        assert_eq!(calls[0], RemoteCall::RefreshRunningSession(1));
        assert!(calls.contains(&RemoteCall::Sessions));
    }
}
