use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::identity::Identity;
use crate::ports::BoxFuture;
use crate::ports::questions::{QuestionService, ServiceError, ServiceResult};
use crate::ports::sessions::SessionService;

/// A question as the remote service owns it. The client holds read-only
/// cached copies; the only local mutation is the post-confirmation vote
/// count bump.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
    pub question_text: String,
    pub vote_count: u32,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
}

/// Create payload. The service expects an explicit zero vote count.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionDraft {
    pub question_text: String,
    pub vote_count: u32,
    pub name: String,
    pub phone_number: String,
}

impl QuestionDraft {
    pub fn new(identity: &Identity, question_text: impl Into<String>) -> Self {
        Self {
            question_text: question_text.into(),
            vote_count: 0,
            name: identity.name.clone(),
            phone_number: identity.phone_number.clone(),
        }
    }
}

/// Vote payload. `userId` is optional upstream and this client never holds
/// a server-side user id.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteBallot {
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub name: String,
    pub phone_number: String,
}

impl VoteBallot {
    pub fn for_identity(identity: &Identity) -> Self {
        Self {
            user_id: None,
            name: identity.name.clone(),
            phone_number: identity.phone_number.clone(),
        }
    }
}

/// One fetched server snapshot. Authoritative and always taken whole.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuestionSnapshot {
    pub questions: Vec<Question>,
    pub session_title: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub id: i64,
    pub title: String,
    // The upstream field is misspelled on the wire; kept as published.
    #[serde(rename = "is_acepting_questions")]
    pub is_accepting_questions: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunningSession {
    pub id: i64,
    pub session: Session,
}

/// Remote calls observed by [`ScriptedQuestionService`], in issue order.
#[derive(Clone, Debug, PartialEq)]
pub enum RemoteCall {
    Questions,
    LiveQuestions,
    TopQuestions,
    CreateQuestion(QuestionDraft),
    CastVote(i64, VoteBallot),
    Sessions,
    RunningSessions,
    ToggleQuestions { session_id: i64, accepting: bool },
    RefreshRunningSession(i64),
}

/// Scripted stand-in for the remote service: returns configured responses
/// and records every call so tests can assert which network traffic an
/// operation did (or did not) produce.
#[derive(Clone, Default)]
pub struct ScriptedQuestionService {
    inner: Arc<Mutex<ScriptState>>,
}

#[derive(Default)]
struct ScriptState {
    snapshot: Option<ServiceResult<QuestionSnapshot>>,
    live_snapshot: Option<ServiceResult<QuestionSnapshot>>,
    top: Option<ServiceResult<Vec<Question>>>,
    create: Option<ServiceResult<Question>>,
    vote: Option<ServiceResult<()>>,
    sessions: Option<ServiceResult<Vec<Session>>>,
    running_sessions: Option<ServiceResult<Vec<RunningSession>>>,
    calls: Vec<RemoteCall>,
}

impl ScriptedQuestionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_snapshot(&self, snapshot: QuestionSnapshot) {
        self.lock().snapshot = Some(Ok(snapshot));
    }

    pub fn set_snapshot_error(&self, error: ServiceError) {
        self.lock().snapshot = Some(Err(error));
    }

    pub fn set_live_snapshot(&self, snapshot: QuestionSnapshot) {
        self.lock().live_snapshot = Some(Ok(snapshot));
    }

    pub fn set_top_questions(&self, questions: Vec<Question>) {
        self.lock().top = Some(Ok(questions));
    }

    pub fn set_create_result(&self, result: ServiceResult<Question>) {
        self.lock().create = Some(result);
    }

    pub fn set_vote_result(&self, result: ServiceResult<()>) {
        self.lock().vote = Some(result);
    }

    pub fn set_sessions(&self, sessions: Vec<Session>) {
        self.lock().sessions = Some(Ok(sessions));
    }

    pub fn set_running_sessions(&self, running: Vec<RunningSession>) {
        self.lock().running_sessions = Some(Ok(running));
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.inner.lock().expect("scripted service lock")
    }

    fn unscripted<T>(operation: &str) -> ServiceResult<T> {
        Err(ServiceError::Transport(format!("{operation} not scripted")))
    }
}

impl QuestionService for ScriptedQuestionService {
    fn questions(&self) -> BoxFuture<'_, ServiceResult<QuestionSnapshot>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut state = inner.lock().expect("scripted service lock");
            state.calls.push(RemoteCall::Questions);
            state
                .snapshot
                .clone()
                .unwrap_or_else(|| Ok(QuestionSnapshot::default()))
        })
    }

    fn live_questions(&self) -> BoxFuture<'_, ServiceResult<QuestionSnapshot>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut state = inner.lock().expect("scripted service lock");
            state.calls.push(RemoteCall::LiveQuestions);
            state
                .live_snapshot
                .clone()
                .unwrap_or_else(|| Ok(QuestionSnapshot::default()))
        })
    }

    fn top_questions(&self) -> BoxFuture<'_, ServiceResult<Vec<Question>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut state = inner.lock().expect("scripted service lock");
            state.calls.push(RemoteCall::TopQuestions);
            state.top.clone().unwrap_or_else(|| Ok(Vec::new()))
        })
    }

    fn create_question(&self, draft: &QuestionDraft) -> BoxFuture<'_, ServiceResult<Question>> {
        let inner = self.inner.clone();
        let draft = draft.clone();
        Box::pin(async move {
            let mut state = inner.lock().expect("scripted service lock");
            state.calls.push(RemoteCall::CreateQuestion(draft));
            state
                .create
                .clone()
                .unwrap_or_else(|| Self::unscripted("create_question"))
        })
    }

    fn cast_vote(
        &self,
        question_id: i64,
        ballot: &VoteBallot,
    ) -> BoxFuture<'_, ServiceResult<()>> {
        let inner = self.inner.clone();
        let ballot = ballot.clone();
        Box::pin(async move {
            let mut state = inner.lock().expect("scripted service lock");
            state.calls.push(RemoteCall::CastVote(question_id, ballot));
            state.vote.clone().unwrap_or(Ok(()))
        })
    }
}

impl SessionService for ScriptedQuestionService {
    fn sessions(&self) -> BoxFuture<'_, ServiceResult<Vec<Session>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut state = inner.lock().expect("scripted service lock");
            state.calls.push(RemoteCall::Sessions);
            state.sessions.clone().unwrap_or_else(|| Ok(Vec::new()))
        })
    }

    fn running_sessions(&self) -> BoxFuture<'_, ServiceResult<Vec<RunningSession>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut state = inner.lock().expect("scripted service lock");
            state.calls.push(RemoteCall::RunningSessions);
            state
                .running_sessions
                .clone()
                .unwrap_or_else(|| Ok(Vec::new()))
        })
    }

    fn toggle_questions(
        &self,
        session_id: i64,
        accepting: bool,
    ) -> BoxFuture<'_, ServiceResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut state = inner.lock().expect("scripted service lock");
            state.calls.push(RemoteCall::ToggleQuestions {
                session_id,
                accepting,
            });
            Ok(())
        })
    }

    fn refresh_running_session(&self, session_id: i64) -> BoxFuture<'_, ServiceResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut state = inner.lock().expect("scripted service lock");
            state.calls.push(RemoteCall::RefreshRunningSession(session_id));
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_deserializes_without_created_at() {
        let question: Question = serde_json::from_str(
            r#"{"id":7,"name":"Alice","phone_number":"9812345678","question_text":"Why?","vote_count":3}"#,
        )
        .unwrap();
        assert_eq!(question.id, 7);
        assert_eq!(question.created_at, None);
    }

    #[test]
    fn session_maps_misspelled_wire_field() {
        let session: Session = serde_json::from_str(
            r#"{"id":1,"title":"Opening keynote","is_acepting_questions":true}"#,
        )
        .unwrap();
        assert!(session.is_accepting_questions);

        let wire = serde_json::to_string(&session).unwrap();
        assert!(wire.contains("is_acepting_questions"));
    }

    #[test]
    fn ballot_serializes_user_id_as_camel_case_and_omits_when_absent() {
        let identity = Identity {
            name: "Alice".to_string(),
            phone_number: "9812345678".to_string(),
        };
        let wire = serde_json::to_string(&VoteBallot::for_identity(&identity)).unwrap();
        assert!(!wire.contains("userId"));

        let with_id = VoteBallot {
            user_id: Some(12),
            ..VoteBallot::for_identity(&identity)
        };
        let wire = serde_json::to_string(&with_id).unwrap();
        assert!(wire.contains(r#""userId":12"#));
    }

    #[test]
    fn draft_carries_zero_vote_count() {
        let identity = Identity {
            name: "Alice".to_string(),
            phone_number: "9812345678".to_string(),
        };
        let draft = QuestionDraft::new(&identity, "What about lunch?");
        assert_eq!(draft.vote_count, 0);
        assert_eq!(draft.name, "Alice");
    }
}
