use std::time::Duration;

use podium_domain::ports::BoxFuture;
use podium_domain::ports::questions::{QuestionService, ServiceError, ServiceResult};
use podium_domain::ports::sessions::SessionService;
use podium_domain::questions::{
    Question, QuestionDraft, QuestionSnapshot, RunningSession, Session, VoteBallot,
};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::sleep;

/// HTTP adapter for the remote question service. GETs retry transient
/// failures with capped exponential backoff; mutations are issued exactly
/// once, a blind retry could double-apply server-side.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    retry_max_attempts: u32,
    retry_backoff_base: Duration,
    retry_backoff_max: Duration,
}

impl ApiClient {
    pub fn from_config(config: &crate::config::AppConfig) -> Self {
        let timeout = Duration::from_millis(config.api_timeout_ms.max(1));
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            retry_max_attempts: config.api_retry_max_attempts.max(1),
            retry_backoff_base: Duration::from_millis(config.api_retry_backoff_base_ms),
            retry_backoff_max: Duration::from_millis(config.api_retry_backoff_max_ms),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ServiceResult<T> {
        let url = endpoint_url(&self.base_url, path);
        let attempts = self.retry_max_attempts;

        for attempt in 0..attempts {
            let response = match self
                .http
                .get(&url)
                .header("accept", "application/json")
                .send()
                .await
            {
                Ok(response) => response,
                Err(err) => {
                    if attempt + 1 < attempts {
                        sleep(backoff_for_attempt(
                            self.retry_backoff_base,
                            self.retry_backoff_max,
                            attempt,
                        ))
                        .await;
                        continue;
                    }
                    return Err(ServiceError::Transport(err.to_string()));
                }
            };

            let status = response.status();
            if status.is_success() {
                return response
                    .json::<T>()
                    .await
                    .map_err(|err| ServiceError::InvalidResponse(err.to_string()));
            }

            let retryable = status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS;
            if retryable && attempt + 1 < attempts {
                sleep(backoff_for_attempt(
                    self.retry_backoff_base,
                    self.retry_backoff_max,
                    attempt,
                ))
                .await;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(rejection(status, &body));
        }

        Err(ServiceError::Transport(
            "retry loop exited unexpectedly".to_string(),
        ))
    }

    async fn send_mutation<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ServiceResult<reqwest::Response> {
        let url = endpoint_url(&self.base_url, path);
        let mut request = self
            .http
            .request(method, &url)
            .header("accept", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|err| ServiceError::Transport(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(rejection(status, &body))
    }

    async fn fetch_questions(&self) -> ServiceResult<QuestionSnapshot> {
        let payload: QuestionsPayload = self.get_json("questions/").await?;
        Ok(payload.into_snapshot())
    }

    async fn fetch_live_questions(&self) -> ServiceResult<QuestionSnapshot> {
        let payload: QuestionsEnvelope = self.get_json("running-session/questions/").await?;
        Ok(QuestionSnapshot {
            questions: payload.results,
            session_title: payload.session_title,
        })
    }

    async fn fetch_top_questions(&self) -> ServiceResult<Vec<Question>> {
        let payload: ResultsEnvelope<Question> = self.get_json("top-questions/").await?;
        Ok(payload.results)
    }

    async fn post_question(&self, draft: &QuestionDraft) -> ServiceResult<Question> {
        let response = self
            .send_mutation(Method::POST, "questions/", Some(draft))
            .await?;
        response
            .json::<Question>()
            .await
            .map_err(|err| ServiceError::InvalidResponse(err.to_string()))
    }

    async fn post_vote(&self, question_id: i64, ballot: &VoteBallot) -> ServiceResult<()> {
        self.send_mutation(
            Method::POST,
            &format!("questions/{question_id}/vote/"),
            Some(ballot),
        )
        .await?;
        Ok(())
    }

    async fn fetch_sessions(&self) -> ServiceResult<Vec<Session>> {
        let payload: ResultsEnvelope<Session> = self.get_json("sessions/").await?;
        Ok(payload.results)
    }

    async fn fetch_running_sessions(&self) -> ServiceResult<Vec<RunningSession>> {
        let payload: ResultsEnvelope<RunningSession> = self.get_json("running-sessions/").await?;
        Ok(payload.results)
    }

    async fn patch_toggle_questions(&self, session_id: i64, accepting: bool) -> ServiceResult<()> {
        let payload = TogglePayload {
            session_id,
            is_active: accepting,
        };
        self.send_mutation(
            Method::PATCH,
            "running-session/toggle-questions/",
            Some(&payload),
        )
        .await?;
        Ok(())
    }

    async fn patch_running_session(&self, session_id: i64) -> ServiceResult<()> {
        self.send_mutation::<()>(Method::PATCH, &format!("running-session/{session_id}/"), None)
            .await?;
        Ok(())
    }
}

impl QuestionService for ApiClient {
    fn questions(&self) -> BoxFuture<'_, ServiceResult<QuestionSnapshot>> {
        Box::pin(self.fetch_questions())
    }

    fn live_questions(&self) -> BoxFuture<'_, ServiceResult<QuestionSnapshot>> {
        Box::pin(self.fetch_live_questions())
    }

    fn top_questions(&self) -> BoxFuture<'_, ServiceResult<Vec<Question>>> {
        Box::pin(self.fetch_top_questions())
    }

    fn create_question(&self, draft: &QuestionDraft) -> BoxFuture<'_, ServiceResult<Question>> {
        let draft = draft.clone();
        Box::pin(async move { self.post_question(&draft).await })
    }

    fn cast_vote(
        &self,
        question_id: i64,
        ballot: &VoteBallot,
    ) -> BoxFuture<'_, ServiceResult<()>> {
        let ballot = ballot.clone();
        Box::pin(async move { self.post_vote(question_id, &ballot).await })
    }
}

impl SessionService for ApiClient {
    fn sessions(&self) -> BoxFuture<'_, ServiceResult<Vec<Session>>> {
        Box::pin(self.fetch_sessions())
    }

    fn running_sessions(&self) -> BoxFuture<'_, ServiceResult<Vec<RunningSession>>> {
        Box::pin(self.fetch_running_sessions())
    }

    fn toggle_questions(
        &self,
        session_id: i64,
        accepting: bool,
    ) -> BoxFuture<'_, ServiceResult<()>> {
        Box::pin(self.patch_toggle_questions(session_id, accepting))
    }

    fn refresh_running_session(&self, session_id: i64) -> BoxFuture<'_, ServiceResult<()>> {
        Box::pin(self.patch_running_session(session_id))
    }
}

/// `GET questions/` answers either a bare array or a results envelope;
/// both shapes are live upstream. Anything else fails closed.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuestionsPayload {
    Bare(Vec<Question>),
    Envelope(QuestionsEnvelope),
}

impl QuestionsPayload {
    fn into_snapshot(self) -> QuestionSnapshot {
        match self {
            QuestionsPayload::Bare(questions) => QuestionSnapshot {
                questions,
                session_title: None,
            },
            QuestionsPayload::Envelope(envelope) => QuestionSnapshot {
                questions: envelope.results,
                session_title: envelope.session_title,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct QuestionsEnvelope {
    results: Vec<Question>,
    #[serde(default)]
    session_title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResultsEnvelope<T> {
    results: Vec<T>,
}

#[derive(Debug, Serialize)]
struct TogglePayload {
    session_id: i64,
    is_active: bool,
}

/// Error bodies carry `error` on the question endpoints and `message` on the
/// admin ones; either is surfaced verbatim, anything unparsable falls back
/// to a generic message.
fn rejection(status: StatusCode, body: &str) -> ServiceError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.error.or(body.message))
        .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
    ServiceError::Rejected {
        status: status.as_u16(),
        message,
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn backoff_for_attempt(base: Duration, max: Duration, attempt: u32) -> Duration {
    if base.is_zero() {
        return Duration::from_millis(1);
    }
    let multiplier = 1u64 << attempt.min(8);
    let base_ms = base.as_millis() as u64;
    let max_ms = max.as_millis() as u64;
    let delay_ms = base_ms.saturating_mul(multiplier).max(1);
    if max_ms == 0 {
        Duration::from_millis(delay_ms)
    } else {
        Duration::from_millis(delay_ms.min(max_ms))
    }
}
