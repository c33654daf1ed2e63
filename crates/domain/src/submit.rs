use std::sync::Arc;

use crate::DomainResult;
use crate::error::DomainError;
use crate::feed::FeedSynchronizer;
use crate::ports::identity::IdentityStore;
use crate::ports::questions::QuestionService;
use crate::questions::{Question, QuestionDraft};

#[derive(Clone)]
pub struct QuestionSubmission {
    service: Arc<dyn QuestionService>,
    store: Arc<dyn IdentityStore>,
    feed: Arc<FeedSynchronizer>,
}

impl QuestionSubmission {
    pub fn new(
        service: Arc<dyn QuestionService>,
        store: Arc<dyn IdentityStore>,
        feed: Arc<FeedSynchronizer>,
    ) -> Self {
        Self {
            service,
            store,
            feed,
        }
    }

    /// Empty or whitespace-only text is rejected locally, before any
    /// network call. The created record comes back with its server-assigned
    /// id and is prepended into the working copy.
    pub async fn submit(&self, text: &str) -> DomainResult<Question> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::Validation(
                "question text is required".to_string(),
            ));
        }
        let identity = self.store.identity().ok_or(DomainError::NotSignedIn)?;

        let draft = QuestionDraft::new(&identity, text);
        let created = self.service.create_question(&draft).await?;
        self.feed.insert_own(created.clone());
        Ok(created)
    }
}
