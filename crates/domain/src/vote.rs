use std::sync::Arc;

use crate::DomainResult;
use crate::error::DomainError;
use crate::feed::FeedSynchronizer;
use crate::ports::identity::IdentityStore;
use crate::ports::questions::QuestionService;
use crate::questions::VoteBallot;

/// Validates a vote against local state before any network call and applies
/// local bookkeeping only after the server confirms.
#[derive(Clone)]
pub struct VoteCoordinator {
    service: Arc<dyn QuestionService>,
    store: Arc<dyn IdentityStore>,
    feed: Arc<FeedSynchronizer>,
}

impl VoteCoordinator {
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

    /// Preconditions are checked in order and short-circuit without network
    /// traffic: already voted, then own question. An id unknown to the
    /// current snapshot skips the authorship check; the server stays the
    /// authority. Dedup here is advisory only; the same identity in fresh
    /// local state bypasses it.
    pub async fn vote(&self, question_id: i64) -> DomainResult<()> {
        let identity = self.store.identity().ok_or(DomainError::NotSignedIn)?;

        if self.store.voted_ids().contains(&question_id) {
            return Err(DomainError::AlreadyVoted);
        }
        if self
            .feed
            .question(question_id)
            .is_some_and(|question| question.name == identity.name)
        {
            return Err(DomainError::OwnQuestion);
        }

        let ballot = VoteBallot::for_identity(&identity);
        self.service.cast_vote(question_id, &ballot).await?;

        // Confirmed: bump by exactly one, persist the id, mark the entry.
        self.store.add_voted_id(question_id)?;
        self.feed.apply_confirmed_vote(question_id);
        Ok(())
    }
}
