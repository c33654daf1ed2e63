use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::DomainResult;
use crate::identity::Identity;
use crate::ports::identity::IdentityStore;
use crate::ports::notify::{Notice, Notifier};
use crate::ports::questions::QuestionService;
use crate::questions::{Question, QuestionSnapshot};

pub const DEFAULT_HIGHLIGHT_WINDOW: Duration = Duration::from_secs(5);

/// Which server list a synchronizer follows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FeedScope {
    #[default]
    AllQuestions,
    RunningSession,
}

/// Display-ordered partition of one snapshot: votable entries first,
/// already-voted entries after them, own questions held apart.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeedView {
    pub session_title: Option<String>,
    pub mine: Vec<Question>,
    pub unvoted: Vec<Question>,
    pub voted: Vec<Question>,
}

impl FeedView {
    /// The main feed, in display order.
    pub fn others(&self) -> impl Iterator<Item = &Question> {
        self.unvoted.iter().chain(self.voted.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.mine.is_empty() && self.unvoted.is_empty() && self.voted.is_empty()
    }

    /// Case-insensitive substring filter over question text, applied to the
    /// votable partitions only.
    pub fn filtered(&self, term: &str) -> FeedView {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return self.clone();
        }
        let keep =
            |question: &&Question| question.question_text.to_lowercase().contains(&term);
        FeedView {
            session_title: self.session_title.clone(),
            mine: self.mine.clone(),
            unvoted: self.unvoted.iter().filter(keep).cloned().collect(),
            voted: self.voted.iter().filter(keep).cloned().collect(),
        }
    }
}

/// Splits a snapshot by authorship first, then by local vote state. Relative
/// order within each partition is the server's. A question authored by the
/// current identity never lands in a votable partition.
pub fn partition(
    questions: &[Question],
    identity: Option<&Identity>,
    voted_ids: &HashSet<i64>,
) -> FeedView {
    let mut view = FeedView::default();
    for question in questions {
        if identity.is_some_and(|who| question.name == who.name) {
            view.mine.push(question.clone());
        } else if voted_ids.contains(&question.id) {
            view.voted.push(question.clone());
        } else {
            view.unvoted.push(question.clone());
        }
    }
    view
}

/// Ids whose vote count differs between two consecutive snapshots. A
/// question appearing for the first time is not a count change.
pub fn changed_vote_counts(previous: &[Question], current: &[Question]) -> Vec<i64> {
    let before: HashMap<i64, u32> = previous
        .iter()
        .map(|question| (question.id, question.vote_count))
        .collect();
    current
        .iter()
        .filter(|question| {
            before
                .get(&question.id)
                .is_some_and(|&count| count != question.vote_count)
        })
        .map(|question| question.id)
        .collect()
}

/// Recently-changed marks with a fixed display window. The clock is passed
/// in so expiry is testable.
#[derive(Clone, Debug)]
pub struct HighlightSet {
    window: Duration,
    marks: HashMap<i64, Instant>,
}

impl HighlightSet {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            marks: HashMap::new(),
        }
    }

    pub fn mark(&mut self, question_id: i64, now: Instant) {
        self.marks.insert(question_id, now);
    }

    pub fn prune(&mut self, now: Instant) {
        let window = self.window;
        self.marks
            .retain(|_, marked| now.duration_since(*marked) < window);
    }

    pub fn contains(&self, question_id: i64, now: Instant) -> bool {
        self.marks
            .get(&question_id)
            .is_some_and(|marked| now.duration_since(*marked) < self.window)
    }

    pub fn active(&self, now: Instant) -> HashSet<i64> {
        self.marks
            .iter()
            .filter(|(_, marked)| now.duration_since(**marked) < self.window)
            .map(|(id, _)| *id)
            .collect()
    }
}

/// Keeps an eventually consistent local copy of the server's question list.
/// Every poll replaces the whole working copy; the server is authoritative
/// for existence and counts, local state only decides ordering and marks.
pub struct FeedSynchronizer {
    service: Arc<dyn QuestionService>,
    store: Arc<dyn IdentityStore>,
    notifier: Arc<dyn Notifier>,
    scope: FeedScope,
    state: Mutex<FeedState>,
}

#[derive(Debug)]
struct FeedState {
    questions: Vec<Question>,
    session_title: Option<String>,
    highlights: HighlightSet,
}

impl FeedSynchronizer {
    pub fn new(
        service: Arc<dyn QuestionService>,
        store: Arc<dyn IdentityStore>,
        notifier: Arc<dyn Notifier>,
        scope: FeedScope,
        highlight_window: Duration,
    ) -> Self {
        Self {
            service,
            store,
            notifier,
            scope,
            state: Mutex::new(FeedState {
                questions: Vec::new(),
                session_title: None,
                highlights: HighlightSet::new(highlight_window),
            }),
        }
    }

    /// One poll tick. On failure the previous snapshot is kept, the error is
    /// reported through the notifier and returned; the caller's loop keeps
    /// ticking.
    pub async fn poll(&self) -> DomainResult<FeedView> {
        let fetched = match self.scope {
            FeedScope::AllQuestions => self.service.questions().await,
            FeedScope::RunningSession => self.service.live_questions().await,
        };
        match fetched {
            Ok(snapshot) => Ok(self.replace(snapshot)),
            Err(err) => {
                self.notifier
                    .notify(Notice::warning(format!("failed to refresh questions: {err}")));
                Err(err.into())
            }
        }
    }

    fn replace(&self, snapshot: QuestionSnapshot) -> FeedView {
        let now = Instant::now();
        let mut state = self.state.lock().expect("feed state lock");
        for id in changed_vote_counts(&state.questions, &snapshot.questions) {
            state.highlights.mark(id, now);
        }
        state.highlights.prune(now);
        state.questions = snapshot.questions;
        state.session_title = snapshot.session_title;
        self.view_of(&state)
    }

    /// The current partitioned view, rebuilt from the working copy and the
    /// identity store on every call.
    pub fn view(&self) -> FeedView {
        let state = self.state.lock().expect("feed state lock");
        self.view_of(&state)
    }

    fn view_of(&self, state: &FeedState) -> FeedView {
        let identity = self.store.identity();
        let voted_ids = self.store.voted_ids();
        let mut view = partition(&state.questions, identity.as_ref(), &voted_ids);
        view.session_title = state.session_title.clone();
        view
    }

    pub fn question(&self, question_id: i64) -> Option<Question> {
        self.state
            .lock()
            .expect("feed state lock")
            .questions
            .iter()
            .find(|question| question.id == question_id)
            .cloned()
    }

    /// Ids still inside their highlight window.
    pub fn highlighted(&self) -> HashSet<i64> {
        self.state
            .lock()
            .expect("feed state lock")
            .highlights
            .active(Instant::now())
    }

    /// Applies a server-confirmed vote: the cached count moves by exactly
    /// one and the id is marked recently changed. The next poll reconciles
    /// the true count.
    pub fn apply_confirmed_vote(&self, question_id: i64) {
        let now = Instant::now();
        let mut state = self.state.lock().expect("feed state lock");
        if let Some(question) = state
            .questions
            .iter_mut()
            .find(|question| question.id == question_id)
        {
            question.vote_count += 1;
        }
        state.highlights.mark(question_id, now);
    }

    /// Prepends a freshly created record carrying its server-assigned id.
    pub fn insert_own(&self, question: Question) {
        let mut state = self.state.lock().expect("feed state lock");
        state.questions.insert(0, question);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::InMemoryIdentityStore;
    use crate::ports::notify::MemoryNotifier;
    use crate::ports::questions::ServiceError;
    use crate::questions::ScriptedQuestionService;

    fn question(id: i64, name: &str, vote_count: u32) -> Question {
        Question {
            id,
            name: name.to_string(),
            phone_number: "9800000000".to_string(),
            question_text: format!("question {id}"),
            vote_count,
            created_at: None,
        }
    }

    fn alice() -> Identity {
        Identity {
            name: "Alice".to_string(),
            phone_number: "9812345678".to_string(),
        }
    }

    #[test]
    fn partition_orders_unvoted_before_voted() {
        let questions = vec![
            question(1, "Bob", 0),
            question(2, "Bob", 0),
            question(3, "Carol", 0),
        ];
        let voted: HashSet<i64> = [2].into_iter().collect();

        let view = partition(&questions, Some(&alice()), &voted);
        let order: Vec<i64> = view.others().map(|q| q.id).collect();
        assert_eq!(order, vec![1, 3, 2]);
    }

    #[test]
    fn own_questions_never_reach_the_votable_partitions() {
        let questions = vec![
            question(1, "Alice", 4),
            question(2, "Bob", 1),
            question(3, "Alice", 0),
        ];
        let view = partition(&questions, Some(&alice()), &HashSet::new());

        let mine: Vec<i64> = view.mine.iter().map(|q| q.id).collect();
        assert_eq!(mine, vec![1, 3]);
        assert!(view.others().all(|q| q.name != "Alice"));
    }

    #[test]
    fn voted_ids_land_in_the_non_votable_partition() {
        let questions = vec![question(5, "Bob", 2)];
        let voted: HashSet<i64> = [5].into_iter().collect();

        let view = partition(&questions, Some(&alice()), &voted);
        assert!(view.unvoted.is_empty());
        assert_eq!(view.voted[0].id, 5);
    }

    #[test]
    fn partition_without_identity_treats_everything_as_others() {
        let questions = vec![question(1, "Alice", 0)];
        let view = partition(&questions, None, &HashSet::new());
        assert!(view.mine.is_empty());
        assert_eq!(view.unvoted.len(), 1);
    }

    #[test]
    fn diff_reports_changed_counts_only() {
        let previous = vec![question(1, "Bob", 3), question(2, "Bob", 1)];
        let current = vec![
            question(1, "Bob", 4),
            question(2, "Bob", 1),
            question(9, "Carol", 7),
        ];
        assert_eq!(changed_vote_counts(&previous, &current), vec![1]);
    }

    #[test]
    fn highlight_marks_lapse_after_the_window() {
        let mut highlights = HighlightSet::new(Duration::from_secs(5));
        let start = Instant::now();
        highlights.mark(7, start);

        assert!(highlights.contains(7, start + Duration::from_secs(4)));
        assert!(!highlights.contains(7, start + Duration::from_secs(5)));

        highlights.prune(start + Duration::from_secs(6));
        assert!(highlights.active(start + Duration::from_secs(6)).is_empty());
    }

    #[test]
    fn filter_matches_case_insensitively_and_spares_mine() {
        let view = FeedView {
            session_title: None,
            mine: vec![question(1, "Alice", 0)],
            unvoted: vec![
                Question {
                    question_text: "What about Lunch?".to_string(),
                    ..question(2, "Bob", 0)
                },
                question(3, "Bob", 0),
            ],
            voted: vec![],
        };

        let filtered = view.filtered("lunch");
        assert_eq!(filtered.unvoted.len(), 1);
        assert_eq!(filtered.unvoted[0].id, 2);
        assert_eq!(filtered.mine.len(), 1);
    }

    #[tokio::test]
    async fn poll_replaces_the_working_copy_wholesale() {
        let service = Arc::new(ScriptedQuestionService::new());
        let feed = FeedSynchronizer::new(
            service.clone(),
            Arc::new(InMemoryIdentityStore::signed_in("Alice", "9812345678")),
            Arc::new(MemoryNotifier::new()),
            FeedScope::AllQuestions,
            DEFAULT_HIGHLIGHT_WINDOW,
        );

        service.set_snapshot(QuestionSnapshot {
            questions: vec![question(1, "Bob", 0), question(2, "Bob", 0)],
            session_title: None,
        });
        feed.poll().await.unwrap();

        service.set_snapshot(QuestionSnapshot {
            questions: vec![question(2, "Bob", 0)],
            session_title: Some("Closing panel".to_string()),
        });
        let view = feed.poll().await.unwrap();

        let ids: Vec<i64> = view.others().map(|q| q.id).collect();
        assert_eq!(ids, vec![2]);
        assert_eq!(view.session_title.as_deref(), Some("Closing panel"));
    }

    #[tokio::test]
    async fn failed_poll_keeps_the_previous_view_and_notifies() {
        let service = Arc::new(ScriptedQuestionService::new());
        let notifier = Arc::new(MemoryNotifier::new());
        let feed = FeedSynchronizer::new(
            service.clone(),
            Arc::new(InMemoryIdentityStore::signed_in("Alice", "9812345678")),
            notifier.clone(),
            FeedScope::AllQuestions,
            DEFAULT_HIGHLIGHT_WINDOW,
        );

        service.set_snapshot(QuestionSnapshot {
            questions: vec![question(1, "Bob", 2)],
            session_title: None,
        });
        let before = feed.poll().await.unwrap();

        service.set_snapshot_error(ServiceError::Transport("connection refused".to_string()));
        assert!(feed.poll().await.is_err());

        assert_eq!(feed.view(), before);
        assert_eq!(notifier.notices().len(), 1);
    }

    #[tokio::test]
    async fn poll_marks_ids_whose_count_moved() {
        let service = Arc::new(ScriptedQuestionService::new());
        let feed = FeedSynchronizer::new(
            service.clone(),
            Arc::new(InMemoryIdentityStore::new()),
            Arc::new(MemoryNotifier::new()),
            FeedScope::AllQuestions,
            DEFAULT_HIGHLIGHT_WINDOW,
        );

        service.set_snapshot(QuestionSnapshot {
            questions: vec![question(1, "Bob", 3)],
            session_title: None,
        });
        feed.poll().await.unwrap();

        service.set_snapshot(QuestionSnapshot {
            questions: vec![question(1, "Bob", 4)],
            session_title: None,
        });
        feed.poll().await.unwrap();

        assert!(feed.highlighted().contains(&1));
    }

    #[tokio::test]
    async fn running_session_scope_uses_the_live_endpoint() {
        let service = Arc::new(ScriptedQuestionService::new());
        let feed = FeedSynchronizer::new(
            service.clone(),
            Arc::new(InMemoryIdentityStore::new()),
            Arc::new(MemoryNotifier::new()),
            FeedScope::RunningSession,
            DEFAULT_HIGHLIGHT_WINDOW,
        );

        service.set_live_snapshot(QuestionSnapshot {
            questions: vec![question(1, "Bob", 0)],
            session_title: Some("Opening keynote".to_string()),
        });
        let view = feed.poll().await.unwrap();
        assert_eq!(view.session_title.as_deref(), Some("Opening keynote"));

        use crate::questions::RemoteCall;
        assert_eq!(service.calls(), vec![RemoteCall::LiveQuestions]);
    }
}
