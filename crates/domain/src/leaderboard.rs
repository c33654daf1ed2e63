use std::sync::Arc;

use crate::DomainResult;
use crate::ports::questions::QuestionService;
use crate::questions::Question;

#[derive(Clone)]
pub struct Leaderboard {
    service: Arc<dyn QuestionService>,
}

impl Leaderboard {
    pub fn new(service: Arc<dyn QuestionService>) -> Self {
        Self { service }
    }

    /// Top-voted questions, highest count first. The endpoint is expected
    /// pre-sorted; the contract only promises sortable, so the order is
    /// enforced here. Ties keep the server's order.
    pub async fn top(&self) -> DomainResult<Vec<Question>> {
        let mut questions = self.service.top_questions().await?;
        questions.sort_by(|a, b| b.vote_count.cmp(&a.vote_count));
        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::ScriptedQuestionService;

    fn question(id: i64, vote_count: u32) -> Question {
        Question {
            id,
            name: "Bob".to_string(),
            phone_number: "9800000000".to_string(),
            question_text: format!("question {id}"),
            vote_count,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn orders_by_vote_count_descending_keeping_ties_stable() {
        let service = Arc::new(ScriptedQuestionService::new());
        service.set_top_questions(vec![
            question(1, 2),
            question(2, 9),
            question(3, 2),
            question(4, 5),
        ]);

        let top = Leaderboard::new(service).top().await.unwrap();
        let ids: Vec<i64> = top.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);
    }
}
