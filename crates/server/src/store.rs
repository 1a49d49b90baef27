//! In-memory question store. Everything is lost when the process exits.

use std::collections::HashMap;

use shared::domain::QuestionId;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct StoredQuestion {
    pub question: String,
    pub opinions: Vec<String>,
}

#[derive(Default)]
struct StoreInner {
    issued: u64,
    questions: HashMap<QuestionId, StoredQuestion>,
}

#[derive(Default)]
pub struct QuestionStore {
    inner: RwLock<StoreInner>,
}

impl QuestionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a question under the next id (`q1`, `q2`, ...).
    pub async fn create_question(&self, question: &str) -> QuestionId {
        let mut guard = self.inner.write().await;
        guard.issued += 1;
        let question_id = QuestionId::sequential(guard.issued);
        guard.questions.insert(
            question_id.clone(),
            StoredQuestion {
                question: question.to_string(),
                opinions: Vec::new(),
            },
        );
        question_id
    }

    pub async fn contains(&self, question_id: &QuestionId) -> bool {
        self.inner.read().await.questions.contains_key(question_id)
    }

    pub async fn question_text(&self, question_id: &QuestionId) -> Option<String> {
        let guard = self.inner.read().await;
        guard
            .questions
            .get(question_id)
            .map(|stored| stored.question.clone())
    }

    /// Appends an opinion; returns the new count, or `None` for an unknown question.
    pub async fn add_opinion(&self, question_id: &QuestionId, opinion: String) -> Option<usize> {
        let mut guard = self.inner.write().await;
        let stored = guard.questions.get_mut(question_id)?;
        stored.opinions.push(opinion);
        Some(stored.opinions.len())
    }

    pub async fn opinion_count(&self, question_id: &QuestionId) -> Option<usize> {
        let guard = self.inner.read().await;
        guard
            .questions
            .get(question_id)
            .map(|stored| stored.opinions.len())
    }

    pub async fn snapshot(&self, question_id: &QuestionId) -> Option<StoredQuestion> {
        self.inner.read().await.questions.get(question_id).cloned()
    }
}
