//! Respondent page: show the question, submit one opinion per click.

use std::sync::Arc;

use shared::domain::QuestionId;
use tracing::{debug, warn};

use crate::{
    error::ValidationError, fetch_question_text, page::PageAddress, BackendGateway,
    NETWORK_ERROR_SUBMITTING_OPINION,
};

pub const QUESTION_NOT_FOUND: &str = "Question not found.";
pub const OPINION_SUBMITTED: &str = "Opinion submitted successfully! Thank you.";
pub const OPINION_SUBMIT_FAILED: &str = "Failed to submit opinion. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionText {
    Loaded(String),
    NotFound,
}

impl QuestionText {
    pub fn display_text(&self) -> &str {
        match self {
            QuestionText::Loaded(text) => text,
            QuestionText::NotFound => QUESTION_NOT_FOUND,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Rejected(ValidationError),
    Submitted,
    Failed,
    NetworkError,
}

impl SubmitOutcome {
    pub fn message(&self) -> String {
        match self {
            SubmitOutcome::Rejected(err) => err.to_string(),
            SubmitOutcome::Submitted => OPINION_SUBMITTED.to_string(),
            SubmitOutcome::Failed => OPINION_SUBMIT_FAILED.to_string(),
            SubmitOutcome::NetworkError => NETWORK_ERROR_SUBMITTING_OPINION.to_string(),
        }
    }
}

pub struct OpinionSubmissionController {
    gateway: Arc<dyn BackendGateway>,
    question_id: QuestionId,
}

impl OpinionSubmissionController {
    pub fn new(gateway: Arc<dyn BackendGateway>, question_id: QuestionId) -> Self {
        Self {
            gateway,
            question_id,
        }
    }

    pub fn for_page(gateway: Arc<dyn BackendGateway>, page: &PageAddress) -> Self {
        Self::new(gateway, page.question_id().clone())
    }

    pub fn question_id(&self) -> &QuestionId {
        &self.question_id
    }

    pub async fn load_question(&self) -> QuestionText {
        match fetch_question_text(self.gateway.as_ref(), &self.question_id).await {
            Some(text) => QuestionText::Loaded(text),
            None => QuestionText::NotFound,
        }
    }

    /// Sends the trimmed draft once. The draft is cleared only when the backend accepts it.
    pub async fn submit(&self, draft: &mut String) -> SubmitOutcome {
        let opinion = draft.trim();
        if opinion.is_empty() {
            return SubmitOutcome::Rejected(ValidationError::EmptyOpinion);
        }

        let result = self.gateway.submit_opinion(&self.question_id, opinion).await;
        match result {
            Ok(response) if response.is_success() => {
                debug!(question_id = %self.question_id, "opinion submitted");
                draft.clear();
                SubmitOutcome::Submitted
            }
            Ok(response) => {
                warn!(
                    question_id = %self.question_id,
                    status = response.status,
                    "opinion rejected by backend"
                );
                SubmitOutcome::Failed
            }
            Err(err) => {
                warn!(question_id = %self.question_id, "submit opinion: {err}");
                SubmitOutcome::NetworkError
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/submission_tests.rs"]
mod tests;
