//! "Create question" page: submit a question, reveal its share link, start the live counter.

use std::sync::Arc;

use shared::{
    domain::QuestionId,
    protocol::{summary_page_path, CreateQuestionResponse},
};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    error::{PageAddressError, ValidationError},
    origin_of,
    poller::{CounterDisplay, LiveCounterPoller},
    BackendGateway, NETWORK_ERROR_CREATING_QUESTION,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedQuestion {
    pub question_id: QuestionId,
    /// Absolute address respondents open.
    pub share_link: String,
    /// Absolute address of the summary page for the same question.
    pub summary_link: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Rejected(ValidationError),
    Created(CreatedQuestion),
    Failed(String),
    NetworkError,
}

impl CreateOutcome {
    /// Text shown to the creator for this outcome.
    pub fn message(&self) -> String {
        match self {
            CreateOutcome::Rejected(err) => err.to_string(),
            CreateOutcome::Created(created) => created.share_link.clone(),
            CreateOutcome::Failed(detail) => format!("Failed to create question: {detail}"),
            CreateOutcome::NetworkError => NETWORK_ERROR_CREATING_QUESTION.to_string(),
        }
    }
}

pub struct QuestionCreationController {
    gateway: Arc<dyn BackendGateway>,
    origin: String,
    poller: LiveCounterPoller,
    current: Option<CreatedQuestion>,
}

impl QuestionCreationController {
    /// `page_url` is the address the creation page was served from; share links use its origin.
    pub fn new(gateway: Arc<dyn BackendGateway>, page_url: &str) -> Result<Self, PageAddressError> {
        let poller = LiveCounterPoller::new(Arc::clone(&gateway));
        Self::with_poller(gateway, page_url, poller)
    }

    pub fn with_poller(
        gateway: Arc<dyn BackendGateway>,
        page_url: &str,
        poller: LiveCounterPoller,
    ) -> Result<Self, PageAddressError> {
        Ok(Self {
            gateway,
            origin: origin_of(page_url)?,
            poller,
            current: None,
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Most recently created question, if any.
    pub fn current(&self) -> Option<&CreatedQuestion> {
        self.current.as_ref()
    }

    pub fn poller(&self) -> &LiveCounterPoller {
        &self.poller
    }

    pub fn counter(&self) -> watch::Receiver<CounterDisplay> {
        self.poller.subscribe()
    }

    pub fn stop_counter(&mut self) {
        self.poller.stop();
    }

    /// Every call with valid text creates a new question, even when the text repeats.
    pub async fn create(&mut self, question: &str) -> CreateOutcome {
        let question = question.trim();
        if question.is_empty() {
            return CreateOutcome::Rejected(ValidationError::EmptyQuestion);
        }

        let response = match self.gateway.create_question(question).await {
            Ok(response) => response,
            Err(err) => {
                warn!("create question: {err}");
                return CreateOutcome::NetworkError;
            }
        };

        if !response.is_success() {
            return CreateOutcome::Failed(response.body.unwrap_or_default());
        }

        let Some(link) = response
            .json::<CreateQuestionResponse>()
            .and_then(|body| body.link)
        else {
            warn!(status = response.status, "create question: reply without link");
            return CreateOutcome::Failed("unexpected response from server".to_string());
        };
        let Some(question_id) = QuestionId::from_path(&link) else {
            warn!(%link, "create question: link has no question identifier");
            return CreateOutcome::Failed("unexpected response from server".to_string());
        };

        let created = CreatedQuestion {
            share_link: format!("{}{link}", self.origin),
            summary_link: format!(
                "{}{}",
                self.origin,
                summary_page_path(question_id.as_str())
            ),
            question_id: question_id.clone(),
        };
        info!(%question_id, share_link = %created.share_link, "question created");

        self.current = Some(created.clone());
        self.poller.start(question_id);
        CreateOutcome::Created(created)
    }
}

#[cfg(test)]
#[path = "tests/creation_tests.rs"]
mod tests;
