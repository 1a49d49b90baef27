use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::{
    domain::QuestionId,
    protocol::{
        create_question_route, opinion_count_route, question_route, submit_opinion_route,
        summarize_route, CreateQuestionRequest, QuestionResponse, SubmitOpinionRequest,
    },
};
use tracing::debug;

pub mod creation;
pub mod error;
pub mod page;
pub mod poller;
pub mod submission;
pub mod summary;

pub use creation::{CreateOutcome, CreatedQuestion, QuestionCreationController};
pub use error::{GatewayError, PageAddressError, ValidationError};
pub use page::{origin_of, PageAddress};
pub use poller::{CounterDisplay, LiveCounterPoller, DEFAULT_POLL_INTERVAL, MAX_PENDING_POLLS};
pub use submission::{OpinionSubmissionController, QuestionText, SubmitOutcome};
pub use summary::{classify_summary_response, SummaryController, SummaryOutcome};

pub const NETWORK_ERROR_CREATING_QUESTION: &str = "Network error creating question.";
pub const NETWORK_ERROR_SUBMITTING_OPINION: &str = "Network error submitting opinion.";
pub const NETWORK_ERROR_GENERATING_SUMMARY: &str = "Network error generating summary.";

/// Status and raw body of a backend reply, before any interpretation.
///
/// `body` is `None` when the body could not be read at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: Option<String>,
}

impl GatewayResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: Some(body.into()),
        }
    }

    pub fn unreadable(status: u16) -> Self {
        Self { status, body: None }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses the body as `T`; `None` if missing or malformed.
    pub fn json<T: DeserializeOwned>(&self) -> Option<T> {
        self.body
            .as_deref()
            .and_then(|body| serde_json::from_str(body).ok())
    }
}

/// The backend HTTP surface the pages call.
///
/// Implementations report every reply that arrived, whatever its status; only a
/// missing reply is an error.
#[async_trait]
pub trait BackendGateway: Send + Sync {
    async fn create_question(&self, question: &str) -> Result<GatewayResponse, GatewayError>;
    async fn question(&self, question_id: &QuestionId) -> Result<GatewayResponse, GatewayError>;
    async fn submit_opinion(
        &self,
        question_id: &QuestionId,
        opinion: &str,
    ) -> Result<GatewayResponse, GatewayError>;
    async fn opinion_count(
        &self,
        question_id: &QuestionId,
    ) -> Result<GatewayResponse, GatewayError>;
    async fn summarize(&self, question_id: &QuestionId) -> Result<GatewayResponse, GatewayError>;
}

pub struct HttpGateway {
    http: Client,
    server_url: String,
}

impl HttpGateway {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: impl Into<String>) -> Self {
        let server_url: String = server_url.into();
        Self {
            http,
            server_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    async fn read(res: reqwest::Response) -> GatewayResponse {
        let status = res.status().as_u16();
        let body = res.text().await.ok();
        GatewayResponse { status, body }
    }
}

#[async_trait]
impl BackendGateway for HttpGateway {
    async fn create_question(&self, question: &str) -> Result<GatewayResponse, GatewayError> {
        debug!("gateway: POST {}", create_question_route());
        let res = self
            .http
            .post(format!("{}{}", self.server_url, create_question_route()))
            .json(&CreateQuestionRequest {
                question: question.to_string(),
            })
            .send()
            .await?;
        Ok(Self::read(res).await)
    }

    async fn question(&self, question_id: &QuestionId) -> Result<GatewayResponse, GatewayError> {
        let route = question_route(question_id.as_str());
        debug!("gateway: GET {route}");
        let res = self
            .http
            .get(format!("{}{route}", self.server_url))
            .send()
            .await?;
        Ok(Self::read(res).await)
    }

    async fn submit_opinion(
        &self,
        question_id: &QuestionId,
        opinion: &str,
    ) -> Result<GatewayResponse, GatewayError> {
        let route = submit_opinion_route(question_id.as_str());
        debug!("gateway: POST {route}");
        let res = self
            .http
            .post(format!("{}{route}", self.server_url))
            .json(&SubmitOpinionRequest {
                opinion: opinion.to_string(),
            })
            .send()
            .await?;
        Ok(Self::read(res).await)
    }

    async fn opinion_count(
        &self,
        question_id: &QuestionId,
    ) -> Result<GatewayResponse, GatewayError> {
        let route = opinion_count_route(question_id.as_str());
        let res = self
            .http
            .get(format!("{}{route}", self.server_url))
            .send()
            .await?;
        Ok(Self::read(res).await)
    }

    async fn summarize(&self, question_id: &QuestionId) -> Result<GatewayResponse, GatewayError> {
        let route = summarize_route(question_id.as_str());
        debug!("gateway: GET {route}");
        let res = self
            .http
            .get(format!("{}{route}", self.server_url))
            .send()
            .await?;
        Ok(Self::read(res).await)
    }
}

/// Question text for a page header. Any failure, including a reply without text, is `None`.
pub(crate) async fn fetch_question_text(
    gateway: &dyn BackendGateway,
    question_id: &QuestionId,
) -> Option<String> {
    let response = match gateway.question(question_id).await {
        Ok(response) => response,
        Err(err) => {
            debug!(%question_id, "question lookup failed: {err}");
            return None;
        }
    };
    if !response.is_success() {
        debug!(%question_id, status = response.status, "question lookup rejected");
        return None;
    }
    response
        .json::<QuestionResponse>()
        .and_then(|body| body.question)
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
