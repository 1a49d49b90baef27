//! Summary page: show the question and classify the generated summary.

use std::sync::Arc;

use serde_json::Value;
use shared::domain::QuestionId;
use tracing::{debug, warn};

use crate::{
    fetch_question_text, page::PageAddress, BackendGateway, GatewayResponse,
    NETWORK_ERROR_GENERATING_SUMMARY,
};

pub const GENERATING_PLACEHOLDER: &str = "Generating summary...";
pub const SUMMARY_FAILED_FALLBACK: &str = "Failed to generate summary.";
pub const NOT_ENOUGH_OPINIONS: &str = "Not enough opinions to generate a summary.";

/// Exactly one of these is shown in the summary box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// Non-success status; body text or the fallback message.
    StatusError(String),
    /// Success whose body carried `error` and no `summary`.
    ErrorField(String),
    Summary(String),
    InsufficientData,
    NetworkError,
}

impl SummaryOutcome {
    pub fn display_text(&self) -> String {
        match self {
            SummaryOutcome::StatusError(detail) | SummaryOutcome::ErrorField(detail) => {
                format!("Error: {detail}")
            }
            SummaryOutcome::Summary(text) => text.clone(),
            SummaryOutcome::InsufficientData => NOT_ENOUGH_OPINIONS.to_string(),
            SummaryOutcome::NetworkError => NETWORK_ERROR_GENERATING_SUMMARY.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            SummaryOutcome::StatusError(_)
                | SummaryOutcome::ErrorField(_)
                | SummaryOutcome::NetworkError
        )
    }
}

pub fn classify_summary_response(response: &GatewayResponse) -> SummaryOutcome {
    if !response.is_success() {
        let detail = response
            .body
            .as_deref()
            .filter(|body| !body.is_empty())
            .unwrap_or(SUMMARY_FAILED_FALLBACK);
        return SummaryOutcome::StatusError(detail.to_string());
    }

    // Each field is read on its own; a mistyped sibling does not hide the other.
    let body = response.json::<Value>().unwrap_or_default();
    match (text_field(&body, "summary"), text_field(&body, "error")) {
        (Some(summary), _) => SummaryOutcome::Summary(summary),
        (None, Some(error)) => SummaryOutcome::ErrorField(error),
        (None, None) => SummaryOutcome::InsufficientData,
    }
}

fn text_field(body: &Value, field: &str) -> Option<String> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub struct SummaryController {
    gateway: Arc<dyn BackendGateway>,
    question_id: QuestionId,
}

impl SummaryController {
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

    /// Page header. `None` leaves the header empty; the page stays usable.
    pub async fn load_question(&self) -> Option<String> {
        fetch_question_text(self.gateway.as_ref(), &self.question_id).await
    }

    pub fn pending_text(&self) -> &'static str {
        GENERATING_PLACEHOLDER
    }

    pub async fn generate(&self) -> SummaryOutcome {
        let response = match self.gateway.summarize(&self.question_id).await {
            Ok(response) => response,
            Err(err) => {
                warn!(question_id = %self.question_id, "summarize: {err}");
                return SummaryOutcome::NetworkError;
            }
        };
        let outcome = classify_summary_response(&response);
        debug!(
            question_id = %self.question_id,
            status = response.status,
            ?outcome,
            "summary classified"
        );
        outcome
    }
}

#[cfg(test)]
#[path = "tests/summary_tests.rs"]
mod tests;
