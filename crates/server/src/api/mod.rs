use std::sync::Arc;

use shared::{
    domain::QuestionId,
    error::{ApiException, ErrorCode},
    protocol::question_page_path,
};
use tracing::{info, warn};

use crate::{store::QuestionStore, summarizer::Summarizer};

pub const MAX_OPINION_CHARS: usize = 4000;
pub const MIN_OPINIONS_FOR_SUMMARY: usize = 2;
pub const NOT_ENOUGH_OPINIONS: &str = "Not enough opinions to generate a summary.";

#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<QuestionStore>,
    /// `None` when no API key is configured.
    pub summarizer: Option<Arc<dyn Summarizer>>,
}

fn question_not_found() -> ApiException {
    ApiException::not_found("Question not found")
}

/// Creates a question and returns the respondent link (`/question/{id}`).
pub async fn create_question(
    ctx: &ApiContext,
    question: Option<&str>,
) -> Result<String, ApiException> {
    let question = question.map(str::trim).unwrap_or_default();
    if question.is_empty() {
        return Err(ApiException::validation("Question is required"));
    }
    let question_id = ctx.store.create_question(question).await;
    info!(%question_id, "question created");
    Ok(question_page_path(question_id.as_str()))
}

pub async fn question_text(
    ctx: &ApiContext,
    question_id: &QuestionId,
) -> Result<String, ApiException> {
    ctx.store
        .question_text(question_id)
        .await
        .ok_or_else(question_not_found)
}

pub async fn submit_opinion(
    ctx: &ApiContext,
    question_id: &QuestionId,
    opinion: Option<&str>,
) -> Result<(), ApiException> {
    if !ctx.store.contains(question_id).await {
        return Err(question_not_found());
    }
    let opinion = opinion.map(str::trim).unwrap_or_default();
    if opinion.is_empty() {
        return Err(ApiException::validation("Opinion is required"));
    }
    let opinion: String = opinion.chars().take(MAX_OPINION_CHARS).collect();
    let count = ctx
        .store
        .add_opinion(question_id, opinion)
        .await
        .ok_or_else(question_not_found)?;
    info!(%question_id, count, "opinion recorded");
    Ok(())
}

pub async fn opinion_count(
    ctx: &ApiContext,
    question_id: &QuestionId,
) -> Result<usize, ApiException> {
    ctx.store
        .opinion_count(question_id)
        .await
        .ok_or_else(question_not_found)
}

pub async fn summarize(
    ctx: &ApiContext,
    question_id: &QuestionId,
) -> Result<String, ApiException> {
    let stored = ctx
        .store
        .snapshot(question_id)
        .await
        .ok_or_else(question_not_found)?;
    let Some(summarizer) = ctx.summarizer.as_ref() else {
        return Err(ApiException::new(
            ErrorCode::Unavailable,
            "Missing OPENAI_API_KEY on server",
        ));
    };
    if stored.opinions.len() < MIN_OPINIONS_FOR_SUMMARY {
        return Ok(NOT_ENOUGH_OPINIONS.to_string());
    }

    summarizer
        .summarize(&stored.question, &stored.opinions)
        .await
        .map_err(|err| {
            warn!(%question_id, %err, "summarization failed");
            ApiException::new(ErrorCode::Upstream, format!("Summarization failed: {err}"))
        })
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
