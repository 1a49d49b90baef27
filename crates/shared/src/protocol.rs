//! JSON documents exchanged between the pages and the backend.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQuestionRequest {
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQuestionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOpinionRequest {
    pub opinion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOpinionResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpinionCountResponse {
    pub count: u64,
}

/// Body of `/api/summarize/{id}`. Either field, both or neither may be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}

pub fn create_question_route() -> &'static str {
    "/api/create-question"
}

pub fn question_route(question_id: &str) -> String {
    format!("/api/question/{question_id}")
}

pub fn submit_opinion_route(question_id: &str) -> String {
    format!("/api/submit-opinion/{question_id}")
}

pub fn opinion_count_route(question_id: &str) -> String {
    format!("/api/opinion-count/{question_id}")
}

pub fn summarize_route(question_id: &str) -> String {
    format!("/api/summarize/{question_id}")
}

/// Respondent page for a question.
pub fn question_page_path(question_id: &str) -> String {
    format!("/question/{question_id}")
}

pub fn summary_page_path(question_id: &str) -> String {
    format!("/summary/{question_id}")
}
