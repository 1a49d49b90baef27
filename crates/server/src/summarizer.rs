use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_PROMPT_OPINION_CHARS: usize = 2000;
const SYSTEM_PROMPT: &str = "You help groups find signal in feedback.";
const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 400;

#[derive(Debug, Error)]
pub enum SummarizerError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("completion endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("completion had no content")]
    EmptyCompletion,
}

/// Turns a question and its opinions into summary text.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, question: &str, opinions: &[String])
        -> Result<String, SummarizerError>;
}

pub fn build_prompt(question: &str, opinions: &[String]) -> String {
    let opinion_lines = opinions
        .iter()
        .map(|opinion| {
            let clipped: String = opinion.chars().take(MAX_PROMPT_OPINION_CHARS).collect();
            format!("- {clipped}")
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an AI assistant tasked with providing a concise and honest summary of a set of \
anonymous opinions with a bit of (british) humour. Also provide a general sentiment (positive, \
negative, mixed) towards the topic asked (this should come first).\n\n\
Question:\n{question}\n\n\
Opinions:\n{opinion_lines}\n"
    )
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible `chat/completions` client.
pub struct OpenAiSummarizer {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiSummarizer {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(
        &self,
        question: &str,
        opinions: &[String],
    ) -> Result<String, SummarizerError> {
        let prompt = build_prompt(question, opinions);
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let res = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(SummarizerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = res.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(SummarizerError::EmptyCompletion)
    }
}

#[cfg(test)]
#[path = "tests/summarizer_tests.rs"]
mod tests;
