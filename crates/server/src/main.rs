use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use shared::{
    domain::QuestionId,
    error::ApiException,
    protocol::{
        CreateQuestionResponse, ErrorBody, HealthResponse, OpinionCountResponse,
        QuestionResponse, SubmitOpinionResponse, SummaryResponse,
    },
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;
mod store;
mod summarizer;

use api::ApiContext;
use app_state::AppState;
use config::load_settings;
use store::QuestionStore;
use summarizer::{OpenAiSummarizer, Summarizer};

const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;
const PAGE_NOT_FOUND: &str = "Question not found.";

type ApiResult<T> = Result<T, (StatusCode, Json<ErrorBody>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let summarizer: Option<Arc<dyn Summarizer>> = match settings.openai_api_key.as_deref() {
        Some(api_key) => Some(Arc::new(OpenAiSummarizer::new(
            settings.openai_base_url.as_str(),
            api_key,
            settings.summary_model.as_str(),
        ))),
        None => {
            warn!("OPENAI_API_KEY is not set; summary requests will fail");
            None
        }
    };

    let state = AppState {
        api: ApiContext {
            store: Arc::new(QuestionStore::new()),
            summarizer,
        },
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.server_bind))?;
    info!(%addr, model = %settings.summary_model, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/question/:question_id", get(question_page))
        .route("/summary/:question_id", get(summary_page))
        .route("/api/create-question", post(http_create_question))
        .route("/api/question/:question_id", get(http_question))
        .route("/api/submit-opinion/:question_id", post(http_submit_opinion))
        .route("/api/opinion-count/:question_id", get(http_opinion_count))
        .route("/api/summarize/:question_id", get(http_summarize))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .with_state(state)
}

fn api_error(err: ApiException) -> (StatusCode, Json<ErrorBody>) {
    let status =
        StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorBody { error: err.message }))
}

fn question_id_param(raw: &str) -> ApiResult<QuestionId> {
    QuestionId::new(raw).ok_or_else(|| api_error(ApiException::not_found("Question not found")))
}

/// One string field of a JSON object body. Malformed bodies read as a missing field.
fn text_field(body: &[u8], field: &str) -> Option<String> {
    serde_json::from_slice::<Value>(body)
        .ok()?
        .get(field)?
        .as_str()
        .map(str::to_string)
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

async fn question_page(
    State(state): State<Arc<AppState>>,
    Path(question_id): Path<String>,
) -> Result<String, (StatusCode, &'static str)> {
    let not_found = (StatusCode::NOT_FOUND, PAGE_NOT_FOUND);
    let question_id = QuestionId::new(question_id).ok_or(not_found)?;
    state
        .api
        .store
        .question_text(&question_id)
        .await
        .ok_or(not_found)
}

async fn summary_page(
    State(state): State<Arc<AppState>>,
    Path(question_id): Path<String>,
) -> Result<String, (StatusCode, &'static str)> {
    let not_found = (StatusCode::NOT_FOUND, PAGE_NOT_FOUND);
    let question_id = QuestionId::new(question_id).ok_or(not_found)?;
    let question = state
        .api
        .store
        .question_text(&question_id)
        .await
        .ok_or(not_found)?;
    Ok(format!("Summary of: {question}"))
}

async fn http_create_question(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<CreateQuestionResponse>> {
    let question = text_field(&body, "question");
    let link = api::create_question(&state.api, question.as_deref())
        .await
        .map_err(api_error)?;
    Ok(Json(CreateQuestionResponse { link: Some(link) }))
}

async fn http_question(
    State(state): State<Arc<AppState>>,
    Path(question_id): Path<String>,
) -> ApiResult<Json<QuestionResponse>> {
    let question_id = question_id_param(&question_id)?;
    let question = api::question_text(&state.api, &question_id)
        .await
        .map_err(api_error)?;
    Ok(Json(QuestionResponse {
        question: Some(question),
    }))
}

async fn http_submit_opinion(
    State(state): State<Arc<AppState>>,
    Path(question_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<SubmitOpinionResponse>> {
    let question_id = question_id_param(&question_id)?;
    let opinion = text_field(&body, "opinion");
    api::submit_opinion(&state.api, &question_id, opinion.as_deref())
        .await
        .map_err(api_error)?;
    Ok(Json(SubmitOpinionResponse { success: true }))
}

async fn http_opinion_count(
    State(state): State<Arc<AppState>>,
    Path(question_id): Path<String>,
) -> ApiResult<Json<OpinionCountResponse>> {
    let question_id = question_id_param(&question_id)?;
    let count = api::opinion_count(&state.api, &question_id)
        .await
        .map_err(api_error)?;
    Ok(Json(OpinionCountResponse {
        count: count as u64,
    }))
}

async fn http_summarize(
    State(state): State<Arc<AppState>>,
    Path(question_id): Path<String>,
) -> ApiResult<Json<SummaryResponse>> {
    let question_id = question_id_param(&question_id)?;
    let summary = api::summarize(&state.api, &question_id)
        .await
        .map_err(api_error)?;
    Ok(Json(SummaryResponse {
        summary: Some(summary),
        error: None,
    }))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
