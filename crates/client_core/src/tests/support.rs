use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use shared::domain::QuestionId;

use crate::{BackendGateway, GatewayError, GatewayResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Operation {
    CreateQuestion,
    Question,
    SubmitOpinion,
    OpinionCount,
    Summarize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call {
    pub operation: Operation,
    pub question_id: Option<QuestionId>,
    pub text: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct Reply {
    delay: Duration,
    result: Result<GatewayResponse, GatewayError>,
}

impl Reply {
    pub fn status(status: u16, body: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(GatewayResponse::new(status, body)),
        }
    }

    pub fn ok(body: &str) -> Self {
        Self::status(200, body)
    }

    pub fn unreadable(status: u16) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(GatewayResponse::unreadable(status)),
        }
    }

    pub fn transport() -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(GatewayError::Transport("connection refused".into())),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// In-memory gateway answering from per-operation scripts.
///
/// Queued replies are used first; once a queue is empty the operation's fallback
/// answers, and without a fallback the reply is a 404.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    calls: Mutex<Vec<Call>>,
    queued: Mutex<HashMap<Operation, VecDeque<Reply>>>,
    fallback: Mutex<HashMap<Operation, Reply>>,
}

impl ScriptedGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn enqueue(&self, operation: Operation, reply: Reply) {
        self.queued
            .lock()
            .expect("queue lock")
            .entry(operation)
            .or_default()
            .push_back(reply);
    }

    pub fn set_fallback(&self, operation: Operation, reply: Reply) {
        self.fallback
            .lock()
            .expect("fallback lock")
            .insert(operation, reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn calls_for(&self, operation: Operation) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.operation == operation)
            .collect()
    }

    pub fn count_calls(&self, operation: Operation, question_id: &str) -> usize {
        self.calls_for(operation)
            .iter()
            .filter(|call| {
                call.question_id
                    .as_ref()
                    .is_some_and(|id| id.as_str() == question_id)
            })
            .count()
    }

    async fn respond(&self, call: Call) -> Result<GatewayResponse, GatewayError> {
        let operation = call.operation;
        self.calls.lock().expect("calls lock").push(call);

        let queued = self
            .queued
            .lock()
            .expect("queue lock")
            .get_mut(&operation)
            .and_then(VecDeque::pop_front);
        let reply = queued
            .or_else(|| {
                self.fallback
                    .lock()
                    .expect("fallback lock")
                    .get(&operation)
                    .cloned()
            })
            .unwrap_or_else(|| Reply::status(404, r#"{"error":"Question not found"}"#));

        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.result
    }
}

#[async_trait]
impl BackendGateway for ScriptedGateway {
    async fn create_question(&self, question: &str) -> Result<GatewayResponse, GatewayError> {
        self.respond(Call {
            operation: Operation::CreateQuestion,
            question_id: None,
            text: Some(question.to_string()),
        })
        .await
    }

    async fn question(&self, question_id: &QuestionId) -> Result<GatewayResponse, GatewayError> {
        self.respond(Call {
            operation: Operation::Question,
            question_id: Some(question_id.clone()),
            text: None,
        })
        .await
    }

    async fn submit_opinion(
        &self,
        question_id: &QuestionId,
        opinion: &str,
    ) -> Result<GatewayResponse, GatewayError> {
        self.respond(Call {
            operation: Operation::SubmitOpinion,
            question_id: Some(question_id.clone()),
            text: Some(opinion.to_string()),
        })
        .await
    }

    async fn opinion_count(
        &self,
        question_id: &QuestionId,
    ) -> Result<GatewayResponse, GatewayError> {
        self.respond(Call {
            operation: Operation::OpinionCount,
            question_id: Some(question_id.clone()),
            text: None,
        })
        .await
    }

    async fn summarize(&self, question_id: &QuestionId) -> Result<GatewayResponse, GatewayError> {
        self.respond(Call {
            operation: Operation::Summarize,
            question_id: Some(question_id.clone()),
            text: None,
        })
        .await
    }
}

pub(crate) fn qid(raw: &str) -> QuestionId {
    QuestionId::new(raw).expect("question id")
}
