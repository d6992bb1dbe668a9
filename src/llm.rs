//! Language model client
//!
//! Defines the client trait used by the classifier and the synthesis
//! renderer. Two implementations:
//! - `OpenAiClient`: chat-completions over HTTP (production)
//! - `MockClient`: returns scripted responses (testing)

mod openai;

pub use openai::OpenAiClient;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// What a completion is for. Backends may route tasks to different models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmTask {
    /// Per-paper classification, answered with a JSON object
    Classify,
    /// Markdown synthesis over a digest of many papers
    Summarize,
}

/// Errors from language model calls.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("missing credential: {0}")]
    MissingCredential(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("empty response from model")]
    EmptyResponse,
}

impl LlmError {
    /// Configuration problems that will fail every call; the run must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingCredential(_))
    }
}

/// Client trait for text generation.
///
/// Abstracts over transport (HTTP, mock) so the classifier and the
/// synthesizer don't depend on how the model is reached.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run one completion: a system instruction plus a user message.
    async fn complete(&self, task: LlmTask, system: &str, user: &str) -> Result<String, LlmError>;
}

/// One call seen by a [`MockClient`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub task: LlmTask,
    pub system: String,
    pub user: String,
}

struct MockRule {
    task: Option<LlmTask>,
    needle: String,
    reply: Result<String, LlmError>,
}

/// Mock client for testing: returns scripted responses.
///
/// Rules match on a substring of the user message (first match wins).
/// Unmatched calls fall back to a per-task default, then fail with a
/// transport error. Every call is recorded.
#[derive(Default)]
pub struct MockClient {
    rules: Vec<MockRule>,
    defaults: HashMap<LlmTask, String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `response` when the user message contains `needle`.
    pub fn with_response(mut self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        self.rules.push(MockRule {
            task: None,
            needle: needle.into(),
            reply: Ok(response.into()),
        });
        self
    }

    /// Like `with_response`, restricted to one task.
    pub fn with_task_response(
        mut self,
        task: LlmTask,
        needle: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.rules.push(MockRule {
            task: Some(task),
            needle: needle.into(),
            reply: Ok(response.into()),
        });
        self
    }

    /// Fail with `error` when the user message contains `needle`.
    pub fn with_failure(mut self, needle: impl Into<String>, error: LlmError) -> Self {
        self.rules.push(MockRule {
            task: None,
            needle: needle.into(),
            reply: Err(error),
        });
        self
    }

    /// Reply used for any unmatched call of the given task.
    pub fn with_default(mut self, task: LlmTask, response: impl Into<String>) -> Self {
        self.defaults.insert(task, response.into());
        self
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of calls received for one task.
    pub fn call_count(&self, task: LlmTask) -> usize {
        self.calls().iter().filter(|c| c.task == task).count()
    }
}

#[async_trait]
impl LlmClient for MockClient {
    async fn complete(&self, task: LlmTask, system: &str, user: &str) -> Result<String, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                task,
                system: system.to_string(),
                user: user.to_string(),
            });
        }

        let rule = self.rules.iter().find(|rule| {
            rule.task.map_or(true, |t| t == task) && user.contains(rule.needle.as_str())
        });
        if let Some(rule) = rule {
            return rule.reply.clone();
        }

        self.defaults.get(&task).cloned().ok_or_else(|| {
            LlmError::Transport(format!("no mock response for {:?} call", task))
        })
    }
}
