//! Scripted provider for unit tests.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use super::{CompletionProvider, CompletionRequest};
use crate::types::{ContentError, ErrorCategory, Result};

/// What the scripted provider does for one call
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Text(String),
    Fail(ErrorCategory),
    /// Never answers within any reasonable timeout
    Hang,
}

impl Reply {
    pub(crate) fn text(s: impl Into<String>) -> Self {
        Reply::Text(s.into())
    }
}

type Responder = Box<dyn Fn(&CompletionRequest, usize) -> Reply + Send + Sync>;

/// Provider answering from a closure over (request, call index)
pub(crate) struct ScriptedProvider {
    responder: Responder,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub(crate) fn new(
        responder: impl Fn(&CompletionRequest, usize) -> Reply + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replies in order; once the script runs out every call fails
    pub(crate) fn sequence(replies: Vec<Reply>) -> Self {
        Self::new(move |_, idx| {
            replies
                .get(idx)
                .cloned()
                .unwrap_or(Reply::Fail(ErrorCategory::Network))
        })
    }

    pub(crate) fn always(reply: Reply) -> Self {
        Self::new(move |_, _| reply.clone())
    }

    pub(crate) fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let idx = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(request.clone());
            calls.len() - 1
        };
        match (self.responder)(request, idx) {
            Reply::Text(text) => Ok(text),
            Reply::Fail(category) => Err(ContentError::llm_with_category(
                category,
                format!("scripted failure #{}", idx),
            )),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
