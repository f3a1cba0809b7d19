//! OpenAI-backed completion client

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use openai::chat::{ChatCompletion, ChatCompletionMessage, ChatCompletionMessageRole};
use std::time::Duration;
use tokio::time::timeout;
use uuid::Uuid;

use super::CompletionClient;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

/// Single-turn chat completions
///
/// The `openai` crate reads its credentials from `OPENAI_API_KEY`, so the
/// binary exports the configured key before constructing this client.
pub struct OpenAiCompletion {
    model: String,
}

impl OpenAiCompletion {
    pub fn new(model: impl Into<String>) -> Self {
        Self { model: model.into() }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletion {
    async fn complete(&self, owner_id: &str, prompt: &str) -> Result<String> {
        let request_id = Uuid::new_v4();
        debug!("[{request_id}] Completion request from owner {owner_id}: {} chars", prompt.len());

        let messages = vec![ChatCompletionMessage {
            role: ChatCompletionMessageRole::User,
            content: Some(prompt.to_string()),
            name: None,
            function_call: None,
            tool_call_id: None,
            tool_calls: None,
        }];

        let completion = timeout(
            REQUEST_TIMEOUT,
            ChatCompletion::builder(&self.model, messages).create(),
        )
        .await
        .map_err(|_| anyhow::anyhow!("OpenAI request timed out after 45 seconds"))??;

        let response = completion
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default()
            .trim()
            .to_string();

        debug!("[{request_id}] Got response: {} chars", response.len());
        Ok(response)
    }
}
