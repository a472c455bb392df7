use anyhow::{anyhow, Result};
use secrecy::{ExposeSecret, Secret};
use tracing::{debug, info};

use crate::configuration::LlmSettings;

use super::types::{
    Content, FunctionDeclaration, GenerateContentRequest, GenerateContentResponse, RawToolCall,
    RouterOutcome, ToolDeclarations,
};

/// Client for the routing and commentary collaborator. All state is injected
/// at construction; there is no ambient credential or global client.
pub struct GeminiService {
    pub(super) client: reqwest::Client,
    pub(super) api_key: Secret<String>,
    pub(super) base_url: String,
    pub(super) model: String,
    tools: Vec<FunctionDeclaration>,
}

impl GeminiService {
    pub fn new(settings: &LlmSettings, tools: Vec<FunctionDeclaration>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            tools,
        }
    }

    /// Test constructor pointing at a mock server.
    pub fn with_base_url(base_url: impl Into<String>, tools: Vec<FunctionDeclaration>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: Secret::new("test_key".to_string()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: "gemini-2.0-flash".to_string(),
            tools,
        }
    }

    /// Routes a user message: asks the collaborator to either emit function
    /// calls against the advertised tool schemas or answer directly.
    pub async fn route_query(&self, text: &str) -> Result<RouterOutcome> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(text)],
            tools: vec![ToolDeclarations {
                function_declarations: self.tools.clone(),
            }],
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: GenerateContentResponse = response.json().await?;
        let content = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .ok_or_else(|| anyhow!("router returned no candidates"))?;

        let mut calls = Vec::new();
        let mut text_parts = Vec::new();
        for part in content.parts {
            if let Some(call) = part.function_call {
                debug!(tool = %call.name, "router requested tool call");
                calls.push(RawToolCall {
                    tool_name: call.name,
                    tool_args: call.args,
                });
            } else if let Some(text) = part.text {
                text_parts.push(text);
            }
        }

        if !calls.is_empty() {
            info!(count = calls.len(), "routing produced tool calls");
            return Ok(RouterOutcome::ToolCalls(calls));
        }

        let answer = text_parts.join("");
        if answer.is_empty() {
            return Err(anyhow!("router returned neither tool calls nor text"));
        }
        Ok(RouterOutcome::Text(answer))
    }
}
