use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::json;
use tracing::debug;

use crate::llm::{models::{ChatOptions, ChatResponse, Message, Usage}, LlmError, LlmProvider};

/// Generation can take minutes for large schemas.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Clone)]
pub struct AzureDeployment {
    pub deployment: String,
    pub api_version: String,
}

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
    azure: Option<AzureDeployment>,
}

impl OpenAiProvider {
    pub fn new(
        api_key: String,
        base_url: String,
        default_model: String,
        azure: Option<AzureDeployment>,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model,
            azure,
        })
    }

    fn endpoint(&self) -> String {
        match &self.azure {
            Some(azure) => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                self.base_url, azure.deployment, azure.api_version
            ),
            None => format!("{}/chat/completions", self.base_url),
        }
    }
}

impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        if self.azure.is_some() {
            "azure-openai"
        } else {
            "openai"
        }
    }

    fn chat(&self, messages: &[Message], options: &ChatOptions) -> Result<ChatResponse, LlmError> {
        let model = options.model.as_deref().unwrap_or(&self.default_model);

        let body = json!({
            "model": model,
            "messages": messages,
            "temperature": options.temperature.unwrap_or(0.2),
            "max_tokens": options.max_tokens.unwrap_or(8192),
        });

        let request = self.client.post(self.endpoint()).json(&body);
        let request = match &self.azure {
            Some(_) => request.header("api-key", self.api_key.as_str()),
            None => request.header("Authorization", format!("Bearer {}", self.api_key)),
        };

        debug!("Sending chat completion request to {} ({})", self.name(), model);
        let response = request
            .send()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().unwrap_or_default();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(LlmError::RateLimited);
            }
            return Err(LlmError::Api(format!("OpenAI Error {}: {}", status, text)));
        }

        let json: serde_json::Value = response
            .json()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(LlmError::EmptyResponse)?
            .to_string();

        let usage = json.get("usage").map(|u| Usage {
            input_tokens: u["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: u["completion_tokens"].as_u64().unwrap_or(0) as u32,
        });

        Ok(ChatResponse {
            content,
            model: model.to_string(),
            usage,
        })
    }
}
