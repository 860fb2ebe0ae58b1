pub mod models;
pub mod openai;
pub mod prompt;

use openai::{AzureDeployment, OpenAiProvider};

use thiserror::Error;
use tracing::debug;

use crate::config::LlmConfig;
use models::{ChatOptions, ChatResponse, Message};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("API Error: {0}")]
    Api(String),
    #[error("no response choices from the model")]
    EmptyResponse,
    #[error("Rate Limited")]
    RateLimited,
    #[error("Configuration Error: {0}")]
    Config(String),
}

pub trait LlmProvider {
    fn name(&self) -> &str;

    fn chat(&self, messages: &[Message], options: &ChatOptions) -> Result<ChatResponse, LlmError>;

    /// Single user-role prompt, first choice text back.
    fn complete(&self, prompt: &str, options: &ChatOptions) -> Result<String, LlmError> {
        let response = self.chat(&[Message::user(prompt)], options)?;
        match &response.usage {
            Some(usage) => debug!(
                "{} answered with {} ({} prompt tokens, {} completion tokens)",
                self.name(),
                response.model,
                usage.input_tokens,
                usage.output_tokens
            ),
            None => debug!("{} answered with {}", self.name(), response.model),
        }
        Ok(response.content)
    }
}

pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create(config: &LlmConfig) -> Result<Box<dyn LlmProvider>, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::Config(
                "an API key is required (set OPENAI_API_KEY or --api-key)".to_string(),
            ));
        }

        let azure = if config.use_azure {
            let deployment = config
                .azure_deployment
                .clone()
                .filter(|d| !d.is_empty())
                .ok_or_else(|| {
                    LlmError::Config(
                        "azure-deployment is required when using Azure OpenAI".to_string(),
                    )
                })?;
            Some(AzureDeployment {
                deployment,
                api_version: config.azure_api_version.clone(),
            })
        } else {
            None
        };

        let provider = OpenAiProvider::new(
            config.api_key.clone(),
            config.api_base.clone(),
            config.model.clone(),
            azure,
        )?;
        Ok(Box::new(provider))
    }

    pub fn options(config: &LlmConfig) -> ChatOptions {
        ChatOptions {
            model: Some(config.model.clone()),
            temperature: Some(config.temperature),
            max_tokens: Some(config.max_tokens),
        }
    }
}
