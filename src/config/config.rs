use std::path::PathBuf;

use ::config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Directory name used under the per-user data directory.
pub const APP_DIR_NAME: &str = "dsg";

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub url: String,
    pub token: Option<String>,
    pub page_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub use_azure: bool,
    pub azure_deployment: Option<String>,
    pub azure_api_version: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    pub data_dir: Option<String>,
}

impl StorageConfig {
    /// Configured directory, or the per-user local data directory.
    pub fn resolve_data_dir(&self) -> Option<PathBuf> {
        match self.data_dir.as_deref().filter(|d| !d.is_empty()) {
            Some(dir) => Some(PathBuf::from(dir)),
            None => dirs::data_local_dir().map(|dir| dir.join(APP_DIR_NAME)),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let settings = Config::builder()
            .set_default("catalog.url", "https://api.datahub.io")?
            .set_default("catalog.page_size", 100)?
            .set_default("llm.api_key", "")?
            .set_default("llm.api_base", "https://api.openai.com/v1")?
            .set_default("llm.model", "gpt-4o")?
            .set_default("llm.temperature", 0.2)?
            .set_default("llm.max_tokens", 8192)?
            .set_default("llm.use_azure", false)?
            .set_default("llm.azure_api_version", "2023-05-15")?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("DSG").separator("__"))
            .set_override_option("catalog.url", env_var("DATAHUB_GMS_URL"))?
            .set_override_option("catalog.token", env_var("DATAHUB_GMS_TOKEN"))?
            .set_override_option("llm.api_key", env_var("OPENAI_API_KEY"))?
            .set_override_option("llm.api_base", env_var("OPENAI_API_BASE"))?
            .set_override_option("llm.model", env_var("OPENAI_MODEL"))?
            .set_override_option("llm.use_azure", env_var("OPENAI_USE_AZURE"))?
            .set_override_option("llm.azure_deployment", env_var("AZURE_OPENAI_DEPLOYMENT"))?
            .set_override_option("llm.azure_api_version", env_var("AZURE_OPENAI_API_VERSION"))?
            .set_override_option("storage.data_dir", env_var("DSG_DATA_DIR"))?
            .build()?;

        let mut app_config: AppConfig = settings.try_deserialize()?;

        // Expand environment variables if present like ${DATAHUB_GMS_TOKEN}
        app_config.catalog.url = expand_env(&app_config.catalog.url);
        app_config.catalog.token = app_config.catalog.token.as_deref().map(expand_env);
        app_config.llm.api_key = expand_env(&app_config.llm.api_key);
        app_config.storage.data_dir = app_config.storage.data_dir.as_deref().map(expand_env);

        Ok(app_config)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn expand_env(val: &str) -> String {
    if val.starts_with("${") && val.ends_with('}') {
        let var_name = &val[2..val.len() - 1];
        std::env::var(var_name).unwrap_or_default()
    } else {
        val.to_string()
    }
}
