use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "dsg", version, about = "AI assisted DataHub dataset generator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (YAML/TOML, extension optional). Missing files are ignored
    #[arg(short, long, global = true, default_value = "dsg")]
    pub config: String,

    /// Directory holding the history database
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct CatalogArgs {
    /// DataHub GMS URL
    #[arg(long = "datahub-gms-url")]
    pub url: Option<String>,

    /// DataHub GMS token
    #[arg(long = "datahub-gms-token")]
    pub token: Option<String>,
}

impl CatalogArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(url) = &self.url {
            config.catalog.url = url.clone();
        }
        if let Some(token) = &self.token {
            config.catalog.token = Some(token.clone());
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct LlmArgs {
    /// OpenAI API key
    #[arg(long)]
    pub api_key: Option<String>,

    /// OpenAI API base URL (also the Azure endpoint)
    #[arg(long)]
    pub api_base: Option<String>,

    /// Model to use
    #[arg(long)]
    pub model: Option<String>,

    /// Use Azure OpenAI
    #[arg(long)]
    pub azure: bool,

    /// Azure OpenAI deployment name (required when using Azure)
    #[arg(long)]
    pub azure_deployment: Option<String>,

    /// Azure OpenAI API version
    #[arg(long)]
    pub azure_api_version: Option<String>,
}

impl LlmArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(api_key) = &self.api_key {
            config.llm.api_key = api_key.clone();
        }
        if let Some(api_base) = &self.api_base {
            config.llm.api_base = api_base.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if self.azure {
            config.llm.use_azure = true;
        }
        if let Some(deployment) = &self.azure_deployment {
            config.llm.azure_deployment = Some(deployment.clone());
        }
        if let Some(version) = &self.azure_api_version {
            config.llm.azure_api_version = version.clone();
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EntityKind {
    #[value(name = "dataset")]
    Dataset,
    #[value(name = "glossaryTerm")]
    GlossaryTerm,
}

impl EntityKind {
    /// Resource segment of the catalog entity endpoint.
    pub fn resource_type(self) -> &'static str {
        match self {
            EntityKind::Dataset => "dataset",
            EntityKind::GlossaryTerm => "glossaryTerm",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a new dataset from a description read on stdin
    Generate {
        #[command(flatten)]
        llm: LlmArgs,

        #[command(flatten)]
        catalog: CatalogArgs,

        /// Write the generated datasets to stdout
        #[arg(long)]
        stdout: bool,

        /// Do not post the datasets to DataHub
        #[arg(long)]
        skip_post: bool,

        /// Reuse the prompt of a history entry
        #[arg(long, value_name = "HISTORY_ID")]
        prompt_from: Option<i64>,
    },

    /// View generation history
    History {
        /// Limit the number of entries
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// Offset for pagination
        #[arg(short, long, default_value_t = 0)]
        offset: usize,

        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// Show details of a specific history entry
    Show {
        #[arg(value_name = "HISTORY_ID")]
        id: i64,

        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// Delete a specific history entry
    Delete {
        #[arg(value_name = "HISTORY_ID")]
        id: i64,
    },

    /// Clear all history entries
    Clear {
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Post a previously saved response to DataHub
    Post {
        #[arg(value_name = "HISTORY_ID")]
        id: i64,

        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Create datasets from an exported history entry (show --json output)
    PostHistoryFile {
        file: PathBuf,

        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Create entities from a JSON file holding an array of them
    FromJson {
        file: PathBuf,

        /// Entity type to send
        #[arg(long, value_enum)]
        entity_type: EntityKind,

        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Add a glossary term to DataHub
    AddTerm {
        /// Glossary term name
        #[arg(long)]
        name: String,

        /// Glossary term URN (defaults to urn:li:glossaryTerm:NAME)
        #[arg(long)]
        urn: Option<String>,

        /// Glossary term definition
        #[arg(long, default_value = "")]
        definition: String,

        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// List every dataset registered in DataHub
    Datasets {
        /// Entities requested per page
        #[arg(long)]
        page_size: Option<usize>,

        /// Print one JSON document per dataset
        #[arg(short, long)]
        json: bool,

        #[command(flatten)]
        catalog: CatalogArgs,
    },
}
