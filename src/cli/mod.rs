pub mod commands;

use std::io::{self, BufRead, Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::catalog::models::{Dataset, GlossaryTerm, SchemaSummary};
use crate::catalog::{CatalogClient, Transport};
use crate::cli::commands::{Cli, Commands, EntityKind};
use crate::config::AppConfig;
use crate::db::{HistoryEntry, HistoryStore};
use crate::llm::{prompt::build_prompt, ProviderFactory};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Exported history entry as written by `show --json`.
#[derive(Debug, Deserialize)]
struct HistoryFile {
    #[serde(alias = "ID")]
    id: Option<i64>,
    #[serde(alias = "Response")]
    response: String,
}

pub fn run_cli(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config))?;
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = Some(dir.to_string_lossy().into_owned());
    }

    match cli.command {
        Commands::Generate {
            llm,
            catalog,
            stdout,
            skip_post,
            prompt_from,
        } => {
            llm.apply(&mut config);
            catalog.apply(&mut config);
            run_generate(&config, prompt_from, stdout, skip_post)
        }
        Commands::History {
            limit,
            offset,
            json,
        } => run_list_history(&open_store(&config)?, limit, offset, json),
        Commands::Show { id, json } => run_show_history(&open_store(&config)?, id, json),
        Commands::Delete { id } => run_delete_history(&open_store(&config)?, id),
        Commands::Clear { force } => run_clear_history(&open_store(&config)?, force),
        Commands::Post { id, catalog } => {
            catalog.apply(&mut config);
            run_post_history(&config, id)
        }
        Commands::PostHistoryFile { file, catalog } => {
            catalog.apply(&mut config);
            run_post_history_file(&config, &file)
        }
        Commands::FromJson {
            file,
            entity_type,
            catalog,
        } => {
            catalog.apply(&mut config);
            run_from_json(&config, &file, entity_type)
        }
        Commands::AddTerm {
            name,
            urn,
            definition,
            catalog,
        } => {
            catalog.apply(&mut config);
            run_add_glossary_term(&config, &name, urn.as_deref(), &definition)
        }
        Commands::Datasets {
            page_size,
            json,
            catalog,
        } => {
            catalog.apply(&mut config);
            run_list_datasets(&config, page_size, json)
        }
    }
}

fn open_store(config: &AppConfig) -> Result<HistoryStore> {
    let data_dir = config
        .storage
        .resolve_data_dir()
        .context("could not determine a data directory, pass --data-dir")?;
    HistoryStore::new(&data_dir).context("failed to initialize history database")
}

fn catalog_client(config: &AppConfig) -> Result<CatalogClient> {
    CatalogClient::new(&config.catalog.url, config.catalog.token.clone())
        .context("failed to create DataHub client")
}

fn run_generate(config: &AppConfig, prompt_from: Option<i64>, to_stdout: bool, skip_post: bool) -> Result<()> {
    let user_input = match prompt_from {
        Some(id) => {
            println!("Loading prompt from history...");
            let entry = open_store(config)?
                .get(id)
                .context("error getting response from history")?;
            println!("\n>> {}", entry.prompt.trim());
            entry.prompt
        }
        None => {
            println!("Write the input for AI, hit Enter+Ctrl-D when finished:");
            println!();
            read_user_input()?
        }
    };

    if user_input.trim().is_empty() {
        bail!("no input provided");
    }

    let provider = ProviderFactory::create(&config.llm)?;
    let prompt = build_prompt(&user_input, Utc::now().timestamp_millis());

    println!();
    println!("Understood! generating DataHub datasets...");
    println!("Processing input and generating the dataset (may take a while)...");

    let response = provider
        .complete(&prompt, &ProviderFactory::options(&config.llm))
        .context("error sending request to the model")?;

    let summary = SchemaSummary::from_response(&response).context("error parsing JSON response")?;

    if to_stdout {
        println!("Generated JSON:");
        println!();
        println!("{}", response);
        println!();
    }

    let connect = (!skip_post).then_some(|| catalog_client(config));
    let Some(count) = publish_generation(open_store(config), &user_input, &response, &summary, connect)? else {
        return Ok(());
    };

    println!("finished!");
    if count > 1 {
        println!("{} datasets created!", count);
    } else {
        print_summary(&summary);
        println!();
        println!("Dataset created!");
    }

    Ok(())
}

/// Records a fresh response and, when `connect` is given, posts it.
/// History is best effort once a response exists; posting is not.
fn publish_generation<T, F>(
    store: Result<HistoryStore>,
    prompt: &str,
    response: &str,
    summary: &SchemaSummary,
    connect: Option<F>,
) -> Result<Option<usize>>
where
    T: Transport,
    F: FnOnce() -> Result<CatalogClient<T>>,
{
    let saved = store.and_then(|store| {
        store
            .save(
                prompt,
                response,
                summary.schema_name.as_deref(),
                summary.schema_urn.as_deref(),
                summary.dataset_name.as_deref(),
            )
            .map_err(anyhow::Error::from)
    });
    match saved {
        Ok(id) => debug!("Response saved to history with ID: {}", id),
        Err(e) => warn!("Failed to save to history: {:#}", e),
    }

    let Some(connect) = connect else {
        return Ok(None);
    };

    info!("Posting the dataset");
    let count = connect()?
        .post_entities("dataset", response)
        .context("error posting datasets")?;
    Ok(Some(count))
}

/// Sends a stored response to the catalog exactly as it was generated.
fn replay_history_entry<T: Transport>(client: &CatalogClient<T>, entry: &HistoryEntry) -> Result<usize> {
    client
        .post_entities("dataset", &entry.response)
        .with_context(|| format!("error posting dataset from history entry {}", entry.id))
}

fn run_list_history(store: &HistoryStore, limit: usize, offset: usize, json: bool) -> Result<()> {
    let entries = store.list(limit, offset).context("failed to list history")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No history entries found.");
        return Ok(());
    }

    println!("{:<6} {:<20} {:<40} {:<30}", "ID", "DATE", "SCHEMA NAME", "DATASET NAME");
    println!("{}", "-".repeat(100));
    for entry in entries {
        println!(
            "{:<6} {:<20} {:<40} {:<30}",
            entry.id,
            entry.created_at.format(DATE_FORMAT).to_string(),
            truncate(entry.schema_name.as_deref().unwrap_or_default(), 38),
            truncate(entry.dataset_name.as_deref().unwrap_or_default(), 28)
        );
    }

    Ok(())
}

fn run_show_history(store: &HistoryStore, id: i64, json: bool) -> Result<()> {
    let entry = store.get(id).context("failed to get history entry")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
        return Ok(());
    }

    println!("History Entry Details");
    println!("---------------------");
    println!("ID:          {}", entry.id);
    println!("Created At:  {}", entry.created_at.format(DATE_FORMAT));
    println!("Schema Name: {}", entry.schema_name.as_deref().unwrap_or_default());
    println!("Schema URN:  {}", entry.schema_urn.as_deref().unwrap_or_default());
    println!("Dataset:     {}", entry.dataset_name.as_deref().unwrap_or_default());
    println!();
    println!("Prompt:");
    println!("-------");
    println!("{}", entry.prompt);
    println!();
    println!("Response:");
    println!("---------");
    println!("{}", pretty_json(&entry.response));

    Ok(())
}

fn run_delete_history(store: &HistoryStore, id: i64) -> Result<()> {
    store.get(id).context("failed to find history entry")?;

    if !confirm(&format!("Are you sure you want to delete history entry {}? (y/N): ", id))? {
        println!("Deletion cancelled.");
        return Ok(());
    }

    store.delete(id).context("failed to delete history entry")?;
    println!("History entry {} deleted successfully.", id);
    Ok(())
}

fn run_clear_history(store: &HistoryStore, force: bool) -> Result<()> {
    if !force
        && !confirm("Are you sure you want to clear all history entries? This action cannot be undone. (y/N): ")?
    {
        println!("Clear operation cancelled.");
        return Ok(());
    }

    store.clear().context("failed to clear history")?;
    println!("All history entries have been cleared.");
    Ok(())
}

fn run_post_history(config: &AppConfig, id: i64) -> Result<()> {
    let entry = open_store(config)?
        .get(id)
        .context("failed to get history entry")?;

    println!("Sending datasets (ID: {}) to DataHub...", entry.id);

    let count = replay_history_entry(&catalog_client(config)?, &entry)?;

    if count > 1 {
        println!("{} datasets successfully sent to DataHub!", count);
    } else {
        println!("Dataset successfully sent to DataHub!");
        print_entry_summary(&entry);
    }

    Ok(())
}

fn run_post_history_file(config: &AppConfig, file: &Path) -> Result<()> {
    let data = std::fs::read_to_string(file)
        .with_context(|| format!("error reading file {}", file.display()))?;
    let item: HistoryFile = serde_json::from_str(&data).context("error decoding history file")?;
    let datasets: Vec<Dataset> =
        serde_json::from_str(&item.response).context("error decoding history response")?;

    if let Some(id) = item.id {
        debug!("Posting datasets from exported history entry {}", id);
    }

    let count = catalog_client(config)?
        .post_datasets(&datasets)
        .context("error adding datasets")?;

    println!("{} entities successfully created in DataHub!", count);
    Ok(())
}

fn run_from_json(config: &AppConfig, file: &Path, entity_type: EntityKind) -> Result<()> {
    let data = std::fs::read_to_string(file)
        .with_context(|| format!("error reading file {}", file.display()))?;

    let client = catalog_client(config)?;
    let count = match entity_type {
        EntityKind::Dataset => {
            let datasets: Vec<Dataset> = serde_json::from_str(&data).context("error decoding JSON")?;
            client.post_datasets(&datasets)
        }
        EntityKind::GlossaryTerm => {
            let terms: Vec<GlossaryTerm> = serde_json::from_str(&data).context("error decoding JSON")?;
            client.post_glossary_terms(&terms)
        }
    }
    .with_context(|| format!("error adding {} entities", entity_type.resource_type()))?;

    println!("{} entities successfully created in DataHub!", count);
    Ok(())
}

fn run_add_glossary_term(config: &AppConfig, name: &str, urn: Option<&str>, definition: &str) -> Result<()> {
    let term = GlossaryTerm::internal(name, urn, definition);

    catalog_client(config)?
        .post_glossary_terms(&[term])
        .context("error adding glossary term")?;

    println!("Glossary term successfully added to DataHub!");
    Ok(())
}

fn run_list_datasets(config: &AppConfig, page_size: Option<usize>, json: bool) -> Result<()> {
    let page_size = page_size.unwrap_or(config.catalog.page_size).max(1);

    let mut total = 0usize;
    catalog_client(config)?.list_datasets(page_size, |page| -> Result<()> {
        for dataset in &page {
            if json {
                println!("{}", serde_json::to_string(dataset)?);
            } else {
                println!("{}\t{}", dataset.urn, dataset.schema_name().unwrap_or_default());
            }
        }
        total += page.len();
        Ok(())
    })?;

    if !json {
        println!();
        println!("{} datasets found.", total);
    }
    Ok(())
}

fn print_summary(summary: &SchemaSummary) {
    println!();
    println!("Dataset info");
    println!("-------------");
    println!("Schema URN: {}", summary.schema_urn.as_deref().unwrap_or_default());
    println!("Schema Name: {}", summary.schema_name.as_deref().unwrap_or_default());
}

fn print_entry_summary(entry: &HistoryEntry) {
    println!();
    println!("Dataset info");
    println!("-------------");
    println!("Schema URN: {}", entry.schema_urn.as_deref().unwrap_or_default());
    println!("Schema Name: {}", entry.schema_name.as_deref().unwrap_or_default());
    println!("Dataset Name: {}", entry.dataset_name.as_deref().unwrap_or_default());
}

fn read_user_input() -> Result<String> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("error reading user input")?;
    Ok(input)
}

fn confirm(question: &str) -> Result<bool> {
    print!("{}", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read confirmation")?;

    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn pretty_json(raw: &str) -> String {
    serde_json::from_str::<serde_json::Value>(raw)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or_else(|_| raw.to_string())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
}
