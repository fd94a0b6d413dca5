use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vaultrag::config::{Config, EmbedderKind};
use vaultrag::index::IndexBackend;
use vaultrag::pipeline::Pipeline;
use vaultrag::source::{DocumentSource, VaultSource};

/// Answer a question from the notes in a vault folder.
#[derive(Parser, Debug)]
#[command(name = "vaultrag", version, about)]
struct Cli {
    /// Question to answer
    question: String,

    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Vault folder to index (overrides VAULTRAG_VAULT)
    #[arg(long)]
    vault: Option<String>,

    /// Number of chunks to retrieve
    #[arg(long)]
    top_k: Option<usize>,

    /// Chat model name
    #[arg(long)]
    model: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Chunk window in characters
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Characters shared by adjacent chunks
    #[arg(long)]
    chunk_overlap: Option<usize>,

    /// Vector index backend: memory | sqlite
    #[arg(long)]
    index: Option<IndexBackend>,

    /// Embedder: openai | hash
    #[arg(long)]
    embedder: Option<EmbedderKind>,

    /// Prompt template file with {context} and {question} placeholders
    #[arg(long)]
    prompt_file: Option<String>,

    /// Print the filled prompt instead of calling the model
    #[arg(long)]
    retrieve_only: bool,

    /// Print the sources of the retrieved chunks after the answer
    #[arg(long)]
    show_sources: bool,
}

impl Cli {
    fn apply(&self, cfg: &mut Config) {
        if let Some(v) = &self.vault {
            cfg.vault_path = Some(v.clone());
        }
        if let Some(v) = self.top_k {
            cfg.search_top_k = v;
        }
        if let Some(v) = &self.model {
            cfg.openai.chat_model = v.clone();
        }
        if let Some(v) = self.temperature {
            cfg.temperature = v;
        }
        if let Some(v) = self.chunk_size {
            cfg.chunk_size = v;
        }
        if let Some(v) = self.chunk_overlap {
            cfg.chunk_overlap = v;
        }
        if let Some(v) = self.index {
            cfg.index_backend = v;
        }
        if let Some(v) = self.embedder {
            cfg.embedder = v;
        }
        if let Some(v) = &self.prompt_file {
            cfg.prompt_file = Some(v.clone());
        }
        if self.retrieve_only {
            cfg.retrieve_only = true;
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // 1. Load config: file, then environment, then flags
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    config.apply_process_env();
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;
    config.log_summary();

    // 2. Build services
    let mut pipeline = Pipeline::from_config(&config).context("Failed to build pipeline")?;

    // 3. Load and index the vault
    let vault = config.vault_path.as_deref().unwrap_or_default();
    let documents = VaultSource::new(vault, &config.extensions)
        .load()
        .context("Failed to load vault")?;
    pipeline.ingest(&documents).context("Failed to index vault")?;

    // 4. Ask
    if config.retrieve_only {
        let prepared = pipeline.prepare(&cli.question)?;
        println!("{}", prepared.prompt);
        return Ok(());
    }

    let answer = pipeline.answer(&cli.question)?;
    println!("{}", answer.text);
    if cli.show_sources {
        for source in answer.sources() {
            println!("- {source}");
        }
    }

    Ok(())
}
