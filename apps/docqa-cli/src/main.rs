use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use docqa_core::config::{Config, Settings};
use docqa_embed::embedder_from_config;
use docqa_rag::prompt::snippet;
use docqa_rag::{ingest, ServingState};
use docqa_vector::VectorIndex;

#[derive(Parser)]
#[command(name = "docqa", about = "Ask questions over a local documentation corpus")]
struct Cli {
    /// Directory containing config.toml (relative paths resolve against it)
    #[arg(long, global = true, default_value = ".")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load, chunk and embed the corpus, then persist the index
    Ingest {
        /// Corpus directory (overrides corpus.path)
        #[arg(long)]
        corpus: Option<PathBuf>,
        #[arg(long)]
        no_progress: bool,
    },
    /// Show the persisted index header
    Info,
    /// List the top-k chunks for a query without generating an answer
    Search {
        query: String,
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Answer a question
    Ask {
        query: String,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load_from(&cli.config_dir).context("failed to load configuration")?;
    let mut settings = config.settings().context("invalid configuration")?;
    info!(config_dir = %cli.config_dir.display(), index = %settings.index.path.display(), "configuration loaded");

    match cli.command {
        Command::Ingest { corpus, no_progress } => {
            if let Some(corpus) = corpus {
                settings.corpus.path = corpus;
            }
            run_ingest(&settings, !no_progress)
        }
        Command::Info => run_info(&settings),
        Command::Search { query, k } => run_search(&settings, &query, k.unwrap_or(settings.retrieval.k)),
        Command::Ask { query, json } => run_ask(settings, &query, json),
    }
}

fn run_ingest(settings: &Settings, show_progress: bool) -> Result<()> {
    println!("📂 Corpus: {}", settings.corpus.path.display());
    let embedder = embedder_from_config(&settings.embedding).context("failed to load embedding model")?;
    let report = ingest(settings, embedder, show_progress)?;

    println!("📊 Loaded {} documents", report.documents);
    for failure in &report.failures {
        println!("⚠️  Skipped {}: {}", failure.path.display(), failure.error);
    }
    println!("📊 Created {} chunks", report.chunks);
    if let Some(sample) = &report.sample {
        println!("\nSample chunk metadata:");
        println!("  source: {}", sample.source_name);
        println!("  path:   {}", sample.source_path);
        println!("  index:  {}", sample.sequence_index);
        println!("\nSample chunk content:\n{}", snippet(&sample.text, settings.retrieval.snippet_chars));
    }
    println!("\n✅ Index written to {}", report.index_path.display());
    Ok(())
}

fn run_info(settings: &Settings) -> Result<()> {
    let header = VectorIndex::read_header(&settings.index.path)
        .with_context(|| format!("failed to read index {}", settings.index.path.display()))?;
    println!("Index:     {}", settings.index.path.display());
    println!("Model:     {}", header.embedder_id);
    println!("Dimension: {}", header.dim);
    println!("Metric:    {}", header.metric);
    println!("Chunks:    {}", header.chunk_count);
    println!("Built at:  {}", header.built_at.to_rfc3339());
    Ok(())
}

fn run_search(settings: &Settings, query: &str, k: usize) -> Result<()> {
    let embedder = embedder_from_config(&settings.embedding).context("failed to load embedding model")?;
    let index = VectorIndex::load(&settings.index.path, embedder).context("failed to load index")?;
    let hits = index.search(query, k)?;
    info!(k, hits = hits.len(), index = %settings.index.path.display(), "search finished");
    println!("🔍 {} results for \"{}\"", hits.len(), query);
    for (i, hit) in hits.iter().enumerate() {
        println!("\nSource {}: {}  (score={:.4}, path={})", i + 1, hit.chunk.source_name, hit.score, hit.chunk.source_path);
        println!("{}", snippet(&hit.chunk.text, settings.retrieval.snippet_chars));
        println!("---");
    }
    Ok(())
}

fn run_ask(settings: Settings, query: &str, json: bool) -> Result<()> {
    info!(index = %settings.index.path.display(), backend = ?settings.generation.backend, "answering question");
    let state = ServingState::from_settings(settings);
    let result = state.answer(query)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    println!("{}", result.text);
    if let Some(routing) = result.routing {
        println!("\nretrieval: {} ({:?})", if routing.retrieve { "yes" } else { "no" }, routing.reason);
    }
    println!("grounded:  {}", result.grounded);
    for (i, source) in result.sources.iter().enumerate() {
        println!("\nSource {}: {}  (score={:.4})", i + 1, source.source_name, source.score);
        println!("{}", source.snippet);
    }
    Ok(())
}
