use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tabrus_core::config::{Config, Settings};
use tabrus_core::error::Error;
use tabrus_core::types::{Direction, TranslateRequest, TranslateResult};
use tabrus_dict::DictionaryStore;
use tabrus_embed::embedder_or_fallback;
use tabrus_engine::{band, ConfidenceBand, Translator};
use tabrus_llm::{ContextualTranslator, OllamaClient};
use tabrus_vector::ExampleRetriever;

#[derive(Parser)]
#[command(name = "tabrus")]
#[command(version = "0.1")]
#[command(about = "Tabasaran-Russian dictionary and translation engine", long_about = None)]
struct Cli {
    /// Directory holding config.toml; relative paths in the config resolve against it.
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a text.
    Translate {
        text: String,
        #[arg(short, long, default_value = "tab-rus")]
        direction: Direction,
        /// Dictionary-only translation.
        #[arg(long)]
        no_llm: bool,
    },
    /// Look a word up (exact, optionally fuzzy).
    Lookup {
        word: String,
        #[arg(short, long, default_value = "tab-rus")]
        direction: Direction,
        #[arg(long)]
        fuzzy: bool,
    },
    /// Headwords starting with a prefix.
    Suggest {
        prefix: String,
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Fetch one entry by id.
    Entry { id: u64 },
    /// Entries sharing a root.
    Root { root: String },
    /// Entries whose Russian translations contain a word.
    Search {
        word: String,
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Build the example retrieval index and report its size.
    Reindex,
    /// Report dictionary, retrieval and LLM availability.
    Health,
}

/// Translation result plus the display band of each word, in `words` order.
#[derive(Serialize)]
struct TranslateOutput {
    #[serde(flatten)]
    result: TranslateResult,
    bands: Vec<ConfidenceBand>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_store(config: &Config, settings: &Settings) -> Arc<DictionaryStore> {
    let path = config.resolve_path(&settings.dictionary.path);
    let max = settings.matching.fuzzy_max_distance;
    match DictionaryStore::open(&path, max) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "dictionary not loaded");
            Arc::new(DictionaryStore::unavailable(max))
        }
    }
}

/// Embed every dictionary example into a fresh retriever, with a progress bar on stderr.
fn build_retriever(config: &Config, settings: &Settings, store: &DictionaryStore) -> Result<Arc<ExampleRetriever>> {
    let mut retrieval = settings.retrieval.clone();
    retrieval.model_dir = retrieval.model_dir.map(|d| config.resolve_path(d).to_string_lossy().to_string());
    let retriever = Arc::new(ExampleRetriever::new(embedder_or_fallback(&retrieval)));
    if let Ok(index) = store.snapshot() {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} sentences ({percent}%)")?
                .progress_chars("#>-"),
        );
        let stats = retriever.index_with_progress(index.entries(), &pb)?;
        info!(examples = stats.examples, embedded = stats.embedded, embedder = retriever.embedder_id(), "retrieval index built");
    }
    Ok(retriever)
}

fn build_translator(config: &Config, settings: &Settings, store: Arc<DictionaryStore>, with_llm: bool) -> Result<Translator> {
    let mut translator = Translator::new(Arc::clone(&store), settings.clone());
    if with_llm {
        translator = translator.with_retriever(build_retriever(config, settings, &store)?);
        let llm: Arc<dyn ContextualTranslator> = Arc::new(OllamaClient::new(&settings.llm)?);
        translator = translator.with_llm(llm);
    }
    Ok(translator)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load_from(&cli.config_dir).context("loading configuration")?;
    let settings = config.settings()?;
    let store = open_store(&config, &settings);

    match cli.command {
        Commands::Translate { text, direction, no_llm } => {
            let translator = build_translator(&config, &settings, store, !no_llm)?;
            let result = translator.translate(&TranslateRequest { text, direction, use_llm: !no_llm }).await?;
            let bands = result.words.iter().map(|w| band(w.confidence)).collect();
            print_json(&TranslateOutput { result, bands })?;
        }
        Commands::Lookup { word, direction, fuzzy } => {
            let index = store.snapshot()?;
            let m = &settings.matching;
            print_json(&index.lookup_word(&word, direction, fuzzy, m.fuzzy_max_distance, m.fuzzy_limit))?;
        }
        Commands::Suggest { prefix, limit } => print_json(&store.snapshot()?.suggest(&prefix, limit))?,
        Commands::Entry { id } => {
            let index = store.snapshot()?;
            let entry = index.get_by_id(id).ok_or_else(|| Error::NotFound(format!("entry {}", id)))?;
            print_json(entry)?;
        }
        Commands::Root { root } => print_json(&store.snapshot()?.lookup_by_root(&root))?,
        Commands::Search { word, limit } => print_json(&store.snapshot()?.search_target(&word, limit)?)?,
        Commands::Reindex => {
            let retriever = build_retriever(&config, &settings, &store)?;
            print_json(&retriever.status())?;
        }
        Commands::Health => {
            let translator = Translator::new(Arc::clone(&store), settings.clone())
                .with_retriever(build_retriever(&config, &settings, &store)?)
                .with_llm(Arc::new(OllamaClient::new(&settings.llm)?));
            print_json(&translator.health().await)?;
        }
    }
    Ok(())
}
