//! # Paperdex CLI (`pdx`)
//!
//! The `pdx` binary keeps a Chroma vector store in lockstep with a folder of
//! PDFs and answers questions against it.
//!
//! ## Usage
//!
//! ```bash
//! pdx --config ./paperdex.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pdx info` | Show the resolved configuration |
//! | `pdx sync` | Reconcile the store with the library folder |
//! | `pdx ask "<question>"` | Answer a question from the stored segments |
//!
//! ## Examples
//!
//! ```bash
//! # Inspect the configuration pdx will run with
//! pdx info --config ./paperdex.toml
//!
//! # See what a sync would change, without touching the store
//! pdx sync --dry-run
//!
//! # Apply the plan without confirmation prompts
//! pdx sync --yes
//!
//! # Ask with a wider context window
//! pdx ask "how does chapter 2 define entropy?" --top-k 8
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use paperdex::ask;
use paperdex::config::{self, Config};
use paperdex::embedding::OllamaEmbedder;
use paperdex::progress::ProgressMode;
use paperdex::store::chroma::{ChromaStore, CollectionStatus};
use paperdex::sync::{self, SyncOptions};

/// Paperdex — question answering over a folder of PDFs, backed by Chroma
/// and Ollama.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `paperdex.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "pdx",
    about = "Paperdex — keep a vector store in lockstep with a folder of PDFs and ask questions against it",
    version,
    long_about = "Paperdex mirrors a folder of PDFs into a Chroma collection. Files are \
    identified by content hash, so `sync` only embeds documents that actually changed and \
    removes entries whose source file disappeared. `ask` retrieves the best-matching \
    segments and hands them to a local Ollama chat model as grounding context."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./paperdex.toml`. The library folder, chunking strategy,
    /// store, and model settings are all read from this file.
    #[arg(long, global = true, default_value = "./paperdex.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Show the resolved configuration.
    ///
    /// Prints the settings pdx will run with after defaults are applied.
    /// Makes no network calls, so it works without Chroma or Ollama running.
    Info,

    /// Reconcile the vector store with the library folder.
    ///
    /// Hashes every file in the folder, diffs the hash set against what the
    /// store holds, and shows the resulting plan. Additions and removals
    /// are confirmed separately before anything is applied.
    Sync {
        /// Show the plan without applying it.
        #[arg(long)]
        dry_run: bool,

        /// Apply the plan without confirmation prompts.
        #[arg(long, short = 'y')]
        yes: bool,

        /// Progress reporting on stderr: `off`, `human`, or `json`.
        /// Defaults to `human` when stderr is a terminal.
        #[arg(long)]
        progress: Option<ProgressMode>,
    },

    /// Answer a question from the stored segments.
    ///
    /// Retrieves the most similar segments, feeds them to the chat model as
    /// context, and prints the answer.
    Ask {
        /// The question to answer.
        question: String,

        /// Number of segments to retrieve. Defaults to `retrieval.top_k`.
        #[arg(long)]
        top_k: Option<usize>,
    },
}

/// Connect to Chroma, resolving (or creating) the configured collection.
async fn connect_store(config: &Config) -> anyhow::Result<ChromaStore> {
    let embedder = Box::new(OllamaEmbedder::new(&config.ollama)?);
    let (store, status) = ChromaStore::connect(&config.store, embedder).await?;
    if status == CollectionStatus::Created {
        eprintln!("created collection '{}'", config.store.collection);
    }
    Ok(store)
}

fn print_info(path: &std::path::Path, config: &Config) {
    println!("config: {}", path.display());
    println!("  library.root: {}", config.library.root.display());
    println!("  library.extension: {}", config.library.extension);
    println!("  chunking.strategy: {}", config.chunking.strategy);
    println!(
        "  chunking.max_section_chars: {}",
        config.chunking.max_section_chars
    );
    println!("  store.url: {}", config.store.url);
    println!("  store.collection: {}", config.store.collection);
    println!("  store.tenant: {}", config.store.tenant);
    println!("  store.database: {}", config.store.database);
    println!("  ollama.url: {}", config.ollama.url);
    println!("  ollama.embedding_model: {}", config.ollama.embedding_model);
    println!("  ollama.chat_model: {}", config.ollama.chat_model);
    println!("  retrieval.top_k: {}", config.retrieval.top_k);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Info => {
            print_info(&cli.config, &cfg);
        }
        Commands::Sync {
            dry_run,
            yes,
            progress,
        } => {
            let store = connect_store(&cfg).await?;
            let options = SyncOptions {
                dry_run,
                yes,
                progress: progress.unwrap_or_else(ProgressMode::default_for_tty),
            };
            sync::run_sync(&cfg, &store, &options).await?;
        }
        Commands::Ask { question, top_k } => {
            let store = connect_store(&cfg).await?;
            ask::run_ask(&cfg, &store, &question, top_k).await?;
        }
    }

    Ok(())
}
