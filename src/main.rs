//! # Maritime Knowledge Base CLI (`mkb`)
//!
//! The `mkb` binary ingests maritime documents into a local store and queries
//! the documents and the knowledge entries derived from them.
//!
//! ## Usage
//!
//! ```bash
//! mkb --config ./config/mkb.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mkb ingest <file>` | Extract, analyse and store a document |
//! | `mkb list` | List stored documents, newest first |
//! | `mkb get <id>` | Print a document with its sections |
//! | `mkb delete <id>` | Remove a document and its knowledge entries |
//! | `mkb search "<query>"` | Substring search over stored documents |
//! | `mkb knowledge` | Ranked knowledge entries, optionally filtered |
//! | `mkb completions <shell>` | Print a shell completion script |

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use maritime_kb::commands;
use maritime_kb::config::{self, Config};
use maritime_kb::models::KnowledgeCategory;
use maritime_kb::Pipeline;

const DEFAULT_CONFIG_PATH: &str = "./config/mkb.toml";

/// Maritime Knowledge Base CLI: turn charter parties, bills of lading and
/// voyage paperwork into a searchable knowledge base.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/mkb.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "mkb",
    about = "Maritime Knowledge Base: ingest maritime documents into a searchable knowledge base",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Built-in defaults are used when the default path does not exist.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log progress to stderr (`RUST_LOG` takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a document file.
    ///
    /// PDFs are parsed page by page; anything else is read as UTF-8 text.
    Ingest {
        /// Path to the document.
        file: PathBuf,

        /// Mime type of the file. Guessed from the extension when omitted.
        #[arg(long)]
        mime: Option<String>,

        /// Ask the enrichment provider to refine the heuristic document type.
        #[arg(long)]
        refine: bool,
    },

    /// List stored documents, newest first.
    List,

    /// Print a stored document with its sections.
    Get {
        /// Document id (`doc_...`).
        id: String,
    },

    /// Delete a stored document.
    Delete {
        /// Document id (`doc_...`).
        id: String,
    },

    /// Case-insensitive substring search over content, names, keywords and summaries.
    Search {
        /// The search query string.
        query: String,
    },

    /// Show ranked knowledge entries.
    Knowledge {
        /// Only entries of documents matching this query.
        #[arg(long)]
        query: Option<String>,

        /// Only entries of this category (laytime, weather, distance,
        /// cp_clause, voyage_guidance, general).
        #[arg(long)]
        category: Option<KnowledgeCategory>,

        /// Maximum number of entries to print.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print a shell completion script.
    Completions {
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "maritime_kb=info,mkb=info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    if path == Path::new(DEFAULT_CONFIG_PATH) && !path.exists() {
        return Ok(Config::default());
    }
    config::load_config(path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "mkb", &mut io::stdout());
        return Ok(());
    }

    let cfg = load_config(&cli.config)?;
    let pipeline = Pipeline::from_config(&cfg)
        .await
        .with_context(|| format!("Failed to open store at {}", cfg.store.path.display()))?;

    match cli.command {
        Commands::Ingest { file, mime, refine } => {
            commands::run_ingest(&pipeline, &file, mime.as_deref(), refine).await?;
        }
        Commands::List => {
            commands::run_list(&pipeline).await?;
        }
        Commands::Get { id } => {
            commands::run_get(&pipeline, &id).await?;
        }
        Commands::Delete { id } => {
            commands::run_delete(&pipeline, &id).await?;
        }
        Commands::Search { query } => {
            commands::run_search(&pipeline, &query).await?;
        }
        Commands::Knowledge {
            query,
            category,
            limit,
        } => {
            commands::run_knowledge(&pipeline, query.as_deref(), category, limit).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
