//! Trawl-Rank main entry point
//!
//! This is the command-line interface for the Trawl-Rank guided crawler.

use anyhow::Context;
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use trawl_rank::config::{load_config_with_hash, Config};
use trawl_rank::crawler::{index_key, search, HttpFetcher};
use trawl_rank::output::{
    format_authority, format_history, format_hybrid, format_report, load_statistics,
    print_statistics, DEFAULT_RESULT_LIMIT,
};
use trawl_rank::rank::{compute_authority, hybrid_rerank, RankConfig};
use trawl_rank::storage::{IndexStore, LinkStore, SearchLog, SqliteStorage};

/// Trawl-Rank: a guided crawler with a hybrid relevance frontier
///
/// Trawl-Rank answers search terms by crawling outward from a site's search
/// page under a fetch budget, indexing every page it reads. Pages crawled by
/// earlier searches are reused without refetching.
#[derive(Parser, Debug)]
#[command(name = "trawl-rank")]
#[command(version = "1.0.0")]
#[command(about = "A guided crawler with a hybrid relevance frontier", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Use an in-memory store that is discarded on exit
    #[arg(long)]
    ephemeral: bool,

    /// Override the configured fetch budget per search
    #[arg(long, value_name = "N")]
    budget: Option<u32>,

    /// Show statistics from the store and exit
    #[arg(long, conflicts_with_all = ["rank", "history"])]
    stats: bool,

    /// Rerank stored results for TERM by link authority and exit
    #[arg(long, value_name = "TERM", conflicts_with_all = ["stats", "history"])]
    rank: Option<String>,

    /// Show recent searches and exit
    #[arg(long, conflicts_with_all = ["stats", "rank"])]
    history: bool,
}

/// A line typed at the interactive prompt
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Search(String),
    Help,
    Exit,
    Unknown(String),
    Empty,
}

const HELP_TEXT: &str = "\
Type a search term to crawl for it.
  !help   show this message
  !exit   quit";

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    match line {
        "" => Command::Empty,
        "!help" => Command::Help,
        "!exit" => Command::Exit,
        cmd if cmd.starts_with('!') => Command::Unknown(cmd.to_string()),
        term => Command::Search(term.to_string()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Some(budget) = cli.budget {
        anyhow::ensure!(budget > 0, "--budget must be at least 1");
        config.crawler.budget = budget;
    }

    let mut storage = open_store(&config, cli.ephemeral)?;

    // Handle different modes
    if cli.stats {
        handle_stats(&storage)?;
    } else if cli.history {
        handle_history(&storage)?;
    } else if let Some(term) = &cli.rank {
        handle_rank(&config, &storage, term)?;
    } else {
        handle_interactive(&config, &config_hash, &mut storage).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("trawl_rank=info,warn"),
            1 => EnvFilter::new("trawl_rank=debug,info"),
            2 => EnvFilter::new("trawl_rank=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Opens the configured store, or an in-memory one with `--ephemeral`
fn open_store(config: &Config, ephemeral: bool) -> anyhow::Result<SqliteStorage> {
    if ephemeral {
        tracing::info!("Using an in-memory store");
        return SqliteStorage::open_in_memory().context("Failed to open in-memory store");
    }

    let path = Path::new(&config.storage.database_path);
    tracing::info!("Opening store at {}", path.display());
    SqliteStorage::new(path).with_context(|| format!("Failed to open store {}", path.display()))
}

/// Handles the --stats mode: shows statistics from the store
fn handle_stats<S>(storage: &S) -> anyhow::Result<()>
where
    S: IndexStore + LinkStore,
{
    let stats = load_statistics(storage)?;
    print_statistics(&stats);
    Ok(())
}

/// Handles the --history mode: lists recent searches
fn handle_history<S: SearchLog>(storage: &S) -> anyhow::Result<()> {
    let records = storage.recent_searches(DEFAULT_RESULT_LIMIT)?;
    print!("{}", format_history(&records));
    Ok(())
}

/// Handles the --rank mode: reranks stored results by link authority
fn handle_rank<S>(config: &Config, storage: &S, term: &str) -> anyhow::Result<()>
where
    S: IndexStore + LinkStore,
{
    let graph = storage.link_graph()?;
    tracing::info!("Computing authority over {} link records", graph.len());

    let authority = compute_authority(&graph, &RankConfig::from(&config.rank));
    print!("{}", format_authority(&authority, DEFAULT_RESULT_LIMIT));
    println!();

    let Some(key) = index_key(term) else {
        anyhow::bail!("'{}' contains no indexable word", term.trim());
    };
    let ranked = storage.ranked_urls_for_word(&key)?;
    let scores = hybrid_rerank(&authority, &ranked);
    print!("{}", format_hybrid(term.trim(), &scores, DEFAULT_RESULT_LIMIT));

    Ok(())
}

/// Handles the interactive prompt: one search per entered term
async fn handle_interactive(
    config: &Config,
    config_hash: &str,
    storage: &mut SqliteStorage,
) -> anyhow::Result<()> {
    let mut fetcher = HttpFetcher::from_config(&config.fetcher, &config.user_agent)
        .context("Failed to build HTTP client")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Trawl-Rank ready (budget {} pages per search).", config.crawler.budget);
    println!("{}", HELP_TEXT);

    loop {
        print!("search> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match parse_command(&line) {
            Command::Empty => continue,
            Command::Help => println!("{}", HELP_TEXT),
            Command::Exit => break,
            Command::Unknown(cmd) => {
                println!("Unknown command '{}'. Type !help for a list of commands.", cmd)
            }
            Command::Search(term) => {
                match search(&config.crawler, config_hash, &term, storage, &mut fetcher).await {
                    Ok(report) => print!("{}", format_report(&report, DEFAULT_RESULT_LIMIT)),
                    Err(e) => tracing::error!("Search for '{}' failed: {}", term, e),
                }
            }
        }
    }

    tracing::info!("Goodbye");
    Ok(())
}
