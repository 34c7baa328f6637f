//! framehouse CLI
//!
//! Inspect type descriptors and the symbols held in a SQLite-backed
//! framehouse store.
//!
//! ## Quick Start
//!
//! ```bash
//! # Parse a descriptor and show its layout
//! framehouse dtype "[('ts', '<M8[ns]'), ('px', '<f8')]"
//!
//! # Inspect a store
//! export FRAMEHOUSE_DB=./ticks.db
//! framehouse symbols
//! framehouse info AAPL
//! framehouse head AAPL -n 20
//! framehouse delete AAPL
//! ```
//!
//! ## Configuration
//!
//! - `FRAMEHOUSE_DB` / `--db`: SQLite file (default: `framehouse.db`)
//! - `--config`: TOML file with `StoreConfig` settings
//! - `RUST_LOG`: log filter (default: `info`), written to stderr

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use framehouse_core::TypeDescriptor;
use framehouse_metadata::SqliteMetadataStore;
use framehouse_storage::{SegmentStore, StoreConfig};

mod format;

#[derive(Parser)]
#[command(name = "framehouse")]
#[command(about = "framehouse store inspector", long_about = None)]
#[command(version)]
struct Cli {
    /// SQLite metadata database
    #[arg(long, env = "FRAMEHOUSE_DB", default_value = "framehouse.db")]
    db: PathBuf,

    /// Store configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a type descriptor and print its layout
    Dtype {
        /// Descriptor text, e.g. "[('a', '<f8')]"
        text: String,
    },
    /// List stored symbols
    Symbols,
    /// Show the live version document of a symbol
    Info {
        symbol: String,
    },
    /// Print the first rows of a symbol
    Head {
        symbol: String,

        /// Number of rows
        #[arg(short = 'n', long, default_value = "10")]
        rows: usize,
    },
    /// Delete a symbol with all of its segments
    Delete {
        symbol: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Descriptor parsing needs no store
    if let Commands::Dtype { text } = &cli.command {
        let dtype = TypeDescriptor::parse(text).context("Invalid type descriptor")?;
        print!("{}", format::describe_dtype(&dtype));
        return Ok(());
    }

    let store = open_store(&cli).await?;

    match cli.command {
        Commands::Dtype { .. } => {}
        Commands::Symbols => {
            let symbols = store.list_symbols().await?;
            if symbols.is_empty() {
                println!("No symbols found");
            }
            for symbol in symbols {
                println!("{symbol}");
            }
        }
        Commands::Info { symbol } => {
            let version = store
                .read_version(&symbol)
                .await?
                .with_context(|| format!("Symbol not found: {symbol}"))?;
            print!("{}", format::describe_version(&version));
        }
        Commands::Head { symbol, rows } => {
            let df = store
                .read(&symbol)
                .await
                .with_context(|| format!("Failed to read {symbol}"))?;
            print!("{}", format::render_rows(&df, rows));
            if df.len() > rows {
                println!("... {} more rows", df.len() - rows);
            }
        }
        Commands::Delete { symbol } => {
            let removed = store.delete(&symbol).await?;
            println!("Deleted {symbol} ({removed} documents)");
        }
    }

    Ok(())
}

async fn open_store(cli: &Cli) -> Result<SegmentStore> {
    let config = match &cli.config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    tracing::debug!(db = %cli.db.display(), ?config, "opening store");

    let metadata = SqliteMetadataStore::new(&cli.db)
        .await
        .with_context(|| format!("Failed to open {}", cli.db.display()))?;

    Ok(SegmentStore::new(Arc::new(metadata), config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_head_defaults() {
        let cli = Cli::try_parse_from(["framehouse", "head", "AAPL"]).unwrap();
        assert_eq!(cli.db, PathBuf::from("framehouse.db"));
        assert!(cli.config.is_none());
        match cli.command {
            Commands::Head { symbol, rows } => {
                assert_eq!(symbol, "AAPL");
                assert_eq!(rows, 10);
            }
            _ => panic!("expected head"),
        }
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "framehouse",
            "--db",
            "/tmp/ticks.db",
            "--config",
            "store.toml",
            "head",
            "MSFT",
            "-n",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.db, PathBuf::from("/tmp/ticks.db"));
        assert_eq!(cli.config, Some(PathBuf::from("store.toml")));
        assert!(matches!(cli.command, Commands::Head { rows: 3, .. }));
    }

    #[test]
    fn test_missing_symbol_is_rejected() {
        assert!(Cli::try_parse_from(["framehouse", "info"]).is_err());
        assert!(Cli::try_parse_from(["framehouse", "bogus"]).is_err());
    }
}
