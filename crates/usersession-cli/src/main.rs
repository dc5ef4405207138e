//! usersession - inspect and manage the stored user session from a terminal.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use usersession_core::{Config, KeyValueStore, SessionRecord, SessionStore, StorageBackend};

#[derive(Parser)]
#[command(name = "usersession", version, about = "Manage the stored user session")]
struct Cli {
    /// Config file (defaults to ~/.config/usersession/config.json)
    #[arg(long, global = true, env = "USERSESSION_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the stored session record
    Show,
    /// Store a session record, replacing any existing one
    Set {
        #[arg(long)]
        token: String,
        #[arg(long)]
        username: Option<String>,
    },
    /// Remove the stored session record
    Clear,
    /// Re-authenticate and merge the response into the stored record
    Refresh,
    /// Print the effective configuration
    Config,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // RUST_LOG controls the level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            let mut config = Config::load_from(path)?;
            config.apply_env(|name| std::env::var(name).ok())?;
            Ok(config)
        }
        None => Config::load(),
    }
}

type Store = SessionStore<Box<dyn KeyValueStore + Send + Sync>>;

/// Each invocation is a new process, so the session must outlive it
fn open_store(config: &Config) -> Result<Store> {
    if config.storage == StorageBackend::Memory {
        anyhow::bail!(
            "the memory storage backend does not persist between runs; \
             set storage to \"file\" or \"keyring\""
        );
    }
    Ok(SessionStore::new(config.open_storage()?))
}

fn show(store: &Store) -> Result<()> {
    match store.get()? {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => println!("anonymous"),
    }
    Ok(())
}

/// Returns whether the service answered with the success code
async fn refresh(config: &Config, store: &Store) -> Result<bool> {
    let mut client = config.api_client()?;
    if let Some(token) = store.token()? {
        client.set_token(token);
    }

    let resp = store.refresh(&client).await?;
    println!("{}", serde_json::to_string_pretty(&resp)?);

    if !resp.is_success() {
        eprintln!("authentication service answered with code {}", resp.code);
    }
    Ok(resp.is_success())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing();

    let config = load_config(cli.config.as_ref())?;
    info!(environment = %config.environment, storage = ?config.storage, "usersession starting");

    match cli.command {
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Show => {
            show(&open_store(&config)?)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Set { token, username } => {
            let mut record = SessionRecord::new(token);
            record.username = username;
            open_store(&config)?
                .set(&record)
                .context("Could not store session")?;
            println!("session stored");
            Ok(ExitCode::SUCCESS)
        }
        Command::Clear => {
            open_store(&config)?.remove()?;
            println!("session cleared");
            Ok(ExitCode::SUCCESS)
        }
        Command::Refresh => {
            if refresh(&config, &open_store(&config)?).await? {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
