use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use url::Url;

use kingshelf_client::{AuthClient, CatalogClient, SessionStore};
use kingshelf_tui::app::{self, App};
use kingshelf_tui::config::Config;

/// Browse the Stephen King collection from your terminal.
#[derive(Debug, Parser)]
#[command(name = "kingshelf", version, about)]
struct Cli {
    /// Base URL of the book catalog API
    #[arg(long)]
    api_url: Option<Url>,

    /// Base URL of the login service
    #[arg(long)]
    auth_url: Option<Url>,

    /// Records requested per catalog page
    #[arg(long)]
    page_size: Option<u32>,

    /// Write logs here instead of the default location
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::config_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("kingshelf")
        .join("kingshelf.log")
}

/// Logs go to a file; stdout belongs to the TUI.
fn init_tracing(log_file: Option<PathBuf>) -> Result<()> {
    let path = log_file.unwrap_or_else(default_log_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = File::create(&path)
        .with_context(|| format!("open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Seed a config file on first run so users have something to edit.
    if let Some(path) = Config::path() {
        if !path.exists() {
            if let Err(err) = Config::default().save() {
                eprintln!("warning: could not write default config: {err}");
            }
        }
    }

    let mut config = Config::load();
    if let Some(api_url) = &cli.api_url {
        config.api_url = api_url.to_string();
    }
    if let Some(auth_url) = &cli.auth_url {
        config.auth_url = auth_url.to_string();
    }
    if let Some(page_size) = cli.page_size {
        config.page_size = page_size;
    }

    let api_url = config.api_url()?;
    let auth_url = config.auth_url()?;
    let page_size = config.checked_page_size()?;

    init_tracing(cli.log_file)?;
    tracing::info!(%api_url, %auth_url, page_size, "starting kingshelf");

    let catalog = Arc::new(CatalogClient::new(api_url));
    let auth = AuthClient::new(auth_url);
    let store = SessionStore::open_default();
    if store.is_none() {
        tracing::warn!("no config directory; sessions will not persist");
    }

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let app = App::new(catalog, auth, store, page_size, events_tx.clone());
    app::run(app, events_tx, events_rx).await
}
