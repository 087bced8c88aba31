use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::mpsc;

use newsrec::api::RecommendationClient;
use newsrec::app::{App, AppEvent};
use newsrec::config::Config;
use newsrec::session::Session;
use newsrec::ui;

/// Get the config directory path (~/.config/newsrec/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("newsrec"))
}

#[derive(Parser, Debug)]
#[command(
    name = "newsrec",
    about = "Terminal client for a news article recommendation service"
)]
struct Args {
    /// User id to fetch recommendations for (overrides config)
    #[arg(long, value_name = "ID")]
    user: Option<String>,

    /// Base URL of the recommendation backend (overrides config)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Config file (default: ~/.config/newsrec/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log file (default: ~/.config/newsrec/newsrec.log)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

fn default_log_file(config_dir: &Path) -> PathBuf {
    config_dir.join("newsrec.log")
}

/// Initialize tracing. Filter comes from `RUST_LOG`.
///
/// Logs always go to a file. Stderr shares the tty with the alternate screen.
fn init_tracing(log_file: &Path) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create log directory '{}'", parent.display())
        })?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file '{}'", log_file.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_file = match args.log_file.clone() {
        Some(path) => path,
        None => default_log_file(&get_config_dir()?),
    };
    init_tracing(&log_file)?;

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_dir()?.join("config.toml"),
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from '{}'", config_path.display()))?;

    if let Some(user) = args.user {
        config.user_id = user;
    }
    if let Some(api_url) = args.api_url {
        config.api_base_url = api_url;
    }
    if config.user_id.trim().is_empty() {
        anyhow::bail!("User id must not be empty");
    }

    let client = RecommendationClient::new(&config.api_base_url, config.request_timeout())
        .with_context(|| format!("Cannot use backend URL '{}'", config.api_base_url))?;

    tracing::info!(
        user_id = %config.user_id,
        base_url = %client.base_url(),
        "Starting session"
    );

    let session = Session::new(config.user_id.clone());
    let mut app = App::new(session, client, &config);

    // Create event channel for background tasks
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    app.start(&event_tx);

    ui::run(&mut app, event_tx, event_rx).await?;

    // Aborts whatever is still in flight
    drop(app);
    Ok(())
}
