//! Interactive line-oriented front end
//!
//! Each input line is either search-field text or a `:command`. Output is
//! driven entirely by session events.

use crate::client::HttpSearchClient;
use crate::config::SearchConfig;
use crate::controller::SearchSession;
use crate::history::JsonFileHistoryStore;
use crate::presenter::{pump, Presenter, TerminalPresenter};
use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// incsearch - incremental product search
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// API credential for the search endpoint
    #[arg(long, env = "INCSEARCH_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Search endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Quiet interval in milliseconds before typing commits a query
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// Where search history is persisted
    #[arg(long)]
    pub history_path: Option<PathBuf>,
}

impl Cli {
    /// Defaults, then the config file, then flags.
    pub fn resolve_config(&self) -> Result<SearchConfig> {
        let mut config = match &self.config {
            Some(path) => SearchConfig::load(path)?,
            None => SearchConfig::default(),
        };
        if let Some(api_key) = &self.api_key {
            config.client.api_key = api_key.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.client.endpoint = endpoint.clone();
        }
        if let Some(debounce_ms) = self.debounce_ms {
            config.debounce_ms = debounce_ms;
        }
        if let Some(history_path) = &self.history_path {
            config.history_path = history_path.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// New contents of the search field
    Text(String),
    More,
    ShowHistory,
    Pick(usize),
    ClearHistory,
    Quit,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self> {
        let Some(command) = line.strip_prefix(':') else {
            return Ok(ShellCommand::Text(line.to_string()));
        };
        let mut parts = command.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("more"), None) => Ok(ShellCommand::More),
            (Some("history"), None) => Ok(ShellCommand::ShowHistory),
            (Some("pick"), Some(index)) => {
                let index = index
                    .parse()
                    .with_context(|| format!("invalid history index '{}'", index))?;
                Ok(ShellCommand::Pick(index))
            }
            (Some("clear-history"), None) => Ok(ShellCommand::ClearHistory),
            (Some("quit"), None) | (Some("q"), None) => Ok(ShellCommand::Quit),
            _ => anyhow::bail!(
                "unknown command ':{}' (try :more, :history, :pick N, :clear-history, :quit)",
                command
            ),
        }
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.resolve_config().context("Failed to resolve configuration")?;
    log::debug!("Resolved config: {:?}", config);
    if config.client.api_key.is_empty() {
        log::warn!("No API key configured; set INCSEARCH_API_KEY or pass --api-key");
    }

    let client = HttpSearchClient::new(config.client.clone(), config.request_timeout())
        .context("Failed to build HTTP client")?;
    let store = JsonFileHistoryStore::new(
        &config.history_path,
        config.history_key.clone(),
        config.history_limit,
    );
    let session = SearchSession::start(&config, Arc::new(client), Box::new(store))
        .context("Failed to start search session")?;

    let events = session.subscribe();
    let presenter = tokio::spawn(async move {
        let mut presenter = TerminalPresenter::new(io::stdout());
        pump(events, &mut presenter).await;
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        let command = match ShellCommand::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{:#}", e);
                continue;
            }
        };

        let sent = match command {
            ShellCommand::Text(text) => session.on_text_changed(text),
            ShellCommand::More => session.on_scrolled_near_end(),
            ShellCommand::ShowHistory => {
                let snapshot = session.snapshot();
                TerminalPresenter::new(io::stdout()).render_history(snapshot.history.entries())?;
                Ok(())
            }
            ShellCommand::Pick(index) => match session.snapshot().history.get(index) {
                Some(query) => session.on_history_item_selected(query),
                None => {
                    eprintln!("no history entry {}", index);
                    Ok(())
                }
            },
            ShellCommand::ClearHistory => session.clear_history(),
            ShellCommand::Quit => break,
        };
        sent.context("Search session stopped")?;
    }

    drop(session);
    if let Err(e) = presenter.await {
        log::error!("Presenter task failed: {}", e);
    }
    Ok(())
}
