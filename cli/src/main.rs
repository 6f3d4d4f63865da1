//! Piano Admin command line client
//!
//! Browse any collection endpoint of the school backend and follow the
//! notification hub from a terminal.
//!
//! ```sh
//! # One page of rooms, sorted by name
//! piano-admin list rooms --sort name
//!
//! # Every student matching "mei", retrying transient failures
//! piano-admin browse students --search mei --retries 3
//!
//! # Stream hub messages until Ctrl+C
//! piano-admin watch --topic lesson.moved
//!
//! # Validate config without contacting the backend
//! piano-admin --check
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::{error, info, warn};

use piano_admin::application::{InfiniteQuery, LoadOutcome};
use piano_admin::config::AppConfig;
use piano_admin::domain::{QueryKey, QueryOptions};
use piano_admin::runtime::{init_tracing, ClientHandle, ClientOptions};
use piano_admin::shared::{
    listen_for_shutdown_signals, retry_with_backoff, FetchError, RetryConfig, ShutdownSignal,
};

/// Piano school admin client.
#[derive(Parser, Debug)]
#[command(
    name = "piano-admin",
    version,
    about = "Command line client for the piano school administration API",
    long_about = "Lists and searches collection endpoints (rooms, students, ...) \
                  and streams notification hub messages.\n\n\
                  Default config: ~/.config/piano-admin/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "PIANO_ADMIN_CONFIG")]
    config: Option<PathBuf>,

    /// Override the backend base URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Bearer token for the backend.
    #[arg(long, env = "PIANO_ADMIN_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit.
    #[arg(long)]
    check: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a single page.
    List {
        #[command(flatten)]
        query: QueryArgs,
        /// Page number (1-based).
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Fetch pages until the collection is exhausted.
    Browse {
        #[command(flatten)]
        query: QueryArgs,
        /// Extra attempts per page on transient failures.
        #[arg(long, default_value_t = 0)]
        retries: u32,
        /// Stop after this many pages.
        #[arg(long)]
        max_pages: Option<u32>,
    },
    /// Print notification hub messages until interrupted.
    Watch {
        /// Only print these topics (repeatable).
        #[arg(long)]
        topic: Vec<String>,
    },
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Collection path under the base URL, e.g. `rooms`.
    resource: String,
    /// Free-text keyword.
    #[arg(short, long, default_value = "")]
    search: String,
    /// Sort column.
    #[arg(long)]
    sort: Option<String>,
    /// Sort descending.
    #[arg(long)]
    desc: bool,
    /// Page size.
    #[arg(long)]
    size: Option<u32>,
    /// Extra filter as `key=value` (repeatable).
    #[arg(long = "filter", value_parser = parse_filter)]
    filters: Vec<(String, String)>,
}

impl QueryArgs {
    fn options(&self, config: &AppConfig) -> QueryOptions {
        let mut options = config.query.options();
        if let Some(column) = &self.sort {
            options = options.sorted_by(column.clone(), self.desc);
        } else if self.desc {
            options.descending = true;
        }
        if let Some(size) = self.size {
            options = options.page_size(size);
        }
        self.filters
            .iter()
            .fold(options, |options, (key, value)| options.filter(key.clone(), value.clone()))
    }
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(piano_admin::default_config_path);

    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    init_tracing(&config);

    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            warn!("Failed to load config from {}: {}", config_path.display(), e);
            warn!("Using default configuration.");
        }
    }

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(ref url) = cli.base_url {
        info!("CLI override: base_url = {}", url);
        config.api.base_url = url.clone();
    }
    if cli.token.is_some() {
        config.api.token = cli.token.clone();
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        if let Err(e) = config.validate() {
            error!("Configuration is invalid: {}", e);
            return Err(e.into());
        }
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   Base URL    : {}", config.api.base_url);
        println!("   Timeout     : {}s", config.api.timeout_secs);
        println!("   Page size   : {}", config.query.page_size);
        println!("   Debounce    : {}ms", config.query.debounce_ms);
        println!("   Hub         : {}", config.hub.url.as_deref().unwrap_or("disabled"));
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    let Some(command) = cli.command else {
        error!("No command given; see --help");
        return Ok(());
    };

    let start_hub = matches!(command, Command::Watch { .. });
    let client = ClientHandle::start(ClientOptions {
        config,
        tokens: None,
        start_hub,
    })
    .await?;

    let result = match command {
        Command::List { query, page } => list(&client, query, page).await,
        Command::Browse {
            query,
            retries,
            max_pages,
        } => browse(&client, query, retries, max_pages).await,
        Command::Watch { topic } => watch(&client, topic).await,
    };

    client.shutdown().await;
    result
}

async fn list(
    client: &ClientHandle,
    args: QueryArgs,
    page: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = client.source::<Value>(&args.resource);
    let mut table = piano_admin::PagedTable::new(args.options(&client.config));
    table.set_keyword(args.search.clone());
    table.goto(page);

    table.load(source.as_ref()).await;
    if let Some(e) = table.error() {
        return Err(e.clone().into());
    }

    for row in table.rows() {
        println!("{}", serde_json::to_string(row)?);
    }
    let meta = table.metadata();
    info!(
        page = meta.page,
        total_pages = meta.total_pages,
        total_count = meta.total_count,
        "Page listed"
    );
    Ok(())
}

async fn browse(
    client: &ClientHandle,
    args: QueryArgs,
    retries: u32,
    max_pages: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let query = InfiniteQuery::new(
        client.source::<Value>(&args.resource),
        QueryKey::new(args.resource.clone(), args.search.clone()),
        args.options(&client.config),
    );

    let mut printed = 0;
    let mut pages = 0;
    loop {
        if max_pages.is_some_and(|max| pages >= max) {
            break;
        }

        let outcome = retry_with_backoff(
            RetryConfig::with_attempts(retries.saturating_add(1)),
            || async {
                match query.load_next().await {
                    LoadOutcome::Failed(e) => Err(e),
                    other => Ok(other),
                }
            },
            FetchError::is_transient,
            "browse_page",
        )
        .await?;

        match outcome {
            LoadOutcome::Appended { .. } => pages += 1,
            LoadOutcome::Exhausted => break,
            other => {
                warn!(?other, "Unexpected load outcome");
                break;
            }
        }

        let snapshot = query.snapshot().await;
        for row in &snapshot.items[printed..] {
            println!("{}", serde_json::to_string(row)?);
        }
        printed = snapshot.items.len();
    }

    let snapshot = query.snapshot().await;
    info!(
        pages,
        items = snapshot.items.len(),
        total_count = snapshot.total_count.unwrap_or_default(),
        "Browse finished"
    );
    Ok(())
}

async fn watch(client: &ClientHandle, topics: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    if client.hub().is_none() {
        return Err("hub.url is not configured".into());
    }

    let mut events = if topics.is_empty() {
        client.subscribe()
    } else {
        client.event_bus.subscribe_topics(topics)
    };

    let shutdown = ShutdownSignal::new();
    tokio::spawn(listen_for_shutdown_signals(shutdown.clone()));

    info!("Watching hub messages. Press Ctrl+C to stop.");
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => println!("{}", serde_json::to_string(&event)?),
                None => break,
            },
            _ = shutdown.wait() => break,
        }
    }
    Ok(())
}
