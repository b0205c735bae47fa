mod cli;
mod cloud_logging;
mod config;
mod context;
mod error;
mod kubernetes;
mod presenter;
mod query;
mod resources;
mod types;
mod utils;

use anyhow::Context;
use clap::Parser;
use std::io::{BufWriter, IsTerminal, Write};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use cli::Cli;
use cloud_logging::{ENTRY_CHANNEL_CAPACITY, LogStreamer};
use config::Config;
use kubernetes::ClusterWorkloads;
use presenter::{BrowserOpener, RenderOptions, SystemBrowser};
use query::{QueryContext, QueryMode, ResolvedQuery};
use types::LogEntry;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Diagnostics go to stderr; stdout carries only log entries
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from(cli);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping");
            interrupt.cancel();
        }
    });

    if let Err(e) = run(&config, &cancel).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: &Config, cancel: &CancellationToken) -> anyhow::Result<()> {
    let kubeconfig = context::load_kubeconfig(&config.kube)?;
    let identity = context::resolve_identity(&kubeconfig, &config.kube)
        .context("failed to resolve cluster identity")?;
    let resources = resources::parse_resources(&config.resources)
        .context("invalid resource arguments")?;

    let context_name = context::effective_context(&kubeconfig, &config.kube)?;
    let workloads = ClusterWorkloads::new(kubeconfig, context_name);
    let query = QueryContext {
        identity,
        resources,
        duration: config.duration,
        filter: config.filter.clone(),
    }
    .resolve(&workloads, cancel)
    .await
    .map_err(interrupted_or("failed to build query"))?;

    if config.web {
        if cancel.is_cancelled() {
            return Err(error::Error::Cancelled.into());
        }
        open_web(&query, &SystemBrowser)
    } else {
        stream_to_stdout(&query, config, cancel).await
    }
}

fn open_web<B: BrowserOpener>(query: &ResolvedQuery, browser: &B) -> anyhow::Result<()> {
    let now = chrono::Utc::now();
    let filter = query.build(QueryMode::Web, now)?;
    let url = presenter::web_url(&filter, &query.identity().project_id, now);
    debug!("Opening {}", url);
    browser.open(&url).context("failed to open browser")?;
    Ok(())
}

/// Attach `context` to every error except an interrupt, which is reported bare.
fn interrupted_or(context: &'static str) -> impl FnOnce(error::Error) -> anyhow::Error {
    move |e| match e {
        error::Error::Cancelled => e.into(),
        e => anyhow::Error::new(e).context(context),
    }
}

async fn stream_to_stdout(
    query: &ResolvedQuery,
    config: &Config,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let filter = query.build(QueryMode::Batch, chrono::Utc::now())?;
    debug!("Filter:\n{}", filter);

    let streamer = LogStreamer::connect(&config.backend, &query.identity().project_id, cancel)
        .await
        .map_err(interrupted_or("failed to connect to Cloud Logging"))?;

    let (tx, rx) = mpsc::channel(ENTRY_CHANNEL_CAPACITY);
    let producer = streamer.spawn(filter, tx, cancel.clone());

    let stdout = std::io::stdout();
    let options = RenderOptions {
        colorize: stdout.is_terminal(),
        timestamps: config.timestamps,
    };
    let mut out = BufWriter::with_capacity(1 << 15, stdout.lock());
    print_entries(producer, rx, &mut out, options, cancel).await
}

/// Render what `producer` sends, then settle the outcome of both sides.
async fn print_entries<W: Write>(
    producer: JoinHandle<error::Result<()>>,
    rx: mpsc::Receiver<LogEntry>,
    out: &mut W,
    options: RenderOptions,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let rendered = presenter::render(rx, out, options, cancel).await;

    // Nothing is left to print an in-flight page once the printer has failed
    if rendered.is_err() {
        cancel.cancel();
    }
    let fetched = producer.await.context("log fetch task panicked")?;

    // Either side may be the one to notice an interrupt first
    if matches!(rendered, Err(error::Error::Cancelled))
        || matches!(fetched, Err(error::Error::Cancelled))
    {
        return Err(error::Error::Cancelled.into());
    }
    rendered.context("failed to print log entries")?;
    fetched.context("failed to read log entries")?;
    Ok(())
}
