use chrono::{DateTime, SecondsFormat, Utc};
use crossterm::style::Stylize;
use std::io::{self, Write};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::types::{LogEntry, Severity};
use crate::utils::escape_url_component;

pub const CONSOLE_URL: &str = "https://console.cloud.google.com";

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Colour error and warning entries.
    pub colorize: bool,
    /// Prefix each line with the entry's RFC3339 timestamp.
    pub timestamps: bool,
}

/// Write one entry's payload as a line, coloured by severity when asked to.
pub fn write_entry<W: Write>(
    w: &mut W,
    entry: &LogEntry,
    options: RenderOptions,
) -> std::io::Result<()> {
    let mut line = entry.payload.to_string();
    if options.timestamps
        && let Some(ts) = entry.timestamp
    {
        line = format!("{} {}", ts.to_rfc3339_opts(SecondsFormat::AutoSi, true), line);
    }
    if !options.colorize {
        return writeln!(w, "{}", line);
    }
    match entry.severity {
        Severity::Error => writeln!(w, "{}", line.red()),
        Severity::Warning => writeln!(w, "{}", line.yellow()),
        Severity::Default
        | Severity::Debug
        | Severity::Info
        | Severity::Notice
        | Severity::Critical
        | Severity::Alert
        | Severity::Emergency => writeln!(w, "{}", line),
    }
}

async fn drain<W: Write>(
    rx: &mut mpsc::Receiver<LogEntry>,
    w: &mut W,
    options: RenderOptions,
    cancel: &CancellationToken,
) -> Result<()> {
    loop {
        let entry = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            entry = rx.recv() => entry,
        };
        match entry {
            Some(entry) => write_entry(w, &entry, options)?,
            None => return Ok(()),
        }
    }
}

/// Print entries in arrival order until the producer closes the channel or
/// `cancel` fires. The writer is flushed on every exit path.
pub async fn render<W: Write>(
    mut rx: mpsc::Receiver<LogEntry>,
    w: &mut W,
    options: RenderOptions,
    cancel: &CancellationToken,
) -> Result<()> {
    let result = drain(&mut rx, w, options, cancel).await;
    let flushed = w.flush();
    result?;
    Ok(flushed?)
}

/// Cloud Logging console URL showing `query` for `project_id`, positioned at `now`.
pub fn web_url(query: &str, project_id: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}/logs/query;query={};cursorTimestamp={}?project={}",
        CONSOLE_URL,
        escape_url_component(query),
        now.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        escape_url_component(project_id)
    )
}

/// Opens URLs in the user's browser.
pub trait BrowserOpener {
    fn open(&self, url: &str) -> Result<()>;
}

/// Launches the platform's default URL handler.
pub struct SystemBrowser;

const SUPPORTED_PLATFORM: bool = cfg!(any(
    target_os = "linux",
    target_os = "macos",
    target_os = "windows"
));

pub(crate) fn launch_error(e: io::Error) -> Error {
    match e.kind() {
        io::ErrorKind::Unsupported => Error::UnsupportedPlatform(std::env::consts::OS.to_string()),
        _ => Error::Browser(e.to_string()),
    }
}

impl BrowserOpener for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        if !SUPPORTED_PLATFORM {
            return Err(Error::UnsupportedPlatform(std::env::consts::OS.to_string()));
        }
        open::that(url).map_err(launch_error)
    }
}
