//! Stream entries from the Cloud Logging `entries.list` API.

use chrono::{DateTime, Utc};
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::BackendSettings;
use crate::error::{Error, Result};
use crate::types::{LogEntry, Payload, Severity};

/// Capacity of the hand-off between the page fetcher and the printer.
pub const ENTRY_CHANNEL_CAPACITY: usize = 100;

const ACCESS_TOKEN_ENV: &str = "CLOUDSDK_AUTH_ACCESS_TOKEN";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListEntriesRequest<'a> {
    resource_names: Vec<String>,
    filter: &'a str,
    order_by: &'static str,
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListEntriesResponse {
    #[serde(default)]
    entries: Vec<RawEntry>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    severity: Severity,
    text_payload: Option<String>,
    json_payload: Option<serde_json::Value>,
    proto_payload: Option<serde_json::Value>,
}

impl From<RawEntry> for LogEntry {
    fn from(raw: RawEntry) -> Self {
        let payload = match (raw.text_payload, raw.json_payload, raw.proto_payload) {
            (Some(text), _, _) => Payload::Text(text),
            (None, Some(json), _) | (None, None, Some(json)) => Payload::Json(json),
            (None, None, None) => Payload::Empty,
        };
        Self {
            timestamp: raw.timestamp,
            severity: raw.severity,
            payload,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    status: String,
}

enum Cursor {
    Start,
    Page(String),
    Done,
}

/// A connection to Cloud Logging scoped to one project.
pub struct LogStreamer {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    token: String,
    page_size: u32,
}

impl LogStreamer {
    pub fn new(
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        token: impl Into<String>,
        page_size: u32,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("kubectl-glogs/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            project_id: project_id.into(),
            token: token.into(),
            page_size,
        })
    }

    /// Obtain application default credentials and open a streamer for `project_id`.
    /// Gives up with `Cancelled` if `cancel` fires while credentials are fetched.
    pub async fn connect(
        settings: &BackendSettings,
        project_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        let token = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            token = access_token() => token?,
        };
        Self::new(&settings.endpoint, project_id, token, settings.page_size)
    }

    async fn list_page(&self, filter: &str, page_token: Option<String>) -> Result<ListEntriesResponse> {
        let request = ListEntriesRequest {
            resource_names: vec![format!("projects/{}", self.project_id)],
            filter,
            order_by: "timestamp asc",
            page_size: self.page_size,
            page_token,
        };

        let response = self
            .http
            .post(format!("{}/v2/entries:list", self.endpoint))
            .bearer_auth(&self.token)
            .header("x-goog-user-project", &self.project_id)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) if envelope.error.status.is_empty() => envelope.error.message,
                Ok(envelope) => format!("{} ({})", envelope.error.message, envelope.error.status),
                Err(_) => body,
            };
            return Err(Error::Backend {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    async fn next_page(
        &self,
        filter: &str,
        cursor: Cursor,
    ) -> Result<Option<(Vec<LogEntry>, Cursor)>> {
        let page_token = match cursor {
            Cursor::Done => return Ok(None),
            Cursor::Start => None,
            Cursor::Page(token) => Some(token),
        };

        let page = self.list_page(filter, page_token).await?;
        debug!("Fetched page of {} entries", page.entries.len());

        let next = match page.next_page_token {
            Some(token) if !token.is_empty() => Cursor::Page(token),
            _ => Cursor::Done,
        };
        let entries = page.entries.into_iter().map(LogEntry::from).collect();
        Ok(Some((entries, next)))
    }

    /// Entries matching `filter`, in the order the backend returns them.
    /// Pages are fetched lazily; a failed page ends the stream with its error.
    pub fn entries<'a>(&'a self, filter: &'a str) -> impl Stream<Item = Result<LogEntry>> + 'a {
        stream::try_unfold(Cursor::Start, move |cursor| self.next_page(filter, cursor))
            .map_ok(|entries| stream::iter(entries.into_iter().map(Ok::<_, Error>)))
            .try_flatten()
    }

    /// Push every entry into `tx` from a background task until the results end,
    /// a page fails, the receiver goes away or `cancel` fires. The connection is
    /// dropped when the task finishes.
    pub fn spawn(
        self,
        filter: String,
        tx: mpsc::Sender<LogEntry>,
        cancel: CancellationToken,
    ) -> JoinHandle<Result<()>> {
        tokio::spawn(async move {
            let entries = self.entries(&filter);
            futures::pin_mut!(entries);

            loop {
                let next = tokio::select! {
                    _ = cancel.cancelled() => return Err(Error::Cancelled),
                    next = entries.next() => next,
                };
                match next {
                    Some(Ok(entry)) => {
                        let sent = tokio::select! {
                            _ = cancel.cancelled() => return Err(Error::Cancelled),
                            sent = tx.send(entry) => sent,
                        };
                        if sent.is_err() {
                            debug!("Entry receiver closed, stopping fetch");
                            return Ok(());
                        }
                    }
                    Some(Err(e)) => return Err(e),
                    None => return Ok(()),
                }
            }
        })
    }
}

async fn access_token() -> Result<String> {
    if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV)
        && !token.trim().is_empty()
    {
        debug!("Using access token from {}", ACCESS_TOKEN_ENV);
        return Ok(token.trim().to_string());
    }

    let output = tokio::process::Command::new("gcloud")
        .args(["auth", "application-default", "print-access-token"])
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| Error::Auth(format!("failed to run gcloud: {}", e)))?;

    if !output.status.success() {
        return Err(Error::Auth(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(Error::Auth("gcloud returned an empty access token".to_string()));
    }
    Ok(token)
}
