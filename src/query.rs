//! Compose the Cloud Logging filter for a run.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::kubernetes::SelectorLookup;
use crate::resources::resolve_fragments;
use crate::types::{ClusterIdentity, ResourceRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Printed to stdout; bounded by a `timestamp >=` clause.
    Batch,
    /// Opened in the console, which applies its own time window.
    Web,
}

/// Everything the filter depends on, fixed for the whole invocation.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub identity: ClusterIdentity,
    pub resources: Vec<ResourceRef>,
    pub duration: Duration,
    pub filter: Option<String>,
}

impl QueryContext {
    /// Resolve resource fragments once; both query modes share the result.
    /// Pending cluster lookups are dropped when `cancel` fires.
    pub async fn resolve<L: SelectorLookup>(
        self,
        lookup: &L,
        cancel: &CancellationToken,
    ) -> Result<ResolvedQuery> {
        let fragments = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            fragments = resolve_fragments(&self.resources, &self.identity.namespace, lookup) => fragments?,
        };
        Ok(ResolvedQuery {
            context: self,
            fragments,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedQuery {
    pub context: QueryContext,
    pub fragments: Vec<String>,
}

impl ResolvedQuery {
    pub fn identity(&self) -> &ClusterIdentity {
        &self.context.identity
    }

    /// Build the filter, one clause per line, each narrowing the previous ones.
    pub fn build(&self, mode: QueryMode, now: DateTime<Utc>) -> Result<String> {
        let identity = &self.context.identity;
        let mut lines = vec![
            "resource.type = \"k8s_container\"".to_string(),
            format!("resource.labels.project_id=\"{}\"", identity.project_id),
            format!("resource.labels.location=\"{}\"", identity.location),
            format!("resource.labels.cluster_name=\"{}\"", identity.cluster_name),
            format!("resource.labels.namespace_name=\"{}\"", identity.namespace),
        ];

        if mode == QueryMode::Batch {
            let window = TimeDelta::from_std(self.context.duration)
                .map_err(|e| Error::TimeWindow(e.to_string()))?;
            let since = now
                .checked_sub_signed(window)
                .ok_or_else(|| Error::TimeWindow("duration is too large".to_string()))?;
            lines.push(format!(
                "timestamp >= \"{}\"",
                since.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
        }

        if !self.fragments.is_empty() {
            lines.push(format!("({})", self.fragments.join(" OR ")));
        }

        if let Some(filter) = &self.context.filter {
            lines.push(filter.clone());
        }

        Ok(lines.join("\n"))
    }
}
