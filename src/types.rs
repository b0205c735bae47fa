use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

use crate::error::{Error, Result};

/// Project, location and cluster of a GKE cluster plus the namespace to query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterIdentity {
    pub project_id: String,
    pub location: String,
    pub cluster_name: String,
    pub namespace: String,
}

impl ClusterIdentity {
    /// Split a kubeconfig cluster name of the form `gke_<project>_<location>_<cluster>`.
    pub fn from_cluster_id(cluster_id: &str, namespace: impl Into<String>) -> Result<Self> {
        let segments: Vec<&str> = cluster_id.split('_').collect();
        match segments.as_slice() {
            [_, project_id, location, cluster_name] => Ok(Self {
                project_id: project_id.to_string(),
                location: location.to_string(),
                cluster_name: cluster_name.to_string(),
                namespace: namespace.into(),
            }),
            _ => Err(Error::ClusterIdentity(cluster_id.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Deployment,
    CronJob,
    Job,
    Pod,
    ArgoWorkflow,
    ArgoCronWorkflow,
}

impl ResourceKind {
    /// Match a type token case-insensitively against the accepted synonyms.
    pub fn from_token(token: &str) -> Result<Self> {
        match token.to_lowercase().as_str() {
            "deployments" | "deployment" | "deploy" => Ok(Self::Deployment),
            "cronjobs" | "cronjob" | "cj" => Ok(Self::CronJob),
            "jobs" | "job" => Ok(Self::Job),
            "pods" | "pod" | "po" => Ok(Self::Pod),
            "workflows" | "workflow" | "wf" => Ok(Self::ArgoWorkflow),
            "cronworkflows" | "cronworkflow" | "cronwf" | "cwf" => Ok(Self::ArgoCronWorkflow),
            _ => Err(Error::UnsupportedResourceType(token.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deployment => "deployment",
            Self::CronJob => "cronjob",
            Self::Job => "job",
            Self::Pod => "pod",
            Self::ArgoWorkflow => "workflow",
            Self::ArgoCronWorkflow => "cronworkflow",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub name: String,
}

/// Cloud Logging severity levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Severity {
    #[default]
    Default,
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl From<String> for Severity {
    fn from(name: String) -> Self {
        match name.as_str() {
            "DEBUG" => Self::Debug,
            "INFO" => Self::Info,
            "NOTICE" => Self::Notice,
            "WARNING" => Self::Warning,
            "ERROR" => Self::Error,
            "CRITICAL" => Self::Critical,
            "ALERT" => Self::Alert,
            "EMERGENCY" => Self::Emergency,
            _ => Self::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Json(serde_json::Value),
    Empty,
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Text(text) => f.write_str(text),
            Payload::Json(value) => write!(f, "{}", value),
            Payload::Empty => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: Option<DateTime<Utc>>,
    pub severity: Severity,
    pub payload: Payload,
}
