use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;

/// Cluster-context selection, as given by the standard kubectl flags.
#[derive(Debug, Clone, Default)]
pub struct KubeOptions {
    pub namespace: Option<String>,
    pub context: Option<String>,
    pub kubeconfig: Option<PathBuf>,
}

/// Where and how the log backend is queried.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub endpoint: String,
    pub page_size: u32,
}

/// Everything one invocation needs, built once from the command line.
#[derive(Debug, Clone)]
pub struct Config {
    pub resources: Vec<String>,
    pub duration: Duration,
    pub filter: Option<String>,
    pub web: bool,
    pub timestamps: bool,
    pub kube: KubeOptions,
    pub backend: BackendSettings,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            resources: cli.resources,
            duration: cli.duration,
            filter: non_empty(Some(cli.filter)),
            web: cli.web,
            timestamps: cli.timestamps,
            kube: KubeOptions {
                namespace: non_empty(cli.namespace),
                context: non_empty(cli.context),
                kubeconfig: cli.kubeconfig,
            },
            backend: BackendSettings {
                endpoint: cli.logging_endpoint.trim_end_matches('/').to_string(),
                page_size: cli.page_size,
            },
        }
    }
}
