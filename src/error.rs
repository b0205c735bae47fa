use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can end a `kubectl glogs` run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load kubeconfig: {0}")]
    Config(#[from] kube::config::KubeconfigError),

    #[error("no current context set in kubeconfig and --context not given")]
    NoCurrentContext,

    #[error("context \"{0}\" not found in kubeconfig")]
    ContextNotFound(String),

    #[error("cannot determine cluster identity from \"{0}\" (expected gke_<project>_<location>_<cluster>)")]
    ClusterIdentity(String),

    #[error("resource arguments must pair as <type> <name>, got {0} token(s)")]
    OddArguments(usize),

    #[error("resource type \"{0}\" is not supported")]
    UnsupportedResourceType(String),

    #[error("failed to resolve {kind} \"{name}\": {reason}")]
    Resolution {
        kind: &'static str,
        name: String,
        reason: String,
    },

    #[error("deployment \"{0}\" doesn't have a label selector")]
    MissingSelector(String),

    #[error("failed to connect to cluster: {0}")]
    Kube(#[from] kube::Error),

    #[error("failed to obtain Cloud Logging credentials: {0}")]
    Auth(String),

    #[error("Cloud Logging request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cloud Logging returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("invalid time window: {0}")]
    TimeWindow(String),

    #[error("failed to write output: {0}")]
    Presentation(#[from] std::io::Error),

    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("failed to open browser: {0}")]
    Browser(String),

    #[error("interrupted")]
    Cancelled,
}
