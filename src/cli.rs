use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::parse_duration;

pub const DEFAULT_LOGGING_ENDPOINT: &str = "https://logging.googleapis.com";

#[derive(Parser, Debug)]
#[command(name = "kubectl-glogs")]
#[command(about = "Print Cloud Logging entries for the containers of a GKE namespace or of specific resources")]
#[command(after_help = "Examples:
  kubectl glogs                          # every container in the namespace
  kubectl glogs cronjob backup           # pods spawned by a CronJob
  kubectl glogs deploy/nginx pods/item   # several resources at once
  kubectl glogs --duration 2h            # look further back (default 30m)
  kubectl glogs deploy nginx --web       # open the same query in the console")]
pub struct Cli {
    /// Resources as `<type> <name>` or `<type>/<name>` (deployment, cronjob, job, pod, workflow, cronworkflow)
    pub resources: Vec<String>,

    /// How far back to read logs
    #[arg(long, env = "GLOGS_DURATION", default_value = "30m", value_parser = parse_duration)]
    pub duration: Duration,

    /// Additional Cloud Logging filter clause, appended verbatim
    #[arg(long, env = "GLOGS_FILTER", default_value = "")]
    pub filter: String,

    /// Open the query in the Cloud Logging console instead of printing
    #[arg(long, env = "GLOGS_WEB")]
    pub web: bool,

    /// Prefix each entry with its timestamp
    #[arg(long, env = "GLOGS_TIMESTAMPS")]
    pub timestamps: bool,

    /// Namespace
    #[arg(short = 'n', long)]
    pub namespace: Option<String>,

    /// Context
    #[arg(long)]
    pub context: Option<String>,

    /// Path to the kubeconfig file
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Entries requested per Cloud Logging page
    #[arg(long, env = "GLOGS_PAGE_SIZE", default_value_t = 1000, value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub page_size: u32,

    /// Cloud Logging API endpoint
    #[arg(long, env = "GLOGS_LOGGING_ENDPOINT", default_value = DEFAULT_LOGGING_ENDPOINT, hide = true)]
    pub logging_endpoint: String,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}
