//! Resolve the GKE project, location and cluster behind the active kubeconfig context.

use kube::config::Kubeconfig;
use tracing::debug;

use crate::config::KubeOptions;
use crate::error::{Error, Result};
use crate::types::ClusterIdentity;

pub fn load_kubeconfig(options: &KubeOptions) -> Result<Kubeconfig> {
    let kubeconfig = match &options.kubeconfig {
        Some(path) => Kubeconfig::read_from(path)?,
        None => Kubeconfig::read()?,
    };
    Ok(kubeconfig)
}

/// The explicit `--context` if given, else the kubeconfig's current context.
pub fn effective_context(kubeconfig: &Kubeconfig, options: &KubeOptions) -> Result<String> {
    options
        .context
        .clone()
        .or_else(|| kubeconfig.current_context.clone())
        .filter(|c| !c.is_empty())
        .ok_or(Error::NoCurrentContext)
}

/// Derive the cluster identity for the effective context.
///
/// The namespace comes from `--namespace` when set, otherwise from the context,
/// and may be empty.
pub fn resolve_identity(kubeconfig: &Kubeconfig, options: &KubeOptions) -> Result<ClusterIdentity> {
    let context_name = effective_context(kubeconfig, options)?;
    let context = kubeconfig
        .contexts
        .iter()
        .find(|c| c.name == context_name)
        .and_then(|c| c.context.as_ref())
        .ok_or_else(|| Error::ContextNotFound(context_name.clone()))?;

    let namespace = options
        .namespace
        .clone()
        .or_else(|| context.namespace.clone())
        .unwrap_or_default();

    let identity = ClusterIdentity::from_cluster_id(&context.cluster, namespace)?;
    debug!(
        "Context {} -> project={} location={} cluster={} namespace={:?}",
        context_name,
        identity.project_id,
        identity.location,
        identity.cluster_name,
        identity.namespace
    );
    Ok(identity)
}
