//! Turn `<type> <name>` / `<type>/<name>` arguments into Cloud Logging filter fragments.

use tracing::debug;

use crate::error::{Error, Result};
use crate::kubernetes::SelectorLookup;
use crate::types::{ResourceKind, ResourceRef};
use crate::utils::match_labels_to_filter;

/// Parse positional arguments into resource references, preserving their order.
pub fn parse_resources(args: &[String]) -> Result<Vec<ResourceRef>> {
    let tokens: Vec<&str> = args.iter().flat_map(|a| a.split('/')).collect();
    if tokens.len() % 2 != 0 {
        return Err(Error::OddArguments(tokens.len()));
    }

    tokens
        .chunks_exact(2)
        .map(|pair| {
            Ok(ResourceRef {
                kind: ResourceKind::from_token(pair[0])?,
                name: pair[1].to_string(),
            })
        })
        .collect()
}

/// Fragment for the kinds whose pods can be matched from the name alone.
pub fn static_fragment(resource: &ResourceRef) -> Option<String> {
    let name = &resource.name;
    match resource.kind {
        ResourceKind::Deployment => None,
        ResourceKind::CronJob => Some(format!("labels.k8s-pod/job-name:\"{}-\"", name)),
        ResourceKind::Job => Some(format!("resource.labels.pod_name:\"{}-\"", name)),
        ResourceKind::Pod => Some(format!("resource.labels.pod_name=\"{}\"", name)),
        ResourceKind::ArgoWorkflow => Some(format!(
            "labels.k8s-pod/workflows_argoproj_io/workflow=\"{}\"",
            name
        )),
        ResourceKind::ArgoCronWorkflow => Some(format!(
            "labels.k8s-pod/workflows_argoproj_io/workflow:\"{}-\"",
            name
        )),
    }
}

/// Build one fragment per resource, in input order. Deployments are looked up
/// live to read their pod selector; any failure aborts the whole resolution.
pub async fn resolve_fragments<L: SelectorLookup>(
    resources: &[ResourceRef],
    namespace: &str,
    lookup: &L,
) -> Result<Vec<String>> {
    let mut fragments = Vec::with_capacity(resources.len());
    for resource in resources {
        let fragment = match static_fragment(resource) {
            Some(fragment) => fragment,
            None => {
                let labels = lookup
                    .deployment_match_labels(namespace, &resource.name)
                    .await?;
                match_labels_to_filter(&labels)
                    .ok_or_else(|| Error::MissingSelector(resource.name.clone()))?
            }
        };
        debug!("{}/{} -> {}", resource.kind, resource.name, fragment);
        fragments.push(fragment);
    }
    Ok(fragments)
}
