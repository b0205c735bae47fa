use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client};
use std::collections::BTreeMap;
use std::fmt::Debug;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::{Error, Result};

/// Live lookups against the cluster's workload API.
pub trait SelectorLookup {
    /// The `matchLabels` of a deployment's pod selector.
    async fn deployment_match_labels(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<BTreeMap<String, String>>;
}

trait HasSelector {
    fn get_selector(&self) -> Option<&LabelSelector>;
}

impl HasSelector for Deployment {
    fn get_selector(&self) -> Option<&LabelSelector> {
        self.spec.as_ref().map(|s| &s.selector)
    }
}

async fn get_match_labels<T>(
    client: &Client,
    name: &str,
    namespace: &str,
) -> kube::Result<Option<BTreeMap<String, String>>>
where
    T: k8s_openapi::Resource<Scope = k8s_openapi::NamespaceResourceScope>
        + k8s_openapi::Metadata<Ty = k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta>
        + HasSelector
        + serde::de::DeserializeOwned
        + serde::Serialize
        + Clone
        + Debug
        + Send
        + Sync,
{
    let api: Api<T> = Api::namespaced(client.clone(), namespace);
    let res = api.get(name).await?;
    Ok(res
        .get_selector()
        .and_then(|s| s.match_labels.clone())
        .filter(|labels| !labels.is_empty()))
}

/// Workload API of the selected context. The client is only built on first use,
/// so runs without deployment arguments never talk to the cluster.
pub struct ClusterWorkloads {
    kubeconfig: Kubeconfig,
    context: String,
    client: OnceCell<Client>,
}

impl ClusterWorkloads {
    pub fn new(kubeconfig: Kubeconfig, context: String) -> Self {
        Self {
            kubeconfig,
            context,
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&Client> {
        self.client
            .get_or_try_init(|| async {
                let config = kube::Config::from_custom_kubeconfig(
                    self.kubeconfig.clone(),
                    &KubeConfigOptions {
                        context: Some(self.context.clone()),
                        ..Default::default()
                    },
                )
                .await?;
                debug!("Connecting to cluster API for context {}", self.context);
                Ok::<_, Error>(Client::try_from(config)?)
            })
            .await
    }
}

impl SelectorLookup for ClusterWorkloads {
    async fn deployment_match_labels(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<BTreeMap<String, String>> {
        if namespace.is_empty() {
            return Err(Error::Resolution {
                kind: "deployment",
                name: name.to_string(),
                reason: "no namespace selected".to_string(),
            });
        }

        let client = self.client().await?;
        get_match_labels::<Deployment>(client, name, namespace)
            .await
            .map_err(|e| Error::Resolution {
                kind: "deployment",
                name: name.to_string(),
                reason: e.to_string(),
            })?
            .ok_or_else(|| Error::MissingSelector(name.to_string()))
    }
}
