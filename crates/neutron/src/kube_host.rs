//! Kubernetes-backed implementation of the host contract

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use error_stack::Report;
use error_stack::ResultExt;
use k8s_openapi::api::core::v1::Pod;
use kube::config::KubeConfigOptions;
use kube::config::Kubeconfig;
use kube::Api;
use kube::Client;
use kube::Config;
use plugin_api::Host;
use plugin_api::HostError;

/// [`Host`] implementation reading pod metadata from the Kubernetes API
/// server. Every lookup is a live API query; pod state is never cached here.
pub struct KubeHost {
    client: Client,
}

impl KubeHost {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a host from an optional kubeconfig path; without one the default
    /// configuration (in-cluster or ~/.kube/config) is used.
    pub async fn init(kubeconfig: Option<PathBuf>) -> Result<Self, Report<HostError>> {
        Ok(Self::new(init_kube_client(kubeconfig).await?))
    }
}

#[async_trait]
impl Host for KubeHost {
    async fn pod_annotations(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<BTreeMap<String, String>, Report<HostError>> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pod = api
            .get(name)
            .await
            .change_context_lazy(|| HostError::PodLookupFailed {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })?;

        Ok(pod.metadata.annotations.unwrap_or_default())
    }
}

pub async fn init_kube_client(kubeconfig: Option<PathBuf>) -> Result<Client, Report<HostError>> {
    let client = match kubeconfig {
        Some(kubeconfig_path) => {
            // Load kubeconfig from the specified file
            let kubeconfig = Kubeconfig::read_from(&kubeconfig_path).change_context(
                HostError::ConnectionFailed {
                    message: format!(
                        "Failed to read kubeconfig file: {}",
                        kubeconfig_path.display()
                    ),
                },
            )?;

            let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .change_context(HostError::ConnectionFailed {
                    message: format!(
                        "Failed to create config from kubeconfig: {}",
                        kubeconfig_path.display()
                    ),
                })?;

            Client::try_from(config).change_context(HostError::ConnectionFailed {
                message: "Failed to create Kubernetes client from custom kubeconfig".to_string(),
            })?
        }
        None => {
            // Use default configuration (in-cluster or ~/.kube/config)
            Client::try_default()
                .await
                .change_context(HostError::ConnectionFailed {
                    message: "Failed to create Kubernetes client".to_string(),
                })?
        }
    };
    Ok(client)
}
