//! Neutron network plugin
//!
//! The lifecycle adapter the orchestration host drives: set up a pod's
//! network after its infra container was created, tear it down before the
//! infra container is deleted, and report its network state on demand. A pod
//! without a managed network is a quiet success for all three hooks; the host
//! also runs unmanaged pods.

use std::collections::HashMap;
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use error_stack::Report;
use error_stack::ResultExt;
use once_cell::sync::OnceCell;
use plugin_api::ContainerId;
use plugin_api::Host;
use plugin_api::NetworkPlugin;
use plugin_api::PluginCapability;
use plugin_api::PluginError;
use plugin_api::PodNetworkStatus;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

use crate::provider::grpc::GrpcNetworkProvider;
use crate::provider::pb;
use crate::provider::NetworkProvider;
use crate::resolver::NetworkResolver;
use crate::resolver::PodNetwork;

/// Name under which the host's plugin registry finds this plugin.
pub const PLUGIN_NAME: &str = "neutron";

/// Network plugin backed by a remote neutron network provider.
///
/// Holds only the long-lived provider handle and the host handle acquired
/// during [`init`](NetworkPlugin::init); everything else is created fresh per
/// call, so distinct pods may be driven concurrently.
pub struct NeutronNetworkPlugin<P> {
    provider: P,
    host: OnceCell<Arc<dyn Host>>,
}

impl NeutronNetworkPlugin<GrpcNetworkProvider> {
    /// Construct a plugin connected to the network provider at `addr`
    /// (host:port).
    pub async fn connect(addr: &str) -> Result<Self, Report<PluginError>> {
        let provider = GrpcNetworkProvider::connect(addr)
            .await
            .change_context_lazy(|| PluginError::ConnectFailed {
                addr: addr.to_string(),
            })?;
        Ok(Self::new(provider))
    }
}

impl<P: NetworkProvider> NeutronNetworkPlugin<P> {
    /// Construct a plugin over an already established provider handle.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            host: OnceCell::new(),
        }
    }

    fn host(&self) -> Result<&dyn Host, Report<PluginError>> {
        self.host
            .get()
            .map(|host| host.as_ref())
            .ok_or_else(|| Report::new(PluginError::NotInitialized))
    }

    async fn resolve(&self, namespace: &str, name: &str) -> Result<PodNetwork, Report<PluginError>> {
        let host = self.host()?;
        NetworkResolver::new(host, &self.provider)
            .resolve(namespace, name)
            .await
            .change_context_lazy(|| PluginError::ResolutionFailed {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }
}

#[async_trait]
impl<P: NetworkProvider> NetworkPlugin for NeutronNetworkPlugin<P> {
    fn init(&self, host: Arc<dyn Host>) -> Result<(), Report<PluginError>> {
        self.host
            .set(host)
            .map_err(|_| Report::new(PluginError::AlreadyInitialized))
    }

    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    fn capabilities(&self) -> HashSet<PluginCapability> {
        HashSet::new()
    }

    async fn set_up_pod(
        &self,
        namespace: &str,
        name: &str,
        pod_infra_container_id: &ContainerId,
        container_runtime: &str,
    ) -> Result<(), Report<PluginError>> {
        let (network, subnet_id) = match self.resolve(namespace, name).await? {
            PodNetwork::Managed { network, subnet_id } => (network, subnet_id),
            PodNetwork::Unmanaged => {
                debug!(
                    namespace = %namespace,
                    pod_name = %name,
                    "pod has no managed network, nothing to set up"
                );
                return Ok(());
            }
        };

        self.provider
            .setup_pod(pb::SetupPodRequest {
                pod_name: name.to_string(),
                namespace: namespace.to_string(),
                pod_infra_container_id: pod_infra_container_id.as_str().to_string(),
                container_runtime: container_runtime.to_string(),
                network: Some(network),
                subnet_id,
            })
            .await
            .inspect_err(|report| {
                warn!(
                    namespace = %namespace,
                    pod_name = %name,
                    "SetupPod failed: {report:?}"
                );
            })
            .change_context_lazy(|| PluginError::RemoteOperationFailed {
                operation: "SetupPod".to_string(),
            })
    }

    async fn tear_down_pod(
        &self,
        namespace: &str,
        name: &str,
        pod_infra_container_id: &ContainerId,
        container_runtime: &str,
    ) -> Result<(), Report<PluginError>> {
        let network = match self.resolve(namespace, name).await? {
            PodNetwork::Managed { network, .. } => network,
            PodNetwork::Unmanaged => {
                debug!(
                    namespace = %namespace,
                    pod_name = %name,
                    "pod has no managed network, nothing to tear down"
                );
                return Ok(());
            }
        };

        self.provider
            .teardown_pod(pb::TeardownPodRequest {
                pod_name: name.to_string(),
                namespace: namespace.to_string(),
                pod_infra_container_id: pod_infra_container_id.as_str().to_string(),
                container_runtime: container_runtime.to_string(),
                network: Some(network),
            })
            .await
            .inspect_err(|report| {
                warn!(
                    namespace = %namespace,
                    pod_name = %name,
                    "TeardownPod failed: {report:?}"
                );
            })
            .change_context_lazy(|| PluginError::RemoteOperationFailed {
                operation: "TeardownPod".to_string(),
            })
    }

    async fn pod_network_status(
        &self,
        namespace: &str,
        name: &str,
        pod_infra_container_id: &ContainerId,
        container_runtime: &str,
    ) -> Result<Option<PodNetworkStatus>, Report<PluginError>> {
        let network = match self.resolve(namespace, name).await? {
            PodNetwork::Managed { network, .. } => network,
            PodNetwork::Unmanaged => {
                debug!(
                    namespace = %namespace,
                    pod_name = %name,
                    "pod has no managed network, no status to report"
                );
                return Ok(None);
            }
        };

        let ip = self
            .provider
            .pod_status(pb::PodStatusRequest {
                pod_name: name.to_string(),
                namespace: namespace.to_string(),
                pod_infra_container_id: pod_infra_container_id.as_str().to_string(),
                container_runtime: container_runtime.to_string(),
                network: Some(network),
            })
            .await
            .inspect_err(|report| {
                warn!(
                    namespace = %namespace,
                    pod_name = %name,
                    "PodStatus failed: {report:?}"
                );
            })
            .change_context_lazy(|| PluginError::RemoteOperationFailed {
                operation: "PodStatus".to_string(),
            })?;

        // An empty or unparsable IP string means "no address yet", not an
        // error; callers must tolerate an unset IP.
        Ok(Some(PodNetworkStatus {
            ip: ip.parse::<IpAddr>().ok(),
        }))
    }

    fn status(&self) -> Result<(), Report<PluginError>> {
        Ok(())
    }

    fn event(&self, name: &str, details: HashMap<String, Value>) {
        debug!(event = %name, ?details, "ignoring host event");
    }
}
