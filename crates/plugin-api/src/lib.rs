//! Host-facing contract for pod network plugins
//!
//! This crate defines the capability set an orchestration host consumes from a
//! network plugin (lifecycle hooks around a pod's infra container) and the
//! capability a plugin consumes back from the host (pod metadata access).
//! Implementations live in their own crates; the host only depends on these
//! traits and value types.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use error_stack::Report;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Identifier of a pod's infra container, as handed over by the host's
/// container runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Network state of a pod as reported by the status query.
///
/// `ip` is `None` when the provider reported no address or an address that
/// does not parse; callers must tolerate an unset IP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodNetworkStatus {
    /// IP address assigned to the pod, if any
    pub ip: Option<IpAddr>,
}

/// Optional plugin features negotiated with the host.
///
/// Currently empty; reserved for future feature negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PluginCapability {}

/// Errors that can occur on the host side of the contract.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Failed to connect to the orchestration host API: {message}")]
    ConnectionFailed { message: String },
    #[error("Failed to look up pod {name} in namespace {namespace}")]
    PodLookupFailed { namespace: String, name: String },
}

/// Errors a plugin surfaces to the host.
///
/// Lower-level causes (resolution, remote provider calls) are attached as
/// context frames on the report; the host only has to match on these.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Plugin has already been initialized")]
    AlreadyInitialized,
    #[error("Plugin has not been initialized")]
    NotInitialized,
    #[error("Failed to connect to network provider at {addr}")]
    ConnectFailed { addr: String },
    #[error("Failed to resolve network of pod {name} in namespace {namespace}")]
    ResolutionFailed { namespace: String, name: String },
    #[error("Network provider {operation} call failed")]
    RemoteOperationFailed { operation: String },
}

/// Host services a plugin may call back into.
///
/// The host hands a plugin an instance of this during [`NetworkPlugin::init`];
/// it must be safe to share across concurrently driven pods.
#[async_trait]
pub trait Host: Send + Sync {
    /// Fetch the annotation map of a pod by namespace and name.
    async fn pod_annotations(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<BTreeMap<String, String>, Report<HostError>>;
}

/// The lifecycle capability set a network plugin exposes to the host.
///
/// The host calls [`set_up_pod`](NetworkPlugin::set_up_pod) after a pod's
/// infra container has been created, [`tear_down_pod`](NetworkPlugin::tear_down_pod)
/// before it is deleted, and [`pod_network_status`](NetworkPlugin::pod_network_status)
/// on demand. Calls for distinct pods may be issued concurrently.
#[async_trait]
pub trait NetworkPlugin: Send + Sync {
    /// Store the host handle. Called exactly once before any other method;
    /// a second call is an error.
    fn init(&self, host: Arc<dyn Host>) -> Result<(), Report<PluginError>>;

    /// Constant identifier used by the host's plugin registry.
    fn name(&self) -> &'static str;

    /// Optional features this plugin supports.
    fn capabilities(&self) -> HashSet<PluginCapability>;

    /// Attach the pod to its network after the infra container was created.
    async fn set_up_pod(
        &self,
        namespace: &str,
        name: &str,
        pod_infra_container_id: &ContainerId,
        container_runtime: &str,
    ) -> Result<(), Report<PluginError>>;

    /// Detach the pod from its network before the infra container is deleted.
    async fn tear_down_pod(
        &self,
        namespace: &str,
        name: &str,
        pod_infra_container_id: &ContainerId,
        container_runtime: &str,
    ) -> Result<(), Report<PluginError>>;

    /// Report the pod's network state. `Ok(None)` means the pod has no
    /// managed network.
    async fn pod_network_status(
        &self,
        namespace: &str,
        name: &str,
        pod_infra_container_id: &ContainerId,
        container_runtime: &str,
    ) -> Result<Option<PodNetworkStatus>, Report<PluginError>>;

    /// Readiness of the plugin itself.
    fn status(&self) -> Result<(), Report<PluginError>>;

    /// Sink for lifecycle notifications emitted by the host.
    fn event(&self, name: &str, details: HashMap<String, Value>);
}
