//! Remote network provider capability
//!
//! The control plane exposes three resource surfaces (networks, subnets, pod
//! lifecycle). [`NetworkProvider`] is the logical client capability consumed
//! by the resolver and the plugin; [`grpc::GrpcNetworkProvider`] is the wire
//! implementation.

pub mod grpc;

use error_stack::Report;

use crate::error::ProviderError;

/// Generated protobuf types for the network provider wire protocol.
pub mod pb {
    tonic::include_proto!("networkprovider");
}

/// Client capability against the remote network control plane.
///
/// Each call maps to exactly one RPC; no retries happen at this layer.
/// Implementations must be safe to share across concurrently driven pods.
#[tonic::async_trait]
pub trait NetworkProvider: Send + Sync {
    /// Fetch a subnet descriptor by its ID.
    async fn get_subnet(&self, subnet_id: &str) -> Result<pb::Subnet, Report<ProviderError>>;

    /// Fetch a network descriptor by its ID.
    async fn get_network(&self, network_id: &str) -> Result<pb::Network, Report<ProviderError>>;

    /// Attach a pod to its network.
    async fn setup_pod(&self, request: pb::SetupPodRequest) -> Result<(), Report<ProviderError>>;

    /// Detach a pod from its network.
    async fn teardown_pod(
        &self,
        request: pb::TeardownPodRequest,
    ) -> Result<(), Report<ProviderError>>;

    /// Query the pod's network state; returns the raw IP string as reported
    /// by the provider, which may be empty.
    async fn pod_status(
        &self,
        request: pb::PodStatusRequest,
    ) -> Result<String, Report<ProviderError>>;
}
