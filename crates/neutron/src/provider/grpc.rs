use error_stack::Report;
use error_stack::ResultExt;
use tonic::transport::Channel;
use tonic::transport::Endpoint;
use tonic::Request;
use tracing::info;

use crate::error::ProviderError;
use crate::provider::pb;
use crate::provider::pb::networks_client::NetworksClient;
use crate::provider::pb::pods_client::PodsClient;
use crate::provider::pb::subnets_client::SubnetsClient;
use crate::provider::NetworkProvider;

/// gRPC-backed [`NetworkProvider`] over a single shared channel.
///
/// The three generated clients are cloned per call; cloning a tonic client is
/// cheap and the underlying channel multiplexes concurrent requests.
#[derive(Debug, Clone)]
pub struct GrpcNetworkProvider {
    pods: PodsClient<Channel>,
    networks: NetworksClient<Channel>,
    subnets: SubnetsClient<Channel>,
}

impl GrpcNetworkProvider {
    /// Connect to the network provider at `addr` (host:port).
    pub async fn connect(addr: &str) -> Result<Self, Report<ProviderError>> {
        info!("connecting to network provider at {}", addr);

        let endpoint = Endpoint::from_shared(format!("http://{addr}")).change_context_lazy(|| {
            ProviderError::Transport {
                message: format!("invalid network provider address: {addr}"),
            }
        })?;
        let channel = endpoint
            .connect()
            .await
            .change_context_lazy(|| ProviderError::Transport {
                message: format!("failed to connect to network provider at {addr}"),
            })?;

        Ok(Self {
            pods: PodsClient::new(channel.clone()),
            networks: NetworksClient::new(channel.clone()),
            subnets: SubnetsClient::new(channel),
        })
    }
}

/// Map a non-empty application error field to a failure, so callers only ever
/// see one result shape for a remote call.
fn ensure_ok(error: &str) -> Result<(), Report<ProviderError>> {
    if error.is_empty() {
        Ok(())
    } else {
        Err(Report::new(ProviderError::Operation {
            message: error.to_string(),
        }))
    }
}

fn transport(operation: &str) -> ProviderError {
    ProviderError::Transport {
        message: format!("{operation} call failed"),
    }
}

#[tonic::async_trait]
impl NetworkProvider for GrpcNetworkProvider {
    async fn get_subnet(&self, subnet_id: &str) -> Result<pb::Subnet, Report<ProviderError>> {
        let mut client = self.subnets.clone();
        let response = client
            .get_subnet(Request::new(pb::GetSubnetRequest {
                subnet_id: subnet_id.to_string(),
            }))
            .await
            .change_context_lazy(|| transport("GetSubnet"))?
            .into_inner();
        ensure_ok(&response.error)?;

        response.subnet.ok_or_else(|| {
            Report::new(ProviderError::Operation {
                message: format!("provider returned no subnet for {subnet_id}"),
            })
        })
    }

    async fn get_network(&self, network_id: &str) -> Result<pb::Network, Report<ProviderError>> {
        let mut client = self.networks.clone();
        let response = client
            .get_network(Request::new(pb::GetNetworkRequest {
                id: network_id.to_string(),
            }))
            .await
            .change_context_lazy(|| transport("GetNetwork"))?
            .into_inner();
        ensure_ok(&response.error)?;

        response.network.ok_or_else(|| {
            Report::new(ProviderError::Operation {
                message: format!("provider returned no network for {network_id}"),
            })
        })
    }

    async fn setup_pod(&self, request: pb::SetupPodRequest) -> Result<(), Report<ProviderError>> {
        let mut client = self.pods.clone();
        let response = client
            .setup_pod(Request::new(request))
            .await
            .change_context_lazy(|| transport("SetupPod"))?
            .into_inner();
        ensure_ok(&response.error)
    }

    async fn teardown_pod(
        &self,
        request: pb::TeardownPodRequest,
    ) -> Result<(), Report<ProviderError>> {
        let mut client = self.pods.clone();
        let response = client
            .teardown_pod(Request::new(request))
            .await
            .change_context_lazy(|| transport("TeardownPod"))?
            .into_inner();
        ensure_ok(&response.error)
    }

    async fn pod_status(
        &self,
        request: pb::PodStatusRequest,
    ) -> Result<String, Report<ProviderError>> {
        let mut client = self.pods.clone();
        let response = client
            .pod_status(Request::new(request))
            .await
            .change_context_lazy(|| transport("PodStatus"))?
            .into_inner();
        ensure_ok(&response.error)?;

        Ok(response.ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_ok_empty_error_is_success() {
        assert!(ensure_ok("").is_ok());
    }

    #[test]
    fn ensure_ok_message_becomes_operation_failure() {
        let report = ensure_ok("port allocation failed").unwrap_err();
        assert!(matches!(
            report.current_context(),
            ProviderError::Operation { message } if message == "port allocation failed"
        ));
    }
}
