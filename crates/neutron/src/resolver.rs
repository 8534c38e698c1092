//! Pod-to-network resolution
//!
//! A pod declares its subnet through a single annotation; resolution chains
//! two provider lookups (subnet, then owning network) into a fully resolved
//! descriptor. Nothing is cached: every lifecycle call resolves from the
//! pod's current annotation state.

use error_stack::Report;
use error_stack::ResultExt;
use plugin_api::Host;
use tracing::debug;

use crate::error::ResolutionError;
use crate::provider::pb;
use crate::provider::NetworkProvider;

/// Annotation key carrying the ID of the subnet a pod is attached to.
pub const SUBNET_ID_ANNOTATION: &str = "nephele/subnetID";

/// Outcome of resolving a pod's network.
///
/// A pod without the subnet annotation is a legitimate, unmanaged pod; the
/// distinction from a resolution failure matters to callers, so it is a
/// variant rather than an error.
#[derive(Debug, Clone, PartialEq)]
pub enum PodNetwork {
    /// The pod belongs to a managed network.
    Managed {
        network: pb::Network,
        subnet_id: String,
    },
    /// The pod has no subnet annotation and therefore no managed network.
    Unmanaged,
}

/// Per-call resolver borrowing the host and provider handles.
pub struct NetworkResolver<'a, P> {
    host: &'a dyn Host,
    provider: &'a P,
}

impl<'a, P: NetworkProvider> NetworkResolver<'a, P> {
    pub fn new(host: &'a dyn Host, provider: &'a P) -> Self {
        Self { host, provider }
    }

    /// Resolve the network of the pod `name` in `namespace`.
    ///
    /// Each remote call is attempted exactly once; any lookup failure aborts
    /// the resolution.
    pub async fn resolve(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<PodNetwork, Report<ResolutionError>> {
        let annotations = self
            .host
            .pod_annotations(namespace, name)
            .await
            .change_context_lazy(|| ResolutionError::PodLookupFailed {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })?;

        let Some(subnet_id) = annotations.get(SUBNET_ID_ANNOTATION) else {
            debug!(
                namespace = %namespace,
                pod_name = %name,
                "no subnet associated with pod"
            );
            return Ok(PodNetwork::Unmanaged);
        };

        let subnet = self.provider.get_subnet(subnet_id).await.change_context_lazy(|| {
            ResolutionError::SubnetLookupFailed {
                subnet_id: subnet_id.clone(),
            }
        })?;

        let network = self
            .provider
            .get_network(&subnet.network_id)
            .await
            .change_context_lazy(|| ResolutionError::NetworkLookupFailed {
                network_id: subnet.network_id.clone(),
            })?;

        Ok(PodNetwork::Managed {
            network,
            subnet_id: subnet_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;
    use test_log::test;

    use super::*;
    use crate::mock::MockHost;
    use crate::mock::MockProvider;

    fn managed_fixture() -> (MockHost, MockProvider) {
        let host = MockHost::new();
        host.insert_pod_with_subnet("default", "web-1", "sub-42");

        let provider = MockProvider::new();
        provider.insert_subnet("sub-42", "net-7");
        provider.insert_network("net-7", "tenant-a");

        (host, provider)
    }

    #[test(tokio::test)]
    async fn resolves_managed_pod() {
        let (host, provider) = managed_fixture();

        let resolved = NetworkResolver::new(&host, &provider)
            .resolve("default", "web-1")
            .await
            .unwrap();

        let PodNetwork::Managed { network, subnet_id } = resolved else {
            panic!("expected a managed network");
        };
        assert_eq!(subnet_id, "sub-42");
        assert_eq!(network.id, "net-7");
        assert_eq!(network.tenant_id, "tenant-a");
    }

    #[test(tokio::test)]
    async fn missing_annotation_is_unmanaged() {
        let host = MockHost::new();
        host.insert_pod("default", "web-1", Default::default());
        let provider = MockProvider::new();

        let resolved = NetworkResolver::new(&host, &provider)
            .resolve("default", "web-1")
            .await
            .unwrap();

        assert_eq!(resolved, PodNetwork::Unmanaged);
    }

    #[test(tokio::test)]
    async fn pod_lookup_failure_is_classified() {
        let host = MockHost::new();
        host.set_error_mode(true);
        let provider = MockProvider::new();

        let report = NetworkResolver::new(&host, &provider)
            .resolve("default", "web-1")
            .await
            .unwrap_err();

        assert!(matches!(
            report.current_context(),
            ResolutionError::PodLookupFailed { .. }
        ));
    }

    #[test(tokio::test)]
    async fn subnet_lookup_failure_is_classified() {
        let host = MockHost::new();
        host.insert_pod_with_subnet("default", "web-1", "sub-42");
        // subnet is not known to the provider
        let provider = MockProvider::new();

        let report = NetworkResolver::new(&host, &provider)
            .resolve("default", "web-1")
            .await
            .unwrap_err();

        assert!(matches!(
            report.current_context(),
            ResolutionError::SubnetLookupFailed { subnet_id } if subnet_id == "sub-42"
        ));
    }

    #[test(tokio::test)]
    async fn network_lookup_failure_is_classified() {
        let host = MockHost::new();
        host.insert_pod_with_subnet("default", "web-1", "sub-42");
        let provider = MockProvider::new();
        provider.insert_subnet("sub-42", "net-7");
        // owning network is not known to the provider

        let report = NetworkResolver::new(&host, &provider)
            .resolve("default", "web-1")
            .await
            .unwrap_err();

        assert!(matches!(
            report.current_context(),
            ResolutionError::NetworkLookupFailed { network_id } if network_id == "net-7"
        ));
    }
}
