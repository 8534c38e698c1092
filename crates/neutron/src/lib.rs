//! Network plugin driving a remote neutron network provider
//!
//! Pods declare their subnet through the `nephele/subnetID` annotation; this
//! crate resolves that annotation into a network descriptor against the
//! provider's control plane and translates the host's pod lifecycle hooks
//! (setup, teardown, status) into provider RPCs.

pub mod error;
pub mod kube_host;
pub mod mock;
pub mod plugin;
pub mod provider;
pub mod resolver;

pub use plugin::NeutronNetworkPlugin;
pub use plugin::PLUGIN_NAME;
pub use provider::grpc::GrpcNetworkProvider;
pub use provider::NetworkProvider;
pub use resolver::PodNetwork;
pub use resolver::SUBNET_ID_ANNOTATION;
