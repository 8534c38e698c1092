//! Test adapters implementing the dependency injection traits
//!
//! Recording fakes for the [`Host`] and [`NetworkProvider`] capabilities,
//! used by the unit and integration tests in this crate. State lives behind
//! `Arc<Mutex<...>>`, so a clone kept by a test observes the calls made
//! through the clone handed to the plugin.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use error_stack::Report;
use plugin_api::Host;
use plugin_api::HostError;

use crate::error::ProviderError;
use crate::provider::pb;
use crate::provider::NetworkProvider;
use crate::resolver::SUBNET_ID_ANNOTATION;

/// Mock host serving pod annotation maps from memory.
#[derive(Clone, Default)]
pub struct MockHost {
    pods: Arc<Mutex<HashMap<(String, String), BTreeMap<String, String>>>>,
    error_mode: Arc<Mutex<bool>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pod with the given annotation map.
    pub fn insert_pod(&self, namespace: &str, name: &str, annotations: BTreeMap<String, String>) {
        let mut pods = self.pods.lock().unwrap();
        pods.insert((namespace.to_string(), name.to_string()), annotations);
    }

    /// Register a pod carrying only the subnet annotation.
    pub fn insert_pod_with_subnet(&self, namespace: &str, name: &str, subnet_id: &str) {
        let mut annotations = BTreeMap::new();
        annotations.insert(SUBNET_ID_ANNOTATION.to_string(), subnet_id.to_string());
        self.insert_pod(namespace, name, annotations);
    }

    /// Make every metadata lookup fail, regardless of registered pods.
    pub fn set_error_mode(&self, enabled: bool) {
        let mut error_mode = self.error_mode.lock().unwrap();
        *error_mode = enabled;
    }
}

#[async_trait::async_trait]
impl Host for MockHost {
    async fn pod_annotations(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<BTreeMap<String, String>, Report<HostError>> {
        let lookup_failed = || {
            Report::new(HostError::PodLookupFailed {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
        };

        if *self.error_mode.lock().unwrap() {
            return Err(lookup_failed());
        }

        let pods = self.pods.lock().unwrap();
        pods.get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(lookup_failed)
    }
}

/// Mock network provider with in-memory subnet/network tables and recorded
/// pod-lifecycle calls.
#[derive(Clone, Default)]
pub struct MockProvider {
    subnets: Arc<Mutex<HashMap<String, pb::Subnet>>>,
    networks: Arc<Mutex<HashMap<String, pb::Network>>>,
    status_ip: Arc<Mutex<String>>,
    lifecycle_failure: Arc<Mutex<Option<ProviderError>>>,
    setup_calls: Arc<Mutex<Vec<pb::SetupPodRequest>>>,
    teardown_calls: Arc<Mutex<Vec<pb::TeardownPodRequest>>>,
    status_calls: Arc<Mutex<Vec<pb::PodStatusRequest>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_subnet(&self, id: &str, network_id: &str) {
        let mut subnets = self.subnets.lock().unwrap();
        subnets.insert(
            id.to_string(),
            pb::Subnet {
                id: id.to_string(),
                network_id: network_id.to_string(),
            },
        );
    }

    pub fn insert_network(&self, id: &str, tenant_id: &str) {
        let mut networks = self.networks.lock().unwrap();
        networks.insert(
            id.to_string(),
            pb::Network {
                id: id.to_string(),
                tenant_id: tenant_id.to_string(),
                ..Default::default()
            },
        );
    }

    /// Set the IP string returned by `PodStatus` calls.
    pub fn set_status_ip(&self, ip: &str) {
        let mut status_ip = self.status_ip.lock().unwrap();
        *status_ip = ip.to_string();
    }

    /// Make every pod-lifecycle call fail with the given error.
    pub fn fail_lifecycle_calls(&self, error: ProviderError) {
        let mut failure = self.lifecycle_failure.lock().unwrap();
        *failure = Some(error);
    }

    pub fn setup_calls(&self) -> Vec<pb::SetupPodRequest> {
        self.setup_calls.lock().unwrap().clone()
    }

    pub fn teardown_calls(&self) -> Vec<pb::TeardownPodRequest> {
        self.teardown_calls.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> Vec<pb::PodStatusRequest> {
        self.status_calls.lock().unwrap().clone()
    }

    /// Total number of pod-lifecycle calls issued against this provider.
    pub fn lifecycle_call_count(&self) -> usize {
        self.setup_calls().len() + self.teardown_calls().len() + self.status_calls().len()
    }

    fn lifecycle_result(&self) -> Result<(), Report<ProviderError>> {
        match self.lifecycle_failure.lock().unwrap().as_ref() {
            Some(error) => Err(Report::new(error.clone())),
            None => Ok(()),
        }
    }
}

#[tonic::async_trait]
impl NetworkProvider for MockProvider {
    async fn get_subnet(&self, subnet_id: &str) -> Result<pb::Subnet, Report<ProviderError>> {
        let subnets = self.subnets.lock().unwrap();
        subnets.get(subnet_id).cloned().ok_or_else(|| {
            Report::new(ProviderError::Transport {
                message: format!("unknown subnet {subnet_id}"),
            })
        })
    }

    async fn get_network(&self, network_id: &str) -> Result<pb::Network, Report<ProviderError>> {
        let networks = self.networks.lock().unwrap();
        networks.get(network_id).cloned().ok_or_else(|| {
            Report::new(ProviderError::Transport {
                message: format!("unknown network {network_id}"),
            })
        })
    }

    async fn setup_pod(&self, request: pb::SetupPodRequest) -> Result<(), Report<ProviderError>> {
        self.setup_calls.lock().unwrap().push(request);
        self.lifecycle_result()
    }

    async fn teardown_pod(
        &self,
        request: pb::TeardownPodRequest,
    ) -> Result<(), Report<ProviderError>> {
        self.teardown_calls.lock().unwrap().push(request);
        self.lifecycle_result()
    }

    async fn pod_status(
        &self,
        request: pb::PodStatusRequest,
    ) -> Result<String, Report<ProviderError>> {
        self.status_calls.lock().unwrap().push(request);
        self.lifecycle_result()?;
        Ok(self.status_ip.lock().unwrap().clone())
    }
}
