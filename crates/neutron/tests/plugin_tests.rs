//! End-to-end lifecycle behavior against recording fakes

use std::sync::Arc;

use neutron::mock::MockHost;
use neutron::mock::MockProvider;
use neutron::provider::pb;
use neutron::NeutronNetworkPlugin;
use plugin_api::ContainerId;
use plugin_api::NetworkPlugin;
use plugin_api::PodNetworkStatus;
use similar_asserts::assert_eq;
use test_log::test;

fn infra() -> ContainerId {
    ContainerId::new("infra-123")
}

fn plugin_with(host: &MockHost, provider: &MockProvider) -> NeutronNetworkPlugin<MockProvider> {
    let plugin = NeutronNetworkPlugin::new(provider.clone());
    plugin.init(Arc::new(host.clone())).unwrap();
    plugin
}

/// Pod "web-1" annotated with sub-42, which belongs to net-7 of tenant-a.
fn resolvable_world() -> (MockHost, MockProvider) {
    let host = MockHost::new();
    host.insert_pod_with_subnet("default", "web-1", "sub-42");

    let provider = MockProvider::new();
    provider.insert_subnet("sub-42", "net-7");
    provider.insert_network("net-7", "tenant-a");

    (host, provider)
}

#[test(tokio::test)]
async fn unannotated_pod_is_a_quiet_success_for_all_hooks() {
    let host = MockHost::new();
    host.insert_pod("default", "batch-1", Default::default());
    let provider = MockProvider::new();
    let plugin = plugin_with(&host, &provider);

    plugin
        .set_up_pod("default", "batch-1", &infra(), "docker")
        .await
        .unwrap();
    plugin
        .tear_down_pod("default", "batch-1", &infra(), "docker")
        .await
        .unwrap();
    let status = plugin
        .pod_network_status("default", "batch-1", &infra(), "docker")
        .await
        .unwrap();

    assert_eq!(status, None);
    assert_eq!(provider.lifecycle_call_count(), 0);
}

#[test(tokio::test)]
async fn subnet_lookup_failure_aborts_all_hooks_before_any_lifecycle_call() {
    let host = MockHost::new();
    host.insert_pod_with_subnet("default", "web-1", "sub-42");
    // provider knows nothing about sub-42
    let provider = MockProvider::new();
    let plugin = plugin_with(&host, &provider);

    assert!(plugin
        .set_up_pod("default", "web-1", &infra(), "docker")
        .await
        .is_err());
    assert!(plugin
        .tear_down_pod("default", "web-1", &infra(), "docker")
        .await
        .is_err());
    assert!(plugin
        .pod_network_status("default", "web-1", &infra(), "docker")
        .await
        .is_err());

    assert_eq!(provider.lifecycle_call_count(), 0);
}

#[test(tokio::test)]
async fn setup_issues_one_call_with_resolved_network_and_subnet() {
    let (host, provider) = resolvable_world();
    let plugin = plugin_with(&host, &provider);

    plugin
        .set_up_pod("default", "web-1", &infra(), "docker")
        .await
        .unwrap();

    assert_eq!(
        provider.setup_calls(),
        vec![pb::SetupPodRequest {
            pod_name: "web-1".to_string(),
            namespace: "default".to_string(),
            pod_infra_container_id: "infra-123".to_string(),
            container_runtime: "docker".to_string(),
            network: Some(pb::Network {
                id: "net-7".to_string(),
                tenant_id: "tenant-a".to_string(),
                ..Default::default()
            }),
            subnet_id: "sub-42".to_string(),
        }]
    );
    assert_eq!(provider.teardown_calls().len(), 0);
}

#[test(tokio::test)]
async fn teardown_issues_one_call_without_subnet() {
    let (host, provider) = resolvable_world();
    let plugin = plugin_with(&host, &provider);

    plugin
        .tear_down_pod("default", "web-1", &infra(), "docker")
        .await
        .unwrap();

    assert_eq!(
        provider.teardown_calls(),
        vec![pb::TeardownPodRequest {
            pod_name: "web-1".to_string(),
            namespace: "default".to_string(),
            pod_infra_container_id: "infra-123".to_string(),
            container_runtime: "docker".to_string(),
            network: Some(pb::Network {
                id: "net-7".to_string(),
                tenant_id: "tenant-a".to_string(),
                ..Default::default()
            }),
        }]
    );
    assert_eq!(provider.setup_calls().len(), 0);
}

#[test(tokio::test)]
async fn status_reports_unset_ip_when_provider_returns_empty_string() {
    let (host, provider) = resolvable_world();
    let plugin = plugin_with(&host, &provider);

    let status = plugin
        .pod_network_status("default", "web-1", &infra(), "docker")
        .await
        .unwrap();

    assert_eq!(status, Some(PodNetworkStatus { ip: None }));
    assert_eq!(provider.status_calls().len(), 1);
}

#[test(tokio::test)]
async fn failed_call_does_not_poison_the_next_one() {
    let host = MockHost::new();
    host.insert_pod_with_subnet("default", "web-1", "sub-42");
    host.insert_pod("default", "batch-1", Default::default());
    // sub-42 resolution will fail, batch-1 has no managed network
    let provider = MockProvider::new();
    let plugin = plugin_with(&host, &provider);

    assert!(plugin
        .set_up_pod("default", "web-1", &infra(), "docker")
        .await
        .is_err());
    plugin
        .set_up_pod("default", "batch-1", &infra(), "docker")
        .await
        .unwrap();
}
