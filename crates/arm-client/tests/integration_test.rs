//! Integration tests for the ARM client
//!
//! These tests require an Azure subscription.
//! Set ARM_ACCESS_TOKEN and ARM_SUBSCRIPTION_ID to run; ARM_ENDPOINT is optional.

use arm_client::{OpenShiftClient, OpenShiftClientTrait, DEFAULT_ENDPOINT};

fn client() -> OpenShiftClient {
    let endpoint = std::env::var("ARM_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
    let token = std::env::var("ARM_ACCESS_TOKEN")
        .expect("ARM_ACCESS_TOKEN environment variable must be set");
    OpenShiftClient::new(endpoint, token).expect("Failed to create client")
}

fn subscription() -> String {
    std::env::var("ARM_SUBSCRIPTION_ID").expect("ARM_SUBSCRIPTION_ID environment variable must be set")
}

#[tokio::test]
#[ignore] // Requires Azure credentials
async fn test_validate_access() {
    let client = client();
    let result = client.validate_access(&subscription()).await;
    assert!(result.is_ok(), "Failed to validate access: {:?}", result.err());
}

#[tokio::test]
#[ignore]
async fn test_list_clusters() {
    let client = client();
    let clusters = client.list_clusters(&subscription()).await
        .expect("Failed to list clusters");

    println!("Found {} OpenShift clusters", clusters.len());
    for cluster in clusters {
        assert!(cluster.id.is_some(), "listed cluster without an id");
    }
}

#[tokio::test]
#[ignore]
async fn test_get_missing_cluster_is_not_found() {
    let client = client();
    let id = format!(
        "/subscriptions/{}/resourceGroups/does-not-exist-rg/providers/Microsoft.ContainerService/openShiftManagedClusters/missing",
        subscription()
    );

    let err = client.get(&id).await.expect_err("cluster should not exist");
    assert!(err.is_not_found(), "unexpected error: {}", err);
}

#[tokio::test]
#[ignore]
async fn test_delete_missing_cluster_is_not_found() {
    let client = client();
    let id = format!(
        "/subscriptions/{}/resourceGroups/does-not-exist-rg/providers/Microsoft.ContainerService/openShiftManagedClusters/missing",
        subscription()
    );

    let err = client.begin_delete(&id).await.expect_err("delete of a missing cluster should fail");
    assert!(err.is_not_found(), "unexpected error: {}", err);
}
