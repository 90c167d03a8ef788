//! ARM client
//!
//! REST client for `Microsoft.ContainerService/openShiftManagedClusters`.
//! Mutations return as soon as ARM accepts them; progress is read from the
//! `Azure-AsyncOperation` or `Location` link carried in the returned handle.

use crate::common::{operation_handle, HttpClient, Precondition};
use crate::error::ArmError;
use crate::models::*;
use crate::openshift_trait::OpenShiftClientTrait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Default ARM endpoint (Azure public cloud)
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

#[derive(Debug, Deserialize)]
struct ClusterList {
    #[serde(default)]
    value: Vec<OpenShiftManagedCluster>,
}

/// ARM API client for OpenShift managed clusters
pub struct OpenShiftClient {
    http: HttpClient,
}

impl OpenShiftClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `endpoint` - ARM base URL (e.g., "https://management.azure.com")
    /// * `token` - Bearer token for the management audience
    pub fn new(endpoint: String, token: String) -> Result<Self, ArmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(ArmError::Http)?;

        Ok(Self {
            http: HttpClient::new(client, endpoint, token),
        })
    }

    /// List the clusters visible in a subscription
    pub async fn list_clusters(&self, subscription_id: &str) -> Result<Vec<OpenShiftManagedCluster>, ArmError> {
        let path = format!(
            "/subscriptions/{}/providers/{}/{}",
            subscription_id, PROVIDER_NAMESPACE, RESOURCE_TYPE
        );
        let list: ClusterList = self.http.get(&path).await?;
        Ok(list.value)
    }

    /// Validate the token and subscription access with a lightweight list call.
    ///
    /// # Returns
    /// * `Ok(())` - Token is valid and the subscription is reachable
    /// * `Err(ArmError)` - Token is invalid, expired, or lacks access
    pub async fn validate_access(&self, subscription_id: &str) -> Result<(), ArmError> {
        debug!("Validating ARM token for subscription {}", subscription_id);
        let clusters = self.list_clusters(subscription_id).await?;
        debug!("Subscription {} has {} OpenShift clusters", subscription_id, clusters.len());
        Ok(())
    }

    async fn put_cluster(
        &self,
        kind: OperationKind,
        resource_id: &str,
        cluster: &OpenShiftManagedCluster,
        precondition: Precondition,
    ) -> Result<OperationHandle, ArmError> {
        let body = serde_json::to_value(cluster)?;
        let response = self.http.put(resource_id, &body, precondition).await?;
        let handle = operation_handle(kind, resource_id, response.headers());
        info!(
            "ARM accepted {} of {} (status {}, async: {})",
            kind,
            resource_id,
            response.status(),
            !handle.is_completed()
        );
        Ok(handle)
    }
}

#[async_trait::async_trait]
impl OpenShiftClientTrait for OpenShiftClient {
    fn endpoint(&self) -> &str {
        self.http.base_url()
    }

    async fn get(&self, resource_id: &str) -> Result<OpenShiftManagedCluster, ArmError> {
        self.http.get(resource_id).await
    }

    async fn begin_create(
        &self,
        resource_id: &str,
        cluster: &OpenShiftManagedCluster,
    ) -> Result<OperationHandle, ArmError> {
        self.put_cluster(OperationKind::Create, resource_id, cluster, Precondition::IfNoneMatchAny)
            .await
    }

    async fn begin_update(
        &self,
        resource_id: &str,
        cluster: &OpenShiftManagedCluster,
    ) -> Result<OperationHandle, ArmError> {
        self.put_cluster(OperationKind::Update, resource_id, cluster, Precondition::IfMatchAny)
            .await
    }

    async fn begin_delete(&self, resource_id: &str) -> Result<OperationHandle, ArmError> {
        let response = self.http.delete(resource_id).await?;
        // ARM answers 204 when there was nothing to delete
        if response.status() == StatusCode::NO_CONTENT {
            return Err(ArmError::NotFound(format!("Resource not found: {}", resource_id)));
        }
        let handle = operation_handle(OperationKind::Delete, resource_id, response.headers());
        info!("ARM accepted delete of {} (status {})", resource_id, response.status());
        Ok(handle)
    }

    async fn poll_operation(&self, handle: &OperationHandle) -> Result<OperationStatus, ArmError> {
        let Some(url) = handle.status_url.as_deref() else {
            return Ok(OperationStatus::Succeeded);
        };

        let response = self.http.get_operation(url).await?;
        match handle.poll_mode {
            PollMode::AsyncOperation => {
                let text = response.text().await?;
                let body: AsyncOperationBody = serde_json::from_str(&text)?;
                Ok(body.to_status())
            }
            PollMode::Location => {
                if response.status() == StatusCode::ACCEPTED {
                    Ok(OperationStatus::Pending)
                } else {
                    Ok(OperationStatus::Succeeded)
                }
            }
        }
    }
}
