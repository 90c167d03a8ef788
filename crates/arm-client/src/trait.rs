//! Trait for the OpenShift managed cluster API to enable mocking in tests

use crate::error::ArmError;
use crate::models::*;

/// Operations on `Microsoft.ContainerService/openShiftManagedClusters`
///
/// Mutations only start a long-running operation; callers drive it to a
/// terminal state with [`OpenShiftClientTrait::poll_operation`].
#[async_trait::async_trait]
pub trait OpenShiftClientTrait: Send + Sync {
    /// Base URL of the ARM endpoint
    fn endpoint(&self) -> &str;

    /// Read a cluster by resource ID. Missing clusters are `ArmError::NotFound`.
    async fn get(&self, resource_id: &str) -> Result<OpenShiftManagedCluster, ArmError>;

    /// Start creating a cluster. Fails with `ArmError::Conflict` if it already exists.
    async fn begin_create(
        &self,
        resource_id: &str,
        cluster: &OpenShiftManagedCluster,
    ) -> Result<OperationHandle, ArmError>;

    /// Start updating an existing cluster
    async fn begin_update(
        &self,
        resource_id: &str,
        cluster: &OpenShiftManagedCluster,
    ) -> Result<OperationHandle, ArmError>;

    /// Start deleting a cluster. Unknown clusters are `ArmError::NotFound`.
    async fn begin_delete(&self, resource_id: &str) -> Result<OperationHandle, ArmError>;

    /// Query the status of an accepted operation
    async fn poll_operation(&self, handle: &OperationHandle) -> Result<OperationStatus, ArmError>;
}
