//! Existence guard run before creating a cluster we do not track.

use super::Reconciler;
use crate::error::ReconcileError;
use crate::identity::ClusterIdentity;
use tracing::debug;

impl Reconciler {
    /// Fail with `AlreadyExists` when the cluster is already present.
    ///
    /// Only a definite not-found lets creation proceed; any other read error is propagated.
    pub async fn ensure_absent(&self, identity: &ClusterIdentity) -> Result<(), ReconcileError> {
        let resource_id = identity.resource_id();
        match self.within_read_timeout(&resource_id, self.client.get(&resource_id)).await? {
            Ok(existing) => Err(ReconcileError::AlreadyExists {
                id: existing.id.unwrap_or(resource_id),
            }),
            Err(e) if e.is_not_found() => {
                debug!("No existing cluster at {}", identity);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{ReconcileSettings, StaticTenant};
    use super::*;
    use crate::test_utils::{identity, AMBIENT_TENANT};
    use arm_client::mock::{MockFailure, MockOperation};
    use arm_client::{MockOpenShiftClient, OpenShiftManagedCluster};

    fn reconciler(client: &MockOpenShiftClient) -> Reconciler {
        Reconciler::new(client.clone(), StaticTenant::new(AMBIENT_TENANT), ReconcileSettings::default())
    }

    #[tokio::test]
    async fn test_guard_passes_when_absent() {
        let client = MockOpenShiftClient::new("http://localhost");
        assert!(reconciler(&client).ensure_absent(&identity()).await.is_ok());
    }

    #[tokio::test]
    async fn test_guard_rejects_existing_cluster() {
        let client = MockOpenShiftClient::new("http://localhost");
        let id = identity().resource_id();
        client.add_cluster(&id, OpenShiftManagedCluster::default());

        let err = reconciler(&client).ensure_absent(&identity()).await.unwrap_err();
        assert!(matches!(err, ReconcileError::AlreadyExists { id: existing } if existing == id));
    }

    #[tokio::test]
    async fn test_guard_propagates_other_errors() {
        let client = MockOpenShiftClient::new("http://localhost");
        client.fail_next(MockOperation::Get, MockFailure::Authentication);

        let err = reconciler(&client).ensure_absent(&identity()).await.unwrap_err();
        assert!(matches!(err, ReconcileError::Remote(_)));
    }
}
