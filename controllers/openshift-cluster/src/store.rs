//! Declared configuration and observed state storage.
//!
//! The reconciler never touches Kubernetes directly. The watcher reads the
//! declared cluster through a `ConfigStore` (with secret references resolved)
//! and writes results back through the same store.

use crate::error::ControllerError;
use async_trait::async_trait;
use chrono::Utc;
use crds::{ClusterPhase, ClusterSpec, OpenShiftCluster, OpenShiftClusterStatus, RemoteClusterState, SecretKeyReference};
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client};
use serde_json::json;
use tracing::debug;

/// Status written after a reconcile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedUpdate {
    pub phase: ClusterPhase,
    /// `None` clears the tracked resource
    pub resource_id: Option<String>,
    pub observed_generation: Option<i64>,
    pub observed: Option<RemoteClusterState>,
    pub error: Option<String>,
}

impl ObservedUpdate {
    /// The cluster exists and matches the spec of `generation`
    pub fn ready(generation: Option<i64>, state: RemoteClusterState) -> Self {
        Self {
            phase: ClusterPhase::Ready,
            resource_id: Some(state.id.clone()),
            observed_generation: generation,
            observed: Some(state),
            error: None,
        }
    }

    /// The cluster is gone from Azure; forget it
    pub fn absent(generation: Option<i64>) -> Self {
        Self {
            phase: ClusterPhase::Absent,
            resource_id: None,
            observed_generation: generation,
            observed: None,
            error: None,
        }
    }

    /// ARM accepted a mutation for `resource_id` that has not finished yet
    pub fn pending(previous: &OpenShiftClusterStatus, generation: Option<i64>, resource_id: &str) -> Self {
        Self {
            phase: ClusterPhase::Pending,
            resource_id: Some(resource_id.to_string()),
            observed_generation: generation,
            observed: previous.observed.clone(),
            error: None,
        }
    }

    /// Reconcile failed; keep what was known before
    pub fn failed(previous: &OpenShiftClusterStatus, generation: Option<i64>, error: impl ToString) -> Self {
        Self {
            phase: ClusterPhase::Failed,
            resource_id: previous.resource_id.clone(),
            observed_generation: generation,
            observed: previous.observed.clone(),
            error: Some(error.to_string()),
        }
    }

    /// JSON merge patch for the status subresource. `None` fields are removed.
    pub fn to_patch(&self) -> serde_json::Value {
        json!({
            "status": {
                "phase": self.phase,
                "resourceId": self.resource_id,
                "observedGeneration": self.observed_generation,
                "observed": self.observed,
                "error": self.error,
                "lastReconciled": Utc::now(),
            }
        })
    }
}

/// Source of declared cluster configuration and sink for observed state
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Declared configuration of cluster `name`, with secret references resolved
    async fn get_config(&self, name: &str) -> Result<ClusterSpec, ControllerError>;

    /// Record the outcome of a reconcile for cluster `name`
    async fn set_observed_state(&self, name: &str, update: ObservedUpdate) -> Result<(), ControllerError>;
}

/// `ConfigStore` backed by `OpenShiftCluster` resources and Secrets in one namespace
#[derive(Clone)]
pub struct KubeConfigStore {
    clusters: Api<OpenShiftCluster>,
    secrets: Api<Secret>,
    namespace: String,
}

impl KubeConfigStore {
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            clusters: Api::namespaced(client.clone(), namespace),
            secrets: Api::namespaced(client, namespace),
            namespace: namespace.to_string(),
        }
    }

    /// Fill `client_secret` from `client_secret_ref` where the inline value is unset
    pub async fn resolve_secrets(&self, mut spec: ClusterSpec) -> Result<ClusterSpec, ControllerError> {
        for provider in &mut spec.auth_profile.identity_providers {
            let config = &mut provider.provider;
            if config.client_secret.is_some() {
                continue;
            }
            if let Some(reference) = &config.client_secret_ref {
                config.client_secret = Some(self.read_secret(reference).await?);
            }
        }
        Ok(spec)
    }

    async fn read_secret(&self, reference: &SecretKeyReference) -> Result<String, ControllerError> {
        let secret = self
            .secrets
            .get_opt(&reference.name)
            .await?
            .ok_or_else(|| ControllerError::SecretNotFound(format!("{}/{}", self.namespace, reference.name)))?;
        debug!("Resolved secret reference {}/{}", self.namespace, reference);
        secret_value(&secret, &reference.key)
            .ok_or_else(|| ControllerError::SecretNotFound(format!("{}/{}", self.namespace, reference)))
    }
}

/// Value of `key` from `data`, falling back to `stringData`
fn secret_value(secret: &Secret, key: &str) -> Option<String> {
    if let Some(bytes) = secret.data.as_ref().and_then(|data| data.get(key)) {
        return String::from_utf8(bytes.0.clone()).ok().map(|value| value.trim_end().to_string());
    }
    secret
        .string_data
        .as_ref()
        .and_then(|data| data.get(key))
        .cloned()
}

#[async_trait]
impl ConfigStore for KubeConfigStore {
    async fn get_config(&self, name: &str) -> Result<ClusterSpec, ControllerError> {
        let cluster = self.clusters.get(name).await?;
        self.resolve_secrets(cluster.spec).await
    }

    async fn set_observed_state(&self, name: &str, update: ObservedUpdate) -> Result<(), ControllerError> {
        let pp = PatchParams::default();
        self.clusters
            .patch_status(name, &pp, &Patch::Merge(&update.to_patch()))
            .await?;
        debug!("Updated status of OpenShiftCluster {}/{} to {:?}", self.namespace, name, update.phase);
        Ok(())
    }
}
