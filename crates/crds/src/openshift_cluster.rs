//! OpenShiftCluster CRD
//!
//! Declares one Azure Red Hat OpenShift managed cluster
//! (`Microsoft.ContainerService/openShiftManagedClusters`).

use crate::observed::RemoteClusterState;
use crate::profiles::{AgentPoolProfile, AuthProfile, MasterPoolProfile, NetworkProfile, RouterProfile};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Annotation marking a cluster as adopted from Azure rather than created
///
/// Set to `"true"` to take over an existing cluster with the same name and
/// resource group instead of failing with "already exists".
pub const IMPORT_ANNOTATION: &str = "aro.microscaler.io/import";

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[kube(
    group = "aro.microscaler.io",
    version = "v1alpha1",
    kind = "OpenShiftCluster",
    namespaced,
    status = "OpenShiftClusterStatus",
    shortname = "osc",
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"FQDN","type":"string","jsonPath":".status.observed.fqdn"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct OpenShiftClusterSpec {
    /// Cluster name in Azure (immutable)
    pub name: String,

    /// Resource group holding the cluster (immutable)
    pub resource_group_name: String,

    /// Azure region (immutable)
    pub location: String,

    /// OpenShift version, e.g. "v3.11"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openshift_version: Option<String>,

    /// Control plane pool
    pub master_pool_profile: MasterPoolProfile,

    /// Worker / infra pools, in order (at least one)
    pub agent_pool_profiles: Vec<AgentPoolProfile>,

    /// Cluster virtual network
    pub network_profile: NetworkProfile,

    /// Routers; Azure creates a "default" router when empty
    #[serde(default)]
    pub router_profiles: Vec<RouterProfile>,

    /// Authentication
    pub auth_profile: AuthProfile,

    /// Azure resource tags
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Desired cluster state as handed to the reconciler
pub type ClusterSpec = OpenShiftClusterSpec;

impl OpenShiftCluster {
    /// Returns true when the import annotation is set to "true"
    pub fn wants_import(&self) -> bool {
        self.metadata
            .annotations
            .as_ref()
            .and_then(|annotations| annotations.get(IMPORT_ANNOTATION))
            .is_some_and(|value| value.eq_ignore_ascii_case("true"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
pub enum ClusterPhase {
    /// Not yet reconciled
    #[default]
    #[serde(alias = "pending")] // Backward compatibility: accept lowercase
    Pending,
    /// Cluster exists and matches the spec
    #[serde(alias = "ready")] // Backward compatibility: accept lowercase
    Ready,
    /// Last operation failed; see `error`
    #[serde(alias = "failed")] // Backward compatibility: accept lowercase
    Failed,
    /// Cluster was removed from Azure outside the controller
    #[serde(alias = "absent")] // Backward compatibility: accept lowercase
    Absent,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct OpenShiftClusterStatus {
    /// Reconciliation phase
    #[serde(default)]
    pub phase: ClusterPhase,

    /// Azure resource ID of the tracked cluster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,

    /// Generation of the spec the observed state was produced from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// State last read from Azure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed: Option<RemoteClusterState>,

    /// Error message (if phase is Failed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Last reconciliation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reconciled: Option<chrono::DateTime<chrono::Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ObjectMeta;

    #[test]
    fn test_phase_accepts_lowercase() {
        let phase: ClusterPhase = serde_json::from_str("\"ready\"").unwrap();
        assert_eq!(phase, ClusterPhase::Ready);
        assert_eq!(serde_json::to_string(&ClusterPhase::Absent).unwrap(), "\"Absent\"");
    }

    #[test]
    fn test_wants_import() {
        let mut cluster = OpenShiftCluster::new(
            "test",
            serde_json::from_value(serde_json::json!({
                "name": "test",
                "resourceGroupName": "rg",
                "location": "eastus",
                "masterPoolProfile": { "name": "master", "vmSize": "Standard_D4s_v3", "subnetCidr": "10.0.0.0/24" },
                "agentPoolProfiles": [],
                "networkProfile": { "vnetCidr": "10.0.0.0/8" },
                "authProfile": {}
            }))
            .unwrap(),
        );
        assert!(!cluster.wants_import());

        cluster.metadata = ObjectMeta {
            annotations: Some([(IMPORT_ANNOTATION.to_string(), "True".to_string())].into()),
            ..Default::default()
        };
        assert!(cluster.wants_import());
    }
}
