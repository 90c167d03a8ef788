//! Observed cluster state
//!
//! What the controller last read back from Azure for a cluster. Declared
//! slots mirror the spec shapes; computed slots (FQDNs, versions,
//! provisioning state) are only ever filled from the remote side.
//! Secrets are never present here.

use crate::profiles::{AgentPoolProfile, IdentityProviderConfig, MasterPoolProfile, NetworkProfile};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Router profile as reported by Azure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ObservedRouterProfile {
    /// Router name
    pub name: String,

    /// DNS subdomain for applications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_subdomain: Option<String>,

    /// Router FQDN (computed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
}

/// Identity provider as reported by Azure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ObservedIdentityProvider {
    /// Display name
    pub name: String,

    /// Provider configuration, without the secret
    pub provider: IdentityProviderConfig,

    /// AAD tenant the provider authenticates against (controller supplied)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

/// Authentication profile as reported by Azure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ObservedAuthProfile {
    #[serde(default)]
    pub identity_providers: Vec<ObservedIdentityProvider>,
}

/// Remote cluster state
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RemoteClusterState {
    /// Azure resource ID
    pub id: String,

    /// Cluster name
    pub name: String,

    /// Resource group
    pub resource_group_name: String,

    /// Azure region
    pub location: String,

    /// OpenShift version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openshift_version: Option<String>,

    /// Cluster FQDN (computed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,

    /// Public hostname of the console (computed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_hostname: Option<String>,

    /// Internal cluster version (computed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_version: Option<String>,

    /// Azure provisioning state (computed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_pool_profile: Option<MasterPoolProfile>,

    #[serde(default)]
    pub agent_pool_profiles: Vec<AgentPoolProfile>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_profile: Option<NetworkProfile>,

    #[serde(default)]
    pub router_profiles: Vec<ObservedRouterProfile>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_profile: Option<ObservedAuthProfile>,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}
