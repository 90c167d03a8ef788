//! Whole-cluster expand / flatten.

use super::auth::{expand_auth_profile, flatten_auth_profile};
use super::network::{expand_network_profile, flatten_network_profile};
use super::pool::{
    expand_agent_pool_profiles, expand_master_pool_profile, flatten_agent_pool_profiles, flatten_master_pool_profile,
};
use super::router::{expand_router_profiles, flatten_router_profiles};
use crate::codec::{normalize_location, optional_string, required_string, ValidationError};
use crate::identity::ClusterIdentity;
use arm_client as api;
use crds::{ClusterSpec, RemoteClusterState};
use std::collections::HashSet;

/// Build the request body for a cluster. Fails before any remote call on invalid input.
pub fn expand_cluster(spec: &ClusterSpec, tenant_id: &str) -> Result<api::OpenShiftManagedCluster, ValidationError> {
    required_string("name", &spec.name)?;
    required_string("resource_group_name", &spec.resource_group_name)?;
    let location = normalize_location(&required_string("location", &spec.location)?);

    if spec.agent_pool_profiles.is_empty() {
        return Err(ValidationError::Missing {
            field: "agent_pool_profiles".to_string(),
        });
    }

    // The master pool is a separate profile and may share a name with an agent pool
    let mut seen = HashSet::new();
    for name in spec.agent_pool_profiles.iter().map(|pool| &pool.name) {
        if !seen.insert(name.as_str()) {
            return Err(ValidationError::DuplicatePoolName { name: name.clone() });
        }
    }

    let properties = api::OpenShiftManagedClusterProperties {
        openshift_version: optional_string(spec.openshift_version.as_deref()),
        network_profile: Some(expand_network_profile(&spec.network_profile)?),
        router_profiles: expand_router_profiles(&spec.router_profiles)?,
        master_pool_profile: Some(expand_master_pool_profile(&spec.master_pool_profile)?),
        agent_pool_profiles: expand_agent_pool_profiles(&spec.agent_pool_profiles)?,
        auth_profile: expand_auth_profile(&spec.auth_profile, tenant_id)?,
        ..Default::default()
    };

    Ok(api::OpenShiftManagedCluster {
        location: Some(location),
        tags: Some(spec.tags.clone()),
        properties: Some(properties),
        ..Default::default()
    })
}

/// Observed state of a cluster as returned by a read
pub fn flatten_cluster(identity: &ClusterIdentity, cluster: &api::OpenShiftManagedCluster) -> RemoteClusterState {
    let properties = cluster.properties.clone().unwrap_or_default();

    RemoteClusterState {
        id: cluster.id.clone().unwrap_or_else(|| identity.resource_id()),
        name: identity.name.clone(),
        resource_group_name: identity.resource_group.clone(),
        location: cluster.location.as_deref().map(normalize_location).unwrap_or_default(),
        openshift_version: optional_string(properties.openshift_version.as_deref()),
        fqdn: optional_string(properties.fqdn.as_deref()),
        public_hostname: optional_string(properties.public_hostname.as_deref()),
        cluster_version: optional_string(properties.cluster_version.as_deref()),
        provisioning_state: optional_string(properties.provisioning_state.as_deref()),
        master_pool_profile: flatten_master_pool_profile(properties.master_pool_profile.as_ref()),
        agent_pool_profiles: flatten_agent_pool_profiles(properties.agent_pool_profiles.as_deref()),
        network_profile: flatten_network_profile(properties.network_profile.as_ref()),
        router_profiles: flatten_router_profiles(properties.router_profiles.as_deref()),
        auth_profile: flatten_auth_profile(properties.auth_profile.as_ref()),
        tags: cluster.tags.clone().unwrap_or_default(),
    }
}
