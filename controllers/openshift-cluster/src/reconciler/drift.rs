//! Drift between declared configuration and observed remote state.
//!
//! Pool counts, tags and the auth profile can be updated in place. Everything
//! else that differs forces replacement and is reported as immutable.
//! Read-only and write-only fields (fqdn, vnet id when undeclared, secrets)
//! never count as drift.

use crate::codec::{equal_fold, normalize_location};
use crds::{
    AgentPoolProfile, AuthProfile, ClusterSpec, IdentityProvider, MasterPoolProfile, NetworkProfile,
    ObservedAuthProfile, ObservedIdentityProvider, ObservedRouterProfile, RemoteClusterState, RouterProfile,
};
use std::collections::{BTreeMap, BTreeSet};

/// Changed fields, split by whether an in-place update can apply them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drift {
    pub immutable: Vec<String>,
    pub mutable: Vec<String>,
}

impl Drift {
    pub fn is_empty(&self) -> bool {
        self.immutable.is_empty() && self.mutable.is_empty()
    }
}

/// Compare declared configuration with what was last read
pub fn diff(spec: &ClusterSpec, observed: &RemoteClusterState) -> Drift {
    let mut drift = Drift::default();

    if !observed.location.is_empty() && normalize_location(&spec.location) != observed.location {
        drift.immutable.push("location".to_string());
    }
    if spec.openshift_version.is_some()
        && observed.openshift_version.is_some()
        && !equal_fold(spec.openshift_version.as_deref(), observed.openshift_version.as_deref())
    {
        drift.immutable.push("openshift_version".to_string());
    }

    if let Some(master) = &observed.master_pool_profile {
        diff_master_pool(&spec.master_pool_profile, master, &mut drift);
    }
    diff_agent_pools(&spec.agent_pool_profiles, &observed.agent_pool_profiles, &mut drift);

    if let Some(network) = &observed.network_profile {
        if network_changed(&spec.network_profile, network) {
            drift.immutable.push("network_profile".to_string());
        }
    }
    if !spec.router_profiles.is_empty() && routers_changed(&spec.router_profiles, &observed.router_profiles) {
        drift.immutable.push("router_profiles".to_string());
    }

    if spec.tags != observed.tags {
        drift.mutable.push("tags".to_string());
    }
    let observed_auth = observed.auth_profile.clone().unwrap_or_default();
    if auth_changed(&spec.auth_profile, &observed_auth) {
        drift.mutable.push("auth_profile".to_string());
    }

    // A failed cluster is re-submitted as is
    if observed
        .provisioning_state
        .as_deref()
        .is_some_and(|state| state.eq_ignore_ascii_case("Failed"))
    {
        drift.mutable.push("provisioning_state".to_string());
    }

    drift
}

/// Enum-like values are only compared when both sides set them; `""` is unset
fn observed_differs(declared: &str, observed: &str) -> bool {
    !declared.is_empty() && !observed.is_empty() && !equal_fold(Some(declared), Some(observed))
}

fn diff_master_pool(declared: &MasterPoolProfile, observed: &MasterPoolProfile, drift: &mut Drift) {
    let prefix = "master_pool_profile";
    if declared.name != observed.name {
        drift.immutable.push(format!("{}.name", prefix));
    }
    if !equal_fold(Some(declared.vm_size.as_str()), Some(observed.vm_size.as_str())) {
        drift.immutable.push(format!("{}.vm_size", prefix));
    }
    if observed_differs(&declared.os_type, &observed.os_type) {
        drift.immutable.push(format!("{}.os_type", prefix));
    }
    if declared.subnet_cidr != observed.subnet_cidr {
        drift.immutable.push(format!("{}.subnet_cidr", prefix));
    }
    if declared.count != observed.count {
        drift.mutable.push(format!("{}.count", prefix));
    }
}

fn diff_agent_pools(declared: &[AgentPoolProfile], observed: &[AgentPoolProfile], drift: &mut Drift) {
    let declared_names: BTreeSet<&str> = declared.iter().map(|pool| pool.name.as_str()).collect();
    let observed_by_name: BTreeMap<&str, &AgentPoolProfile> =
        observed.iter().map(|pool| (pool.name.as_str(), pool)).collect();

    if declared_names != observed_by_name.keys().copied().collect() {
        drift.immutable.push("agent_pool_profiles".to_string());
    }

    for pool in declared {
        let Some(current) = observed_by_name.get(pool.name.as_str()) else {
            continue;
        };
        let prefix = format!("agent_pool_profile[{}]", pool.name);
        if !equal_fold(Some(pool.vm_size.as_str()), Some(current.vm_size.as_str())) {
            drift.immutable.push(format!("{}.vm_size", prefix));
        }
        if observed_differs(&pool.os_type, &current.os_type) {
            drift.immutable.push(format!("{}.os_type", prefix));
        }
        if pool.subnet_cidr != current.subnet_cidr {
            drift.immutable.push(format!("{}.subnet_cidr", prefix));
        }
        if observed_differs(&pool.role, &current.role) {
            drift.immutable.push(format!("{}.role", prefix));
        }
        if pool.count != current.count {
            drift.mutable.push(format!("{}.count", prefix));
        }
    }
}

fn network_changed(declared: &NetworkProfile, observed: &NetworkProfile) -> bool {
    // vnet_id is computed when not declared
    declared.vnet_cidr != observed.vnet_cidr
        || (declared.peer_vnet_id.is_some()
            && !equal_fold(declared.peer_vnet_id.as_deref(), observed.peer_vnet_id.as_deref()))
        || (declared.vnet_id.is_some() && !equal_fold(declared.vnet_id.as_deref(), observed.vnet_id.as_deref()))
}

fn routers_changed(declared: &[RouterProfile], observed: &[ObservedRouterProfile]) -> bool {
    let observed_by_name: BTreeMap<&str, &ObservedRouterProfile> =
        observed.iter().map(|router| (router.name.as_str(), router)).collect();

    if declared.len() != observed_by_name.len() {
        return true;
    }
    declared.iter().any(|router| match observed_by_name.get(router.name.as_str()) {
        None => true,
        Some(current) => {
            router.public_subdomain.is_some()
                && !equal_fold(router.public_subdomain.as_deref(), current.public_subdomain.as_deref())
        }
    })
}

/// Secrets are never read back, so they cannot be compared. The tenant is
/// the controller's, not part of the declared profile.
fn auth_changed(declared: &AuthProfile, observed: &ObservedAuthProfile) -> bool {
    declared.identity_providers.len() != observed.identity_providers.len()
        || declared
            .identity_providers
            .iter()
            .zip(&observed.identity_providers)
            .any(|(declared, observed)| provider_changed(declared, observed))
}

fn provider_changed(declared: &IdentityProvider, observed: &ObservedIdentityProvider) -> bool {
    let (want, have) = (&declared.provider, &observed.provider);
    declared.name != observed.name
        || !equal_fold(Some(want.kind.as_str()), Some(have.kind.as_str()))
        || want.client_id != have.client_id
        || want.customer_admin_group_id != have.customer_admin_group_id
}
