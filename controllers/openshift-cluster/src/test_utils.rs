//! Shared fixtures for unit tests.

use crate::identity::ClusterIdentity;
use crds::{
    AgentPoolProfile, AuthProfile, ClusterSpec, IdentityProvider, IdentityProviderConfig, MasterPoolProfile,
    NetworkProfile, RouterProfile, AAD_PROVIDER_KIND,
};
use std::collections::BTreeMap;

pub const SUBSCRIPTION_ID: &str = "00000000-0000-4000-8000-000000000000";
pub const AMBIENT_TENANT: &str = "72f988bf-86f1-41af-91ab-2d7cd011db47";
pub const CLIENT_ID: &str = "9b2c3d4e-5f60-4a7b-8c9d-0e1f2a3b4c5d";
pub const GROUP_ID: &str = "c0ffee00-1234-4abc-9def-001122334455";

pub fn master_pool() -> MasterPoolProfile {
    MasterPoolProfile {
        name: "master".to_string(),
        count: 3,
        vm_size: "Standard_D4s_v3".to_string(),
        os_type: "Linux".to_string(),
        subnet_cidr: "10.0.0.0/24".to_string(),
    }
}

pub fn agent_pool(name: &str, role: &str, count: i64) -> AgentPoolProfile {
    AgentPoolProfile {
        name: name.to_string(),
        count,
        vm_size: "Standard_D4s_v3".to_string(),
        os_type: "Linux".to_string(),
        subnet_cidr: "10.0.0.0/24".to_string(),
        role: role.to_string(),
    }
}

pub fn aad_provider() -> IdentityProviderConfig {
    IdentityProviderConfig {
        kind: AAD_PROVIDER_KIND.to_string(),
        client_id: Some(CLIENT_ID.to_string()),
        client_secret: Some("client-secret".to_string()),
        client_secret_ref: None,
        customer_admin_group_id: Some(GROUP_ID.to_string()),
    }
}

/// A valid three-pool cluster in eastus
pub fn cluster_spec() -> ClusterSpec {
    ClusterSpec {
        name: "acctest1".to_string(),
        resource_group_name: "acctestRG".to_string(),
        location: "eastus".to_string(),
        openshift_version: Some("v3.11".to_string()),
        master_pool_profile: master_pool(),
        agent_pool_profiles: vec![agent_pool("compute", "Compute", 4), agent_pool("infra", "Infra", 2)],
        network_profile: NetworkProfile {
            vnet_cidr: "10.0.0.0/8".to_string(),
            peer_vnet_id: None,
            vnet_id: None,
        },
        router_profiles: vec![RouterProfile {
            name: "default".to_string(),
            public_subdomain: Some("apps.acctest1.example.com".to_string()),
        }],
        auth_profile: AuthProfile {
            identity_providers: vec![IdentityProvider {
                name: "Azure AD".to_string(),
                provider: aad_provider(),
            }],
        },
        tags: BTreeMap::from([("environment".to_string(), "test".to_string())]),
    }
}

/// The smallest valid cluster: one "default" master pool and one "default" agent pool
pub fn minimal_cluster_spec() -> ClusterSpec {
    ClusterSpec {
        name: "acctest1".to_string(),
        resource_group_name: "acctestRG".to_string(),
        location: "eastus".to_string(),
        openshift_version: None,
        master_pool_profile: MasterPoolProfile {
            name: "default".to_string(),
            count: 1,
            vm_size: "Standard_D2s_v3".to_string(),
            os_type: "Linux".to_string(),
            subnet_cidr: "10.0.0.0/24".to_string(),
        },
        agent_pool_profiles: vec![AgentPoolProfile {
            name: "default".to_string(),
            count: 1,
            vm_size: "Standard_D2s_v3".to_string(),
            os_type: "Linux".to_string(),
            subnet_cidr: "10.0.0.0/24".to_string(),
            role: "Compute".to_string(),
        }],
        network_profile: NetworkProfile {
            vnet_cidr: "10.0.0.0/8".to_string(),
            peer_vnet_id: None,
            vnet_id: None,
        },
        router_profiles: Vec::new(),
        auth_profile: AuthProfile::default(),
        tags: BTreeMap::new(),
    }
}

pub fn identity() -> ClusterIdentity {
    ClusterIdentity::new(SUBSCRIPTION_ID, "acctestRG", "acctest1")
}
