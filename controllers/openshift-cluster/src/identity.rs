//! Cluster identity.
//!
//! A cluster is addressed by subscription, resource group and name, rendered as
//! `/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.ContainerService/openShiftManagedClusters/{name}`.

use crate::error::ReconcileError;
use arm_client::{PROVIDER_NAMESPACE, RESOURCE_TYPE};
use crds::ClusterSpec;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterIdentity {
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
}

impl ClusterIdentity {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            name: name.into(),
        }
    }

    /// Identity of the cluster a spec declares
    pub fn from_spec(subscription_id: &str, spec: &ClusterSpec) -> Self {
        Self::new(subscription_id, spec.resource_group_name.clone(), spec.name.clone())
    }

    /// Parse an ARM resource ID.
    ///
    /// Segments are read as key/value pairs. Keys match case-insensitively, as ARM
    /// treats them; `subscriptions`, `resourceGroups` and `openShiftManagedClusters`
    /// must all be present.
    pub fn parse(resource_id: &str) -> Result<Self, ReconcileError> {
        let malformed = |reason: &str| ReconcileError::MalformedIdentity(format!("{}: {}", resource_id, reason));

        let segments: Vec<&str> = resource_id.trim().trim_matches('/').split('/').collect();
        if segments.len() % 2 != 0 || segments.iter().any(|s| s.is_empty()) {
            return Err(malformed("expected alternating key/value segments"));
        }

        let components: HashMap<String, &str> = segments
            .chunks_exact(2)
            .map(|pair| (pair[0].to_ascii_lowercase(), pair[1]))
            .collect();

        let lookup = |key: &str| {
            components
                .get(&key.to_ascii_lowercase())
                .map(|value| (*value).to_string())
                .ok_or_else(|| malformed(&format!("missing {:?} segment", key)))
        };

        Ok(Self {
            subscription_id: lookup("subscriptions")?,
            resource_group: lookup("resourceGroups")?,
            name: lookup(RESOURCE_TYPE)?,
        })
    }

    /// ARM resource ID
    pub fn resource_id(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}/{}/{}",
            self.subscription_id, self.resource_group, PROVIDER_NAMESPACE, RESOURCE_TYPE, self.name
        )
    }
}

impl std::fmt::Display for ClusterIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.resource_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/acctestRG/providers/Microsoft.ContainerService/openShiftManagedClusters/acctest1";

    #[test]
    fn test_parse_and_format() {
        let identity = ClusterIdentity::parse(ID).unwrap();
        assert_eq!(identity.subscription_id, "00000000-0000-0000-0000-000000000000");
        assert_eq!(identity.resource_group, "acctestRG");
        assert_eq!(identity.name, "acctest1");
        assert_eq!(identity.resource_id(), ID);
        assert_eq!(identity.to_string(), ID);
    }

    #[test]
    fn test_parse_ignores_key_case() {
        let identity = ClusterIdentity::parse(&ID.replace("resourceGroups", "resourcegroups")).unwrap();
        assert_eq!(identity.resource_group, "acctestRG");
    }

    #[test]
    fn test_parse_missing_cluster_segment() {
        let err = ClusterIdentity::parse("/subscriptions/s/resourceGroups/rg").unwrap_err();
        assert!(matches!(err, ReconcileError::MalformedIdentity(_)));
    }

    #[test]
    fn test_parse_missing_resource_group() {
        let err = ClusterIdentity::parse(
            "/subscriptions/s/providers/Microsoft.ContainerService/openShiftManagedClusters/c",
        )
        .unwrap_err();
        assert!(matches!(err, ReconcileError::MalformedIdentity(_)));
    }

    #[test]
    fn test_parse_odd_segments() {
        assert!(ClusterIdentity::parse("/subscriptions/s/resourceGroups").is_err());
        assert!(ClusterIdentity::parse("").is_err());
    }
}
