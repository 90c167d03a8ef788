//! Router profiles.

use crate::codec::{optional_string, required_string, ValidationError};
use arm_client as api;
use crds::{ObservedRouterProfile, RouterProfile};

/// Returns `None` for an empty list; Azure then creates the "default" router
pub fn expand_router_profiles(profiles: &[RouterProfile]) -> Result<Option<Vec<api::RouterProfile>>, ValidationError> {
    if profiles.is_empty() {
        return Ok(None);
    }

    profiles
        .iter()
        .enumerate()
        .map(|(index, profile)| {
            Ok(api::RouterProfile {
                name: Some(required_string(&format!("router_profiles[{}].name", index), &profile.name)?),
                public_subdomain: optional_string(profile.public_subdomain.as_deref()),
                fqdn: None,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

pub fn flatten_router_profiles(profiles: Option<&[api::RouterProfile]>) -> Vec<ObservedRouterProfile> {
    profiles
        .unwrap_or_default()
        .iter()
        .map(|profile| ObservedRouterProfile {
            name: profile.name.clone().unwrap_or_default(),
            public_subdomain: optional_string(profile.public_subdomain.as_deref()),
            fqdn: optional_string(profile.fqdn.as_deref()),
        })
        .collect()
}

/// Declared part of observed routers
pub fn declared_router_profiles(observed: &[ObservedRouterProfile]) -> Vec<RouterProfile> {
    observed
        .iter()
        .map(|router| RouterProfile {
            name: router.name.clone(),
            public_subdomain: router.public_subdomain.clone(),
        })
        .collect()
}
