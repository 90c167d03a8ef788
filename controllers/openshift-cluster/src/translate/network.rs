//! Network profile.

use crate::codec::{optional_string, required_string, validate_cidr, ValidationError};
use arm_client as api;
use crds::NetworkProfile;

pub fn expand_network_profile(profile: &NetworkProfile) -> Result<api::NetworkProfile, ValidationError> {
    let vnet_cidr = required_string("network_profile.vnet_cidr", &profile.vnet_cidr)?;
    Ok(api::NetworkProfile {
        vnet_cidr: Some(validate_cidr("network_profile.vnet_cidr", &vnet_cidr)?),
        peer_vnet_id: optional_string(profile.peer_vnet_id.as_deref()),
        vnet_id: optional_string(profile.vnet_id.as_deref()),
    })
}

/// `vnet_id` is filled from the remote side when Azure assigned it
pub fn flatten_network_profile(profile: Option<&api::NetworkProfile>) -> Option<NetworkProfile> {
    let profile = profile?;
    Some(NetworkProfile {
        vnet_cidr: profile.vnet_cidr.clone().unwrap_or_default(),
        peer_vnet_id: optional_string(profile.peer_vnet_id.as_deref()),
        vnet_id: optional_string(profile.vnet_id.as_deref()),
    })
}
