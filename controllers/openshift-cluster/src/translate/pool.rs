//! Master and agent pool profiles.

use crate::codec::{
    count_from_api, count_to_api, enum_from_config, enum_to_config, optional_string, required_string,
    validate_cidr, validate_pool_name, ValidationError,
};
use arm_client as api;
use arm_client::{AgentPoolRole, OsType};
use crds::{AgentPoolProfile, MasterPoolProfile};

fn os_type_to_api(field: &str, os_type: &str) -> Result<Option<OsType>, ValidationError> {
    optional_string(Some(os_type))
        .map(|value| enum_from_config::<OsType>(field, &value))
        .transpose()
}

fn os_type_from_api(os_type: Option<OsType>) -> String {
    os_type.map(enum_to_config).unwrap_or_default()
}

pub fn expand_master_pool_profile(profile: &MasterPoolProfile) -> Result<api::MasterPoolProfile, ValidationError> {
    let field = |name: &str| format!("master_pool_profile.{}", name);

    let subnet_cidr = required_string(&field("subnet_cidr"), &profile.subnet_cidr)?;
    Ok(api::MasterPoolProfile {
        name: Some(validate_pool_name(&field("name"), &profile.name)?),
        count: Some(count_to_api(&field("count"), profile.count)?),
        vm_size: Some(required_string(&field("vm_size"), &profile.vm_size)?),
        subnet_cidr: Some(validate_cidr(&field("subnet_cidr"), &subnet_cidr)?),
        os_type: os_type_to_api(&field("os_type"), &profile.os_type)?,
    })
}

pub fn flatten_master_pool_profile(profile: Option<&api::MasterPoolProfile>) -> Option<MasterPoolProfile> {
    let profile = profile?;
    Some(MasterPoolProfile {
        name: profile.name.clone().unwrap_or_default(),
        count: count_from_api(profile.count),
        vm_size: profile.vm_size.clone().unwrap_or_default(),
        os_type: os_type_from_api(profile.os_type),
        subnet_cidr: profile.subnet_cidr.clone().unwrap_or_default(),
    })
}

/// Expand agent pools, preserving order. Returns `None` for an empty list.
pub fn expand_agent_pool_profiles(
    profiles: &[AgentPoolProfile],
) -> Result<Option<Vec<api::AgentPoolProfile>>, ValidationError> {
    if profiles.is_empty() {
        return Ok(None);
    }

    profiles
        .iter()
        .enumerate()
        .map(|(index, profile)| {
            let field = |name: &str| format!("agent_pool_profiles[{}].{}", index, name);
            let subnet_cidr = required_string(&field("subnet_cidr"), &profile.subnet_cidr)?;
            let role = optional_string(Some(profile.role.as_str()))
                .map(|role| enum_from_config::<AgentPoolRole>(&field("role"), &role))
                .transpose()?;

            Ok(api::AgentPoolProfile {
                name: Some(validate_pool_name(&field("name"), &profile.name)?),
                count: Some(count_to_api(&field("count"), profile.count)?),
                vm_size: Some(required_string(&field("vm_size"), &profile.vm_size)?),
                subnet_cidr: Some(validate_cidr(&field("subnet_cidr"), &subnet_cidr)?),
                os_type: os_type_to_api(&field("os_type"), &profile.os_type)?,
                role,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Flatten agent pools in the order the API returned them
pub fn flatten_agent_pool_profiles(profiles: Option<&[api::AgentPoolProfile]>) -> Vec<AgentPoolProfile> {
    profiles
        .unwrap_or_default()
        .iter()
        .map(|profile| AgentPoolProfile {
            name: profile.name.clone().unwrap_or_default(),
            count: count_from_api(profile.count),
            vm_size: profile.vm_size.clone().unwrap_or_default(),
            os_type: os_type_from_api(profile.os_type),
            subnet_cidr: profile.subnet_cidr.clone().unwrap_or_default(),
            role: profile.role.map(enum_to_config).unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{agent_pool, master_pool};

    #[test]
    fn test_expand_master_pool() {
        let mut profile = master_pool();
        profile.os_type = "linux".to_string();

        let expanded = expand_master_pool_profile(&profile).unwrap();
        assert_eq!(expanded.name.as_deref(), Some("master"));
        assert_eq!(expanded.count, Some(3));
        assert_eq!(expanded.os_type, Some(OsType::Linux));
        assert_eq!(expanded.subnet_cidr.as_deref(), Some("10.0.0.0/24"));
    }

    #[test]
    fn test_expand_master_pool_empty_os_type_is_omitted() {
        let mut profile = master_pool();
        profile.os_type = String::new();
        assert_eq!(expand_master_pool_profile(&profile).unwrap().os_type, None);
    }

    #[test]
    fn test_expand_master_pool_rejects_bad_input() {
        let mut profile = master_pool();
        profile.count = 0;
        assert!(matches!(
            expand_master_pool_profile(&profile),
            Err(ValidationError::OutOfRange { .. })
        ));

        let mut profile = master_pool();
        profile.os_type = "Plan9".to_string();
        match expand_master_pool_profile(&profile).unwrap_err() {
            ValidationError::InvalidEnumValue { field, value, .. } => {
                assert_eq!(field, "master_pool_profile.os_type");
                assert_eq!(value, "Plan9");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let mut profile = master_pool();
        profile.subnet_cidr = String::new();
        assert!(matches!(
            expand_master_pool_profile(&profile),
            Err(ValidationError::Missing { .. })
        ));
    }

    #[test]
    fn test_expand_agent_pools_empty_is_none() {
        assert_eq!(expand_agent_pool_profiles(&[]).unwrap(), None);
    }

    #[test]
    fn test_agent_pools_preserve_order() {
        let pools = vec![agent_pool("infra", "Infra", 2), agent_pool("compute", "compute", 1)];
        let expanded = expand_agent_pool_profiles(&pools).unwrap().unwrap();
        assert_eq!(expanded[0].name.as_deref(), Some("infra"));
        assert_eq!(expanded[0].role, Some(AgentPoolRole::Infra));
        assert_eq!(expanded[1].role, Some(AgentPoolRole::Compute));

        let flattened = flatten_agent_pool_profiles(Some(expanded.as_slice()));
        assert_eq!(flattened[0].name, "infra");
        assert_eq!(flattened[1].name, "compute");
        assert_eq!(flattened[1].role, "Compute");
    }

    #[test]
    fn test_agent_pool_index_in_error_field() {
        let pools = vec![agent_pool("compute", "Compute", 1), agent_pool("Bad-Name", "Compute", 1)];
        match expand_agent_pool_profiles(&pools).unwrap_err() {
            ValidationError::InvalidPoolName { field, .. } => assert_eq!(field, "agent_pool_profiles[1].name"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_remote_values_flatten_to_unset() {
        let observed = vec![api::AgentPoolProfile {
            name: Some("gpu".to_string()),
            count: Some(2),
            os_type: Some(OsType::Unknown),
            role: Some(AgentPoolRole::Unknown),
            ..Default::default()
        }];
        let flattened = flatten_agent_pool_profiles(Some(observed.as_slice()));
        assert_eq!(flattened[0].os_type, "");
        assert_eq!(flattened[0].role, "");
        assert_eq!(flattened[0].count, 2);
    }

    #[test]
    fn test_master_pool_round_trip() {
        let profile = master_pool();
        let flattened = flatten_master_pool_profile(Some(&expand_master_pool_profile(&profile).unwrap()));
        assert_eq!(flattened, Some(profile));
        assert_eq!(flatten_master_pool_profile(None), None);
    }
}
