//! Authentication profile and identity provider variants.
//!
//! The configuration side carries a loosely typed provider (a `kind` string
//! plus optional fields); the API side is the closed `IdentityProvider` union.
//! Secrets only ever flow outwards: flatten never writes one back. The AAD
//! tenant is always the caller's and only shows up in observed state.

use crate::codec::{enum_to_config, optional_string, required_string, validate_uuid, ValidationError};
use arm_client as api;
use arm_client::{AadIdentityProvider, IdentityProviderKind};
use crds::{AuthProfile, IdentityProvider, IdentityProviderConfig, ObservedAuthProfile, ObservedIdentityProvider};

/// Expand one provider. Unrecognised kinds fall back to the base provider.
pub fn expand_identity_provider(
    field: &str,
    config: &IdentityProviderConfig,
    tenant_id: &str,
) -> Result<api::IdentityProvider, ValidationError> {
    let field = |name: &str| format!("{}.{}", field, name);

    match IdentityProviderKind::from_discriminator(Some(config.kind.trim())) {
        IdentityProviderKind::Aad => {
            let client_id = required_string(&field("client_id"), config.client_id.as_deref().unwrap_or_default())?;
            let secret = optional_string(config.client_secret.as_deref()).ok_or_else(|| ValidationError::Missing {
                field: field("client_secret"),
            })?;
            let tenant_id = required_string(&field("tenant_id"), tenant_id)?;
            let customer_admin_group_id = optional_string(config.customer_admin_group_id.as_deref())
                .map(|group| validate_uuid(&field("customer_admin_group_id"), &group))
                .transpose()?;

            Ok(api::IdentityProvider::Aad(AadIdentityProvider {
                client_id: Some(validate_uuid(&field("client_id"), &client_id)?),
                secret: Some(secret),
                tenant_id: Some(tenant_id),
                customer_admin_group_id,
            }))
        }
        IdentityProviderKind::Base => Ok(api::IdentityProvider::Base),
    }
}

/// Flatten one provider. The secret is left unset and the tenant is not part of it.
pub fn flatten_identity_provider(provider: &api::IdentityProvider) -> IdentityProviderConfig {
    let kind = enum_to_config(provider.kind());
    match provider {
        api::IdentityProvider::Aad(aad) => IdentityProviderConfig {
            kind,
            client_id: optional_string(aad.client_id.as_deref()),
            client_secret: None,
            client_secret_ref: None,
            customer_admin_group_id: optional_string(aad.customer_admin_group_id.as_deref()),
        },
        api::IdentityProvider::Base => IdentityProviderConfig {
            kind,
            ..Default::default()
        },
    }
}

/// Returns `None` when no providers are declared
pub fn expand_auth_profile(profile: &AuthProfile, tenant_id: &str) -> Result<Option<api::AuthProfile>, ValidationError> {
    if profile.identity_providers.is_empty() {
        return Ok(None);
    }

    let providers = profile
        .identity_providers
        .iter()
        .enumerate()
        .map(|(index, provider)| {
            let field = format!("auth_profile.identity_providers[{}]", index);
            Ok(api::ManagedClusterIdentityProvider {
                name: Some(required_string(&format!("{}.name", field), &provider.name)?),
                provider: Some(expand_identity_provider(
                    &format!("{}.provider", field),
                    &provider.provider,
                    tenant_id,
                )?),
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    Ok(Some(api::AuthProfile {
        identity_providers: Some(providers),
    }))
}

pub fn flatten_auth_profile(profile: Option<&api::AuthProfile>) -> Option<ObservedAuthProfile> {
    let providers = profile?.identity_providers.as_deref().unwrap_or_default();
    Some(ObservedAuthProfile {
        identity_providers: providers
            .iter()
            .map(|provider| {
                let remote = provider.provider.clone().unwrap_or(api::IdentityProvider::Base);
                let tenant_id = match &remote {
                    api::IdentityProvider::Aad(aad) => optional_string(aad.tenant_id.as_deref()),
                    api::IdentityProvider::Base => None,
                };
                ObservedIdentityProvider {
                    name: provider.name.clone().unwrap_or_default(),
                    provider: flatten_identity_provider(&remote),
                    tenant_id,
                }
            })
            .collect(),
    })
}

/// Declared part of an observed auth profile
#[cfg(test)]
pub fn declared_auth_profile(observed: &ObservedAuthProfile) -> AuthProfile {
    AuthProfile {
        identity_providers: observed
            .identity_providers
            .iter()
            .map(|provider| IdentityProvider {
                name: provider.name.clone(),
                provider: provider.provider.clone(),
            })
            .collect(),
    }
}
