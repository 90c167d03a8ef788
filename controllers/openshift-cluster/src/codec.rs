//! Field codec.
//!
//! Converts primitive configuration values (strings, 64-bit integers) into the
//! typed fields the ARM models expect, and back. Every translator goes through
//! these helpers so the rules live in one place:
//!
//! - an empty string means "not set" for optional strings
//! - enum values match case-insensitively and come back in canonical casing
//! - counts are range checked and never silently truncated to 32 bits

use arm_client::{AgentPoolRole, IdentityProviderKind, OsType};
use regex::Regex;
use std::net::IpAddr;
use std::sync::LazyLock;
use thiserror::Error;

/// Smallest node count a pool accepts
pub const MIN_POOL_COUNT: i64 = 1;

/// Largest node count a pool accepts
pub const MAX_POOL_COUNT: i64 = 100;

const POOL_NAME_PATTERN: &str = "^[a-z][a-z0-9]{0,11}$";

static POOL_NAME: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| Regex::new(POOL_NAME_PATTERN));

/// Local validation failure. Raised before any remote call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: invalid value {value:?}, expected one of: {allowed}")]
    InvalidEnumValue {
        field: String,
        value: String,
        allowed: String,
    },

    #[error("{field} must start with a lowercase letter, have a max length of 12, and only contain a-z0-9, got {value:?}")]
    InvalidPoolName { field: String, value: String },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("{field}: {value} does not fit in a 32-bit integer")]
    Overflow { field: String, value: i64 },

    #[error("{field}: {value:?} is not a valid CIDR")]
    InvalidCidr { field: String, value: String },

    #[error("{field}: {value:?} is not a valid UUID")]
    InvalidUuid { field: String, value: String },

    #[error("{field} is required")]
    Missing { field: String },

    #[error("pool name {name:?} is used by more than one agent pool profile")]
    DuplicatePoolName { name: String },

    #[error("{field}: validation pattern failed to compile: {reason}")]
    InvalidPattern { field: String, reason: String },
}

/// Enum fields carried as strings in configuration
pub trait FieldEnum: Copy + PartialEq + 'static {
    /// Canonical configuration spelling of each variant
    const VARIANTS: &'static [(&'static str, Self)];
}

impl FieldEnum for OsType {
    const VARIANTS: &'static [(&'static str, Self)] = &[("Linux", OsType::Linux), ("Windows", OsType::Windows)];
}

impl FieldEnum for AgentPoolRole {
    const VARIANTS: &'static [(&'static str, Self)] =
        &[("Compute", AgentPoolRole::Compute), ("Infra", AgentPoolRole::Infra)];
}

impl FieldEnum for IdentityProviderKind {
    const VARIANTS: &'static [(&'static str, Self)] = &[
        ("AADIdentityProvider", IdentityProviderKind::Aad),
        ("OpenShiftManagedClusterBaseIdentityProvider", IdentityProviderKind::Base),
    ];
}

/// Match a configuration string against an enum's variants, ignoring case
pub fn enum_from_config<T: FieldEnum>(field: &str, raw: &str) -> Result<T, ValidationError> {
    let raw = raw.trim();
    T::VARIANTS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(raw))
        .map(|(_, value)| *value)
        .ok_or_else(|| ValidationError::InvalidEnumValue {
            field: field.to_string(),
            value: raw.to_string(),
            allowed: T::VARIANTS.iter().map(|(name, _)| *name).collect::<Vec<_>>().join(", "),
        })
}

/// Canonical configuration spelling of an enum value; `""` for values outside the table
pub fn enum_to_config<T: FieldEnum>(value: T) -> String {
    T::VARIANTS
        .iter()
        .find(|(_, variant)| *variant == value)
        .map(|(name, _)| (*name).to_string())
        .unwrap_or_default()
}

/// Optional string: `None` and `""` both mean "not set"
pub fn optional_string(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Required string; empty is treated as missing
pub fn required_string(field: &str, value: &str) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Missing {
            field: field.to_string(),
        });
    }
    Ok(value.to_string())
}

/// Node count: configuration `i64` to wire `i32`, range checked
pub fn count_to_api(field: &str, value: i64) -> Result<i32, ValidationError> {
    let narrowed = i32::try_from(value).map_err(|_| ValidationError::Overflow {
        field: field.to_string(),
        value,
    })?;
    if !(MIN_POOL_COUNT..=MAX_POOL_COUNT).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value,
            min: MIN_POOL_COUNT,
            max: MAX_POOL_COUNT,
        });
    }
    Ok(narrowed)
}

/// Node count: wire `i32` to configuration `i64`
pub fn count_from_api(value: Option<i32>) -> i64 {
    value.map(i64::from).unwrap_or_default()
}

/// Pool names must match `^[a-z][a-z0-9]{0,11}$`
pub fn validate_pool_name(field: &str, value: &str) -> Result<String, ValidationError> {
    let pattern = POOL_NAME.as_ref().map_err(|e| ValidationError::InvalidPattern {
        field: field.to_string(),
        reason: e.to_string(),
    })?;
    if !pattern.is_match(value) {
        return Err(ValidationError::InvalidPoolName {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(value.to_string())
}

/// IPv4 or IPv6 network in `address/prefix` form
pub fn validate_cidr(field: &str, value: &str) -> Result<String, ValidationError> {
    let invalid = || ValidationError::InvalidCidr {
        field: field.to_string(),
        value: value.to_string(),
    };

    let (address, prefix) = value.split_once('/').ok_or_else(invalid)?;
    let address: IpAddr = address.parse().map_err(|_| invalid())?;
    let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
    let max_prefix = if address.is_ipv4() { 32 } else { 128 };
    if prefix > max_prefix {
        return Err(invalid());
    }
    Ok(value.to_string())
}

/// AAD object identifiers (client, tenant, group) are UUIDs
pub fn validate_uuid(field: &str, value: &str) -> Result<String, ValidationError> {
    uuid::Uuid::parse_str(value).map_err(|_| ValidationError::InvalidUuid {
        field: field.to_string(),
        value: value.to_string(),
    })?;
    Ok(value.to_string())
}

/// Azure location as ARM reports it: lower case, no spaces ("East US" -> "eastus")
pub fn normalize_location(location: &str) -> String {
    location
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Case-insensitive comparison of optional strings, with `""` equal to unset
pub fn equal_fold(a: Option<&str>, b: Option<&str>) -> bool {
    match (optional_string(a), optional_string(b)) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(&b),
        (None, None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_case_insensitive() {
        assert_eq!(enum_from_config::<OsType>("os_type", "linux").unwrap(), OsType::Linux);
        assert_eq!(enum_from_config::<OsType>("os_type", "WINDOWS").unwrap(), OsType::Windows);
        assert_eq!(enum_from_config::<AgentPoolRole>("role", "infra").unwrap(), AgentPoolRole::Infra);
        assert_eq!(enum_to_config(AgentPoolRole::Compute), "Compute");
        assert_eq!(enum_to_config(OsType::Linux), "Linux");
    }

    #[test]
    fn test_enum_rejects_unknown_value() {
        let err = enum_from_config::<OsType>("master_pool_profile.os_type", "Solaris").unwrap_err();
        match err {
            ValidationError::InvalidEnumValue { field, value, allowed } => {
                assert_eq!(field, "master_pool_profile.os_type");
                assert_eq!(value, "Solaris");
                assert_eq!(allowed, "Linux, Windows");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_optional_string_empty_is_unset() {
        assert_eq!(optional_string(Some("")), None);
        assert_eq!(optional_string(None), None);
        assert_eq!(optional_string(Some("x")), Some("x".to_string()));
        assert!(matches!(required_string("name", " "), Err(ValidationError::Missing { .. })));
    }

    #[test]
    fn test_count_range_and_overflow() {
        assert_eq!(count_to_api("count", 1).unwrap(), 1);
        assert_eq!(count_to_api("count", 100).unwrap(), 100);
        assert!(matches!(count_to_api("count", 0), Err(ValidationError::OutOfRange { .. })));
        assert!(matches!(count_to_api("count", 101), Err(ValidationError::OutOfRange { .. })));
        assert!(matches!(
            count_to_api("count", i64::from(i32::MAX) + 1),
            Err(ValidationError::Overflow { .. })
        ));
        assert_eq!(count_from_api(Some(3)), 3);
        assert_eq!(count_from_api(None), 0);
    }

    #[test]
    fn test_pool_name_pattern() {
        for valid in ["master", "compute", "infra", "a", "abcdefghij12"] {
            assert!(validate_pool_name("name", valid).is_ok(), "{valid} should be valid");
        }
        for invalid in ["", "Compute", "1pool", "pool-1", "abcdefghijklm", "pool_a"] {
            assert!(validate_pool_name("name", invalid).is_err(), "{invalid} should be invalid");
        }
    }

    #[test]
    fn test_cidr_validation() {
        assert!(validate_cidr("vnet_cidr", "10.0.0.0/8").is_ok());
        assert!(validate_cidr("vnet_cidr", "fd00::/64").is_ok());
        assert!(validate_cidr("vnet_cidr", "10.0.0.0").is_err());
        assert!(validate_cidr("vnet_cidr", "10.0.0.0/33").is_err());
        assert!(validate_cidr("vnet_cidr", "not-a-cidr/8").is_err());
    }

    #[test]
    fn test_uuid_validation() {
        assert!(validate_uuid("client_id", "6f1d2c3a-4b5e-4f60-8a7b-9c0d1e2f3a4b").is_ok());
        assert!(validate_uuid("client_id", "not-a-uuid").is_err());
    }

    #[test]
    fn test_normalize_location() {
        assert_eq!(normalize_location("East US"), "eastus");
        assert_eq!(normalize_location("westeurope"), "westeurope");
    }

    #[test]
    fn test_equal_fold() {
        assert!(equal_fold(Some("Standard_D4s_v3"), Some("standard_d4s_v3")));
        assert!(equal_fold(Some(""), None));
        assert!(!equal_fold(Some("a"), None));
    }
}
