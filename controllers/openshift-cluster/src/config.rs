//! Controller configuration from environment variables.

use crate::backoff::PollSettings;
use crate::error::ControllerError;
use crate::reconciler::{ReconcileSettings, Timeouts};
use arm_client::DEFAULT_ENDPOINT;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration, read once at startup
#[derive(Clone)]
pub struct ControllerConfig {
    pub arm_endpoint: String,
    pub access_token: String,
    pub subscription_id: String,
    pub tenant_id: String,
    /// Namespace to watch; all namespaces when unset
    pub namespace: Option<String>,
    pub refresh_interval: Duration,
    pub reconcile: ReconcileSettings,
}

impl std::fmt::Debug for ControllerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("arm_endpoint", &self.arm_endpoint)
            .field("access_token", &"<redacted>")
            .field("subscription_id", &self.subscription_id)
            .field("tenant_id", &self.tenant_id)
            .field("namespace", &self.namespace)
            .field("refresh_interval", &self.refresh_interval)
            .field("reconcile", &self.reconcile)
            .finish()
    }
}

impl ControllerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ControllerError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &str| {
            var(key).ok_or_else(|| ControllerError::InvalidConfig(format!("{} environment variable is required", key)))
        };
        let parsed = |key: &str, default: u64| -> Result<u64, ControllerError> {
            match var(key) {
                Some(value) => u64::from_str(value.trim()).map_err(|e| {
                    ControllerError::InvalidConfig(format!("{} must be a whole number, got {:?}: {}", key, value, e))
                }),
                None => Ok(default),
            }
        };
        let minutes = |key: &str, default: u64| -> Result<Duration, ControllerError> {
            let value = parsed(key, default)?;
            value
                .checked_mul(60)
                .map(Duration::from_secs)
                .ok_or_else(|| ControllerError::InvalidConfig(format!("{} is too large: {} minutes", key, value)))
        };

        let require_import = match var("REQUIRE_IMPORT") {
            Some(value) => bool::from_str(&value.trim().to_ascii_lowercase()).map_err(|_| {
                ControllerError::InvalidConfig(format!("REQUIRE_IMPORT must be true or false, got {:?}", value))
            })?,
            None => true,
        };

        let poll = PollSettings {
            initial_delay: Duration::from_secs(parsed("POLL_INITIAL_SECS", 10)?),
            max_delay: Duration::from_secs(parsed("POLL_MAX_SECS", 60)?),
            ..Default::default()
        };
        if poll.initial_delay.is_zero() || poll.max_delay < poll.initial_delay {
            return Err(ControllerError::InvalidConfig(
                "POLL_INITIAL_SECS must be positive and no larger than POLL_MAX_SECS".to_string(),
            ));
        }

        let timeouts = Timeouts {
            create: minutes("TIMEOUT_CREATE_MINS", 90)?,
            read: minutes("TIMEOUT_READ_MINS", 5)?,
            update: minutes("TIMEOUT_UPDATE_MINS", 90)?,
            delete: minutes("TIMEOUT_DELETE_MINS", 90)?,
        };

        let tenant_id = required("ARM_TENANT_ID")?;
        uuid::Uuid::parse_str(tenant_id.trim())
            .map_err(|e| ControllerError::InvalidConfig(format!("ARM_TENANT_ID is not a UUID: {}", e)))?;

        Ok(Self {
            arm_endpoint: var("ARM_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            access_token: required("ARM_ACCESS_TOKEN")?,
            subscription_id: required("ARM_SUBSCRIPTION_ID")?,
            tenant_id: tenant_id.trim().to_string(),
            namespace: var("WATCH_NAMESPACE"),
            refresh_interval: Duration::from_secs(parsed("REFRESH_INTERVAL_SECS", 300)?),
            reconcile: ReconcileSettings {
                timeouts,
                poll,
                require_import,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<ControllerConfig, ControllerError> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ControllerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("ARM_ACCESS_TOKEN", "token"),
        ("ARM_SUBSCRIPTION_ID", "00000000-0000-4000-8000-000000000000"),
        ("ARM_TENANT_ID", "72f988bf-86f1-41af-91ab-2d7cd011db47"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(&REQUIRED).unwrap();
        assert_eq!(config.arm_endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.namespace, None);
        assert_eq!(config.refresh_interval, Duration::from_secs(300));
        assert_eq!(config.reconcile, ReconcileSettings::default());
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("WATCH_NAMESPACE", "clusters"),
            ("REQUIRE_IMPORT", "False"),
            ("TIMEOUT_CREATE_MINS", "120"),
            ("POLL_INITIAL_SECS", "5"),
        ]);
        let config = load(&pairs).unwrap();
        assert_eq!(config.namespace.as_deref(), Some("clusters"));
        assert!(!config.reconcile.require_import);
        assert_eq!(config.reconcile.timeouts.create, Duration::from_secs(120 * 60));
        assert_eq!(config.reconcile.poll.initial_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_token_is_rejected() {
        let err = load(&REQUIRED[1..]).unwrap_err();
        assert!(matches!(err, ControllerError::InvalidConfig(msg) if msg.contains("ARM_ACCESS_TOKEN")));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("REFRESH_INTERVAL_SECS", "soon"));
        assert!(matches!(load(&pairs), Err(ControllerError::InvalidConfig(_))));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("POLL_INITIAL_SECS", "0"));
        assert!(matches!(load(&pairs), Err(ControllerError::InvalidConfig(_))));
    }

    #[test]
    fn test_oversized_timeout_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("TIMEOUT_CREATE_MINS", "18446744073709551615"));
        let err = load(&pairs).unwrap_err();
        assert!(matches!(err, ControllerError::InvalidConfig(msg) if msg.contains("TIMEOUT_CREATE_MINS")));
    }

    #[test]
    fn test_token_is_redacted() {
        let config = load(&REQUIRED).unwrap();
        assert!(!format!("{:?}", config).contains("\"token\""));
    }
}
