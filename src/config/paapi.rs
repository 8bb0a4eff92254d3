//! Product Advertising API configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::paapi::{PaapiClientConfig, DEFAULT_BASE_URL, DEFAULT_MARKETPLACE};

/// PA-API credentials and endpoint.
///
/// With `use_mock = true` the service runs against the scripted mock and
/// the credentials may be omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct PaapiConfig {
    pub access_key: Option<String>,

    pub secret_key: Option<Secret<String>>,

    /// Associate partner tag (e.g. "store-20")
    pub partner_tag: Option<String>,

    #[serde(default = "default_marketplace")]
    pub marketplace: String,

    /// Signing region
    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub use_mock: bool,
}

impl PaapiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Client settings, when a partner tag is configured.
    pub fn client_config(&self) -> Option<PaapiClientConfig> {
        self.partner_tag.as_ref().map(|tag| {
            PaapiClientConfig::new(tag.clone())
                .with_marketplace(self.marketplace.clone())
                .with_base_url(self.base_url.clone())
                .with_timeout(self.timeout())
        })
    }

    /// Validate PA-API configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.use_mock {
            if self.access_key.as_deref().map_or(true, str::is_empty) {
                return Err(ValidationError::MissingRequired("PAAPI__ACCESS_KEY"));
            }
            if self.secret_key.is_none() {
                return Err(ValidationError::MissingRequired("PAAPI__SECRET_KEY"));
            }
            if self.partner_tag.as_deref().map_or(true, str::is_empty) {
                return Err(ValidationError::MissingRequired("PAAPI__PARTNER_TAG"));
            }
        }
        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            return Err(ValidationError::InvalidBaseUrl);
        }
        if self.timeout_ms == 0 || self.timeout_ms > 60_000 {
            return Err(ValidationError::InvalidUpstreamTimeout);
        }
        Ok(())
    }
}

impl Default for PaapiConfig {
    fn default() -> Self {
        Self {
            access_key: None,
            secret_key: None,
            partner_tag: None,
            marketplace: default_marketplace(),
            region: default_region(),
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            use_mock: false,
        }
    }
}

fn default_marketplace() -> String {
    DEFAULT_MARKETPLACE.to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> PaapiConfig {
        PaapiConfig {
            access_key: Some("AKIDEXAMPLE".to_string()),
            secret_key: Some(Secret::new("secret".to_string())),
            partner_tag: Some("store-20".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = PaapiConfig::default();
        assert_eq!(config.marketplace, "www.amazon.com");
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(!config.use_mock);
    }

    #[test]
    fn test_credentials_required_unless_mock() {
        assert_eq!(
            PaapiConfig::default().validate(),
            Err(ValidationError::MissingRequired("PAAPI__ACCESS_KEY"))
        );

        let mock = PaapiConfig {
            use_mock: true,
            ..Default::default()
        };
        assert!(mock.validate().is_ok());
        assert!(credentials().validate().is_ok());
    }

    #[test]
    fn test_missing_partner_tag() {
        let config = PaapiConfig {
            partner_tag: None,
            ..credentials()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("PAAPI__PARTNER_TAG"))
        );
        assert!(config.client_config().is_none());
    }

    #[test]
    fn test_invalid_timeout_and_url() {
        let config = PaapiConfig {
            timeout_ms: 0,
            ..credentials()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidUpstreamTimeout));

        let config = PaapiConfig {
            base_url: "webservices.amazon.com".to_string(),
            ..credentials()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidBaseUrl));
    }

    #[test]
    fn test_client_config_carries_endpoint() {
        let config = PaapiConfig {
            marketplace: "www.amazon.co.uk".to_string(),
            base_url: "https://webservices.amazon.co.uk".to_string(),
            timeout_ms: 2_500,
            ..credentials()
        };
        let client = config.client_config().unwrap();
        assert_eq!(client.partner_tag, "store-20");
        assert_eq!(client.marketplace, "www.amazon.co.uk");
        assert_eq!(client.base_url, "https://webservices.amazon.co.uk");
        assert_eq!(client.timeout, Duration::from_millis(2_500));
    }
}
