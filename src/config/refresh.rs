//! Refresh worker configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::RefreshSettings;
use crate::domain::refresh::RetryPolicy;
use crate::ports::DEFAULT_RESOURCES;

/// Refresh run tunables.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    /// Most products per run
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Products older than this are due
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    /// Overall run budget in seconds; 0 disables the deadline
    #[serde(default = "default_run_deadline_secs")]
    pub run_deadline_secs: u64,

    /// Comma-separated resource paths; defaults to the pricing and
    /// availability set
    pub resources: Option<String>,
}

impl RefreshConfig {
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_hours * 60 * 60)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.base_backoff_ms))
    }

    pub fn run_deadline(&self) -> Option<Duration> {
        (self.run_deadline_secs > 0).then(|| Duration::from_secs(self.run_deadline_secs))
    }

    pub fn resources_list(&self) -> Vec<String> {
        match &self.resources {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_RESOURCES.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Settings for the run handler.
    pub fn settings(&self) -> RefreshSettings {
        RefreshSettings {
            batch_size: self.batch_size,
            stale_after: self.stale_after(),
            retry: self.retry_policy(),
            run_deadline: self.run_deadline(),
            resources: self.resources_list(),
        }
    }

    /// Validate refresh configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.batch_size == 0 || self.batch_size > 100 {
            return Err(ValidationError::InvalidBatchSize);
        }
        if self.stale_after_hours == 0 {
            return Err(ValidationError::InvalidStaleThreshold);
        }
        if self.max_retries > 10 || self.base_backoff_ms == 0 {
            return Err(ValidationError::InvalidRetryPolicy);
        }
        Ok(())
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            stale_after_hours: default_stale_after_hours(),
            max_retries: default_max_retries(),
            base_backoff_ms: default_base_backoff_ms(),
            run_deadline_secs: default_run_deadline_secs(),
            resources: None,
        }
    }
}

fn default_batch_size() -> usize {
    10
}

fn default_stale_after_hours() -> u64 {
    24
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_backoff_ms() -> u64 {
    1_000
}

fn default_run_deadline_secs() -> u64 {
    600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_handler_defaults() {
        assert_eq!(RefreshConfig::default().settings(), RefreshSettings::default());
    }

    #[test]
    fn test_zero_deadline_disables_it() {
        let config = RefreshConfig {
            run_deadline_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.run_deadline(), None);
    }

    #[test]
    fn test_resources_parsing() {
        let config = RefreshConfig {
            resources: Some("ItemInfo.Title, Offers.Listings.Price,".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.resources_list(),
            vec!["ItemInfo.Title".to_string(), "Offers.Listings.Price".to_string()]
        );
    }

    #[test]
    fn test_validation() {
        assert!(RefreshConfig::default().validate().is_ok());

        let config = RefreshConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidBatchSize));

        let config = RefreshConfig {
            base_backoff_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidRetryPolicy));

        let config = RefreshConfig {
            stale_after_hours: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidStaleThreshold));
    }
}
