//! Client configuration for the hosted translation backend
//!
//! Values come from explicit construction or from the environment:
//!
//! | Variable | Default |
//! |---|---|
//! | `SHIPI18N_API_KEY` | required |
//! | `SHIPI18N_API_URL` | `https://api.shipi18n.com` |
//! | `SHIPI18N_TIMEOUT_SECS` | `30` |
//! | `SHIPI18N_MAX_BATCH_SIZE` | `100` |

use crate::mt::error::{MtError, MtResult};
use std::time::Duration;

pub const API_KEY_VAR: &str = "SHIPI18N_API_KEY";
pub const BASE_URL_VAR: &str = "SHIPI18N_API_URL";
pub const TIMEOUT_VAR: &str = "SHIPI18N_TIMEOUT_SECS";
pub const MAX_BATCH_SIZE_VAR: &str = "SHIPI18N_MAX_BATCH_SIZE";

pub const DEFAULT_BASE_URL: &str = "https://api.shipi18n.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// Key shipped in the sample `.env`; never a real credential
const TEMPLATE_API_KEY: &str = "sk_live_your_api_key_here";

#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_batch_size: usize,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    /// Load from the process environment
    pub fn from_env() -> MtResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup and validate the result
    pub fn from_lookup<F>(lookup: F) -> MtResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .ok_or_else(|| MtError::Config(format!("{} environment variable not set", API_KEY_VAR)))?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup(BASE_URL_VAR).filter(|v| !v.trim().is_empty()) {
            config.base_url = base_url;
        }
        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                MtError::Config(format!("{} must be a whole number of seconds, got '{}'", TIMEOUT_VAR, raw))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup(MAX_BATCH_SIZE_VAR) {
            config.max_batch_size = raw.trim().parse::<usize>().map_err(|_| {
                MtError::Config(format!("{} must be a positive integer, got '{}'", MAX_BATCH_SIZE_VAR, raw))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Fail fast on settings that can never produce a working client
    pub fn validate(&self) -> MtResult<()> {
        let key = self.api_key.trim();
        if key.is_empty() {
            return Err(MtError::Config("API key cannot be empty".to_string()));
        }
        if key == TEMPLATE_API_KEY {
            return Err(MtError::Config(
                "API key is still the sample value; set a real key".to_string(),
            ));
        }

        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| MtError::Config(format!("Invalid base URL '{}': {}", self.base_url, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(MtError::Config(format!(
                "Base URL must use http or https: {}",
                self.base_url
            )));
        }

        if self.max_batch_size == 0 {
            return Err(MtError::Config("Batch size must be at least 1".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(MtError::Config("Timeout must be greater than zero".to_string()));
        }

        Ok(())
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_batch_size", &self.max_batch_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("test-api-key");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_batch_size, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_reads_all_variables() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (API_KEY_VAR, "my-secret-key"),
            (BASE_URL_VAR, "https://custom.api.com"),
            (TIMEOUT_VAR, "5"),
            (MAX_BATCH_SIZE_VAR, "10"),
        ]))
        .unwrap();

        assert_eq!(config.api_key, "my-secret-key");
        assert_eq!(config.base_url, "https://custom.api.com");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_batch_size, 10);
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let result = ClientConfig::from_lookup(lookup_from(&[]));
        match result {
            Err(MtError::Config(msg)) => assert!(msg.contains(API_KEY_VAR)),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_and_template_keys_rejected() {
        assert!(ClientConfig::new("").validate().is_err());
        assert!(ClientConfig::new("   ").validate().is_err());
        assert!(ClientConfig::new("sk_live_your_api_key_here").validate().is_err());
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let config = ClientConfig::new("key").with_base_url("not a url");
        assert!(matches!(config.validate(), Err(MtError::Config(_))));

        let config = ClientConfig::new("key").with_base_url("ftp://files.example.com");
        assert!(matches!(config.validate(), Err(MtError::Config(_))));
    }

    #[test]
    fn test_bad_numbers_rejected() {
        let result = ClientConfig::from_lookup(lookup_from(&[
            (API_KEY_VAR, "key"),
            (TIMEOUT_VAR, "soon"),
        ]));
        assert!(matches!(result, Err(MtError::Config(_))));

        assert!(ClientConfig::new("key").with_max_batch_size(0).validate().is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ClientConfig::new("super-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("***"));
    }
}
