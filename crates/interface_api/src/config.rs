//! API configuration

use serde::Deserialize;
use std::time::Duration;

use core_kernel::{CoreError, Currency, Timezone};
use infra_http::BackendConfig;

/// Prefix of the environment variables read by [`ApiConfig::from_env`]
pub const ENV_PREFIX: &str = "DESK";

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// Base URL of the commissions backend
    pub backend_url: String,
    pub backend_api_key: Option<String>,
    pub backend_timeout_secs: u64,
    pub backend_retry_attempts: u32,
    /// IANA name of the viewer timezone used for "today" and date filters
    pub timezone: String,
    /// ISO code of the currency totals are reported in
    pub currency: String,
    pub cache_ttl_secs: u64,
    /// Log level
    pub log_level: String,
    /// `text` or `json`
    pub log_format: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            backend_url: "http://localhost:3000/api".to_string(),
            backend_api_key: None,
            backend_timeout_secs: 30,
            backend_retry_attempts: 3,
            timezone: "UTC".to_string(),
            currency: "USD".to_string(),
            cache_ttl_secs: 60,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `DESK_`-prefixed environment variables
    ///
    /// Unset variables keep their default value.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("jwt_secret", defaults.jwt_secret)?
            .set_default("backend_url", defaults.backend_url)?
            .set_default("backend_timeout_secs", defaults.backend_timeout_secs)?
            .set_default("backend_retry_attempts", i64::from(defaults.backend_retry_attempts))?
            .set_default("timezone", defaults.timezone)?
            .set_default("currency", defaults.currency)?
            .set_default("cache_ttl_secs", defaults.cache_ttl_secs)?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_format", defaults.log_format)?
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn viewer_timezone(&self) -> Result<Timezone, CoreError> {
        Ok(self.timezone.parse::<Timezone>()?)
    }

    pub fn report_currency(&self) -> Result<Currency, CoreError> {
        Ok(self.currency.parse::<Currency>()?)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    /// Settings for the backend HTTP adapter
    pub fn backend(&self) -> BackendConfig {
        BackendConfig {
            api_key: self.backend_api_key.clone(),
            timeout_secs: self.backend_timeout_secs,
            retry_attempts: self.backend_retry_attempts,
            ..BackendConfig::new(self.backend_url.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        let config = ApiConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.viewer_timezone().unwrap(), Timezone::default());
        assert_eq!(config.report_currency().unwrap(), Currency::USD);
        assert!(!config.json_logs());
    }

    #[test]
    fn test_invalid_timezone_is_configuration_error() {
        let config = ApiConfig {
            timezone: "Mars/Olympus_Mons".to_string(),
            ..Default::default()
        };
        assert!(config.viewer_timezone().is_err());
    }

    #[test]
    fn test_backend_settings() {
        let config = ApiConfig {
            backend_api_key: Some("k".to_string()),
            backend_retry_attempts: 5,
            ..Default::default()
        };
        let backend = config.backend();
        assert_eq!(backend.base_url, "http://localhost:3000/api");
        assert_eq!(backend.api_key.as_deref(), Some("k"));
        assert_eq!(backend.retry_attempts, 5);
    }
}
