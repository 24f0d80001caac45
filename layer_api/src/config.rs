//! Client configuration, either built in code or read from the environment.

use std::time::Duration;

use crate::Error;

/// Production API host.
pub const DEFAULT_HOST: &str = "https://api.layer.com";

/// Request timeout applied by the transport.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const API_TOKEN_VAR: &str = "LAYER_API_TOKEN";
pub const APP_ID_VAR: &str = "LAYER_APP_ID";
pub const HOST_VAR: &str = "LAYER_API_HOST";
pub const TIMEOUT_VAR: &str = "LAYER_TIMEOUT_SECS";

/// Credentials and endpoint settings for a [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bearer token sent in the `Authorization` header.
    pub api_token: String,
    /// Application identifier, embedded in the base URL.
    pub app_id: String,
    /// Scheme and host, without the `/apps/...` suffix.
    pub host: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_token: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            app_id: app_id.into(),
            host: DEFAULT_HOST.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Points the client at a different host. Used for testing with wiremock.
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads `LAYER_API_TOKEN` and `LAYER_APP_ID` (required) plus
    /// `LAYER_API_HOST` and `LAYER_TIMEOUT_SECS` (optional).
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|val| !val.is_empty())
                .ok_or(Error::MissingConfig(key))
        };

        let mut config = Self::new(required(API_TOKEN_VAR)?, required(APP_ID_VAR)?);
        if let Some(host) = lookup(HOST_VAR).filter(|val| !val.is_empty()) {
            config = config.with_host(&host);
        }
        let timeout_secs = lookup(TIMEOUT_VAR)
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT.as_secs());
        Ok(config.with_timeout(Duration::from_secs(timeout_secs)))
    }

    /// `<host>/apps/<app_id>`
    pub fn base_url(&self) -> String {
        format!("{}/apps/{}", self.host, self.app_id)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn base_url_contains_app_id() {
        let config = ClientConfig::new("token", "1234");
        assert_eq!(config.base_url(), "https://api.layer.com/apps/1234");
    }

    #[test]
    fn with_host_strips_trailing_slash() {
        let config = ClientConfig::new("token", "app").with_host("http://localhost:3000/");
        assert_eq!(config.base_url(), "http://localhost:3000/apps/app");
    }

    #[test]
    fn reads_required_and_optional_vars() {
        let config = ClientConfig::from_lookup(lookup(&[
            (API_TOKEN_VAR, "secret"),
            (APP_ID_VAR, "abc"),
            (HOST_VAR, "http://127.0.0.1:9000"),
            (TIMEOUT_VAR, "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_token, "secret");
        assert_eq!(config.app_id, "abc");
        assert_eq!(config.host, "http://127.0.0.1:9000");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn optional_vars_fall_back_to_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            (API_TOKEN_VAR, "secret"),
            (APP_ID_VAR, "abc"),
            (TIMEOUT_VAR, "not-a-number"),
        ]))
        .unwrap();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = ClientConfig::from_lookup(lookup(&[(APP_ID_VAR, "abc")])).unwrap_err();
        assert!(matches!(err, Error::MissingConfig(API_TOKEN_VAR)));

        let err = ClientConfig::from_lookup(lookup(&[(API_TOKEN_VAR, "t"), (APP_ID_VAR, "")]))
            .unwrap_err();
        assert!(matches!(err, Error::MissingConfig(APP_ID_VAR)));
    }
}
