//! Client configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the API client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL for the block service (e.g., "https://api.blocksync.app").
    pub api_base_url: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Platform tag reported during auth ("macos", "linux", "ios", ...).
    pub platform: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.blocksync.app".to_string(),
            request_timeout_secs: 30,
            platform: std::env::consts::OS.to_string(),
        }
    }
}

impl ClientConfig {
    /// Builds a config from the environment, honoring the `BLOCKSYNC_DOMAIN`
    /// base-URL override used by staging and local deployments.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(domain) = std::env::var("BLOCKSYNC_DOMAIN") {
            if !domain.is_empty() {
                config.api_base_url = domain;
            }
        }
        config
    }

    /// Creates a config pointed at a local test server.
    #[cfg(test)]
    pub fn test(base_url: &str) -> Self {
        Self {
            api_base_url: base_url.to_string(),
            request_timeout_secs: 5,
            platform: "test".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_production() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, "https://api.blocksync.app");
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_config_uses_the_given_base_url() {
        let config = ClientConfig::test("http://127.0.0.1:9000");
        assert_eq!(config.api_base_url, "http://127.0.0.1:9000");
        assert_eq!(config.platform, "test");
    }
}
