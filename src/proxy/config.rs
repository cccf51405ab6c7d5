use serde::{Deserialize, Serialize};

/// Proxy service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Whether LAN access is allowed
    /// - false: bind 127.0.0.1 only (default)
    /// - true: bind 0.0.0.0
    #[serde(default)]
    pub allow_lan_access: bool,

    /// Listening port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Terminology server base URL (the `/fhir/...` path is appended per request)
    #[serde(default = "default_terminology_base_url")]
    pub terminology_base_url: String,

    /// Upstream terminology fetch timeout (milliseconds)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// How long a successful terminology response stays cached (seconds)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Interval for purging expired cache entries (seconds), 0 disables sweeping
    #[serde(default)]
    pub cache_sweep_interval_secs: u64,

    /// Timeout for OIDC discovery and token exchange (seconds)
    #[serde(default = "default_auth_timeout_secs")]
    pub auth_timeout_secs: u64,

    /// Outbound proxy configuration
    #[serde(default)]
    pub upstream_proxy: UpstreamProxyConfig,
}

/// Outbound proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpstreamProxyConfig {
    /// Whether enabled
    pub enabled: bool,
    /// Proxy address (http://, https://, socks5://)
    pub url: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            allow_lan_access: false,
            port: default_port(),
            terminology_base_url: default_terminology_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_sweep_interval_secs: 0,
            auth_timeout_secs: default_auth_timeout_secs(),
            upstream_proxy: UpstreamProxyConfig::default(),
        }
    }
}

fn default_port() -> u16 {
    8045
}

fn default_terminology_base_url() -> String {
    "https://terminology.example.org".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_cache_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_auth_timeout_secs() -> u64 {
    15
}

impl ProxyConfig {
    /// Get the actual listening address
    pub fn get_bind_address(&self) -> &str {
        if self.allow_lan_access {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        }
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_timeout_ms)
    }

    pub fn cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cache_ttl_secs)
    }
}
