use crate::error::{AppError, AppResult};
use crate::proxy::ProxyConfig;
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Identity provider settings and the single credential pair used for the password grant
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            client_id: default_client_id(),
            username: String::new(),
            password: String::new(),
        }
    }
}

// Keep the password out of logs
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("issuer", &self.issuer)
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn default_issuer() -> String {
    "https://auth.example.org/realms/terminology".to_string()
}

fn default_client_id() -> String {
    "cli_client".to_string()
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject configurations the proxy cannot run with
    pub fn validate(&self) -> AppResult<()> {
        if self.auth.username.is_empty() || self.auth.password.is_empty() {
            return Err(AppError::Config(
                "Terminology credentials (username/password) are not set".to_string(),
            ));
        }

        url::Url::parse(&self.auth.issuer)
            .map_err(|e| AppError::Config(format!("Invalid issuer URL {}: {}", self.auth.issuer, e)))?;

        url::Url::parse(&self.proxy.terminology_base_url).map_err(|e| {
            AppError::Config(format!(
                "Invalid terminology base URL {}: {}",
                self.proxy.terminology_base_url, e
            ))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_credentials() -> AppConfig {
        let mut config = AppConfig::new();
        config.auth.username = "svc".to_string();
        config.auth.password = "secret".to_string();
        config
    }

    #[test]
    fn test_validate_requires_credentials() {
        let err = AppConfig::new().validate().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(with_credentials().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let mut config = with_credentials();
        config.proxy.terminology_base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = with_credentials();
        config.auth.issuer = "::".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", with_credentials().auth);
        assert!(rendered.contains("svc"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"auth":{"username":"u","password":"p"}}"#).unwrap();
        assert_eq!(config.auth.client_id, "cli_client");
        assert_eq!(config.proxy.port, 8045);
    }
}
