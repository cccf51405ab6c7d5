use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::AuthConfig;

const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";

/// The subset of the OIDC discovery document the proxy needs
#[derive(Debug, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    pub token_endpoint: String,
    #[serde(default)]
    pub issuer: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

pub fn discovery_url(issuer: &str) -> String {
    format!("{}{}", issuer.trim_end_matches('/'), DISCOVERY_PATH)
}

/// Fetch the issuer's discovery document
pub async fn discover(client: &Client, issuer: &str) -> AppResult<DiscoveryDocument> {
    let url = discovery_url(issuer);

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| AppError::Discovery(format!("request to {} failed: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Discovery(status.to_string()));
    }

    response
        .json::<DiscoveryDocument>()
        .await
        .map_err(|e| AppError::Discovery(format!("invalid discovery document: {}", e)))
}

/// Exchange the configured username/password for an access token
pub async fn password_grant(
    client: &Client,
    token_endpoint: &str,
    auth: &AuthConfig,
) -> AppResult<TokenResponse> {
    let params = [
        ("grant_type", "password"),
        ("client_id", auth.client_id.as_str()),
        ("username", auth.username.as_str()),
        ("password", auth.password.as_str()),
    ];

    let response = client
        .post(token_endpoint)
        .form(&params)
        .send()
        .await
        .map_err(|e| AppError::Token(format!("request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        let detail: String = error_text.chars().take(200).collect();
        return Err(if detail.is_empty() {
            AppError::Token(status.to_string())
        } else {
            AppError::Token(format!("{}: {}", status, detail))
        });
    }

    let token = response
        .json::<TokenResponse>()
        .await
        .map_err(|e| AppError::Token(format!("token parsing failed: {}", e)))?;

    crate::modules::logger::log_info(&format!(
        "Token exchange successful! access_token: {}, expires in {} seconds",
        crate::modules::logger::redact(&token.access_token),
        token.expires_in
    ));

    Ok(token)
}
