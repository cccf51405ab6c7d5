use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

use crate::error::{AppError, AppResult};
use crate::models::AuthConfig;
use crate::modules::oidc;

/// The one access token held by the process
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: Instant,
}

impl AccessToken {
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Owns the proxy's credential and keeps a valid access token available
///
/// Refreshes are serialized: callers that find the token expired queue on
/// `refresh_lock` and re-check after acquiring it, so a burst of callers
/// results in a single discovery + token exchange.
pub struct TokenManager {
    auth: AuthConfig,
    http_client: Client,
    current: RwLock<Option<AccessToken>>,
    refresh_lock: Mutex<()>,
}

impl TokenManager {
    /// Create new TokenManager
    pub fn new(auth: AuthConfig, http_client: Client) -> Self {
        Self {
            auth,
            http_client,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Return a token that is valid right now, refreshing it if needed
    pub async fn get_valid_token(&self) -> AppResult<String> {
        // 1. Fast path
        if let Some(value) = self.usable_token().await {
            return Ok(value);
        }

        // 2. Slow path, one refresh at a time
        let _guard = self.refresh_lock.lock().await;

        // 3. Someone else may have refreshed while we waited
        if let Some(value) = self.usable_token().await {
            tracing::debug!("Token refreshed by a concurrent caller, reusing it");
            return Ok(value);
        }

        // 4. Discovery + password grant
        tracing::info!("Access token missing or expired, refreshing...");
        let discovery = oidc::discover(&self.http_client, &self.auth.issuer).await?;
        let response =
            oidc::password_grant(&self.http_client, &discovery.token_endpoint, &self.auth).await?;

        // 5. Replace, never mutate in place
        let expires_in = Duration::from_secs(response.expires_in.max(0) as u64);
        let expires_at = Instant::now().checked_add(expires_in).ok_or_else(|| {
            AppError::Token(format!("invalid expires_in: {}", response.expires_in))
        })?;
        let token = AccessToken {
            value: response.access_token,
            expires_at,
        };
        let value = token.value.clone();
        *self.current.write().await = Some(token);

        Ok(value)
    }

    /// Whether a usable token is currently held
    pub async fn has_valid_token(&self) -> bool {
        self.usable_token().await.is_some()
    }

    async fn usable_token(&self) -> Option<String> {
        let current = self.current.read().await;
        current
            .as_ref()
            .filter(|token| token.is_valid_at(Instant::now()))
            .map(|token| token.value.clone())
    }
}
