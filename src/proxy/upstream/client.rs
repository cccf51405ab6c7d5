// Upstream terminology client
// Every fetch is bounded by its own deadline; dropping the future cancels the request

use reqwest::{header, Client};
use serde_json::Value;
use std::time::Duration;

use crate::error::{AppError, AppResult};

pub struct UpstreamClient {
    http_client: Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(http_client: Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the upstream URL for a lookup
    ///
    /// `path` and `query` are used verbatim; the result doubles as the cache key.
    pub fn build_url(&self, path: &str, query: Option<&str>) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        match query {
            Some(qs) if !qs.is_empty() => format!("{}/fhir/{}?{}", base, path, qs),
            _ => format!("{}/fhir/{}", base, path),
        }
    }

    /// Reject lookups whose normalized URL escapes `{base}/fhir/`
    ///
    /// Dot segments (`..`, `%2e%2e`, backslash variants) are resolved by URL
    /// parsing, so the check runs on the parsed form, not the raw path.
    pub fn ensure_within_fhir(&self, url: &str) -> AppResult<()> {
        let base = url::Url::parse(&self.base_url)
            .map_err(|e| AppError::InvalidRequest(format!("invalid base URL: {}", e)))?;
        let target = url::Url::parse(url)
            .map_err(|e| AppError::InvalidRequest(format!("invalid lookup URL: {}", e)))?;

        let fhir_root = format!("{}/fhir/", base.path().trim_end_matches('/'));
        let same_origin = base.origin() == target.origin();
        if !same_origin || !target.path().starts_with(&fhir_root) {
            return Err(AppError::InvalidRequest(format!(
                "lookup path resolves outside {}: {}",
                fhir_root,
                target.path()
            )));
        }
        Ok(())
    }

    /// GET a terminology resource as JSON
    pub async fn fetch_json(
        &self,
        url: &str,
        access_token: &str,
        timeout: Duration,
    ) -> AppResult<Value> {
        let request = async {
            let response = self
                .http_client
                .get(url)
                .bearer_auth(access_token)
                .header(header::ACCEPT, "application/fhir+json, application/json")
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(AppError::Upstream(status.to_string()));
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| AppError::InvalidResponse(format!("Parse json failed: {}", e)))
        };

        match tokio::time::timeout(timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(timeout)),
        }
    }
}
