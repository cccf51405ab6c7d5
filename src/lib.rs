pub mod error;
pub mod models;
pub mod modules;
pub mod proxy; // Proxy service module
mod utils;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use modules::logger;
use proxy::upstream::UpstreamClient;
use proxy::{AxumServer, ResponseCache, TerminologyProxy, TokenManager};
use tracing::info;

/// Wire the proxy together from configuration
pub fn build_proxy(config: &models::AppConfig) -> TerminologyProxy {
    let proxy_config = &config.proxy;

    // Discovery and token exchange get an overall client timeout; terminology
    // fetches are bounded per request instead.
    let auth_client = utils::http::create_client_with_proxy(
        Some(std::time::Duration::from_secs(proxy_config.auth_timeout_secs)),
        Some(&proxy_config.upstream_proxy),
    );
    let upstream_client =
        utils::http::create_client_with_proxy(None, Some(&proxy_config.upstream_proxy));

    TerminologyProxy::new(
        Arc::new(ResponseCache::new()),
        Arc::new(TokenManager::new(config.auth.clone(), auth_client)),
        UpstreamClient::new(upstream_client, proxy_config.terminology_base_url.clone()),
        proxy_config.request_timeout(),
        proxy_config.cache_ttl(),
    )
}

/// Load config, start the proxy and serve until Ctrl-C
pub async fn run() -> anyhow::Result<()> {
    // `.env` may carry RUST_LOG, so it has to be loaded before the subscriber
    let dotenv_path = modules::load_dotenv();
    logger::init_logger();
    if let Some(path) = dotenv_path {
        tracing::debug!("Loaded environment from {:?}", path);
    }

    let config = modules::load_app_config()?;
    config.validate()?;
    info!(
        "Proxying {} as {:?}",
        config.proxy.terminology_base_url, config.auth
    );

    let proxy = Arc::new(build_proxy(&config));
    let (server, handle) = AxumServer::start(&config.proxy, proxy)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start Axum server: {}", e))?;

    tokio::signal::ctrl_c().await?;
    logger::log_warn("Shutdown requested");
    server.stop();
    handle.await?;

    Ok(())
}
