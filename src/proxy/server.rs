use crate::proxy::config::ProxyConfig;
use crate::proxy::TerminologyProxy;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Axum application state
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<TerminologyProxy>,
    pub port: u16,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

/// Build the inbound router
pub fn build_router(state: AppState) -> Router {
    use crate::proxy::handlers::terminology;

    Router::new()
        .route("/api/terminology/*path", get(terminology::handle_lookup))
        .route("/status", get(terminology::handle_status))
        .route("/healthz", get(terminology::handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(
            crate::proxy::middleware::logging_middleware,
        ))
        .layer(crate::proxy::middleware::cors_layer())
        .with_state(state)
}

/// Axum server instance
pub struct AxumServer {
    shutdown_tx: Option<oneshot::Sender<()>>,
    sweeper: Option<tokio::task::JoinHandle<()>>,
    local_addr: SocketAddr,
}

impl AxumServer {
    /// Start Axum server
    pub async fn start(
        config: &ProxyConfig,
        proxy: Arc<TerminologyProxy>,
    ) -> Result<(Self, tokio::task::JoinHandle<()>), String> {
        // Bind address
        let addr = format!("{}:{}", config.get_bind_address(), config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| format!("Failed to bind address {}: {}", addr, e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let state = AppState {
            proxy: proxy.clone(),
            port: local_addr.port(),
            started_at: chrono::Utc::now(),
        };
        let app = build_router(state);

        tracing::info!("Terminology proxy started at http://{}", local_addr);

        let sweeper = (config.cache_sweep_interval_secs > 0).then(|| {
            spawn_cache_sweeper(
                proxy.clone(),
                Duration::from_secs(config.cache_sweep_interval_secs),
            )
        });

        // Create shutdown channel
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        // Start server in new task
        let handle = tokio::spawn(async move {
            use hyper::server::conn::http1;
            use hyper_util::rt::TokioIo;
            use hyper_util::service::TowerToHyperService;

            loop {
                tokio::select! {
                    res = listener.accept() => {
                        match res {
                            Ok((stream, _)) => {
                                let io = TokioIo::new(stream);
                                let service = TowerToHyperService::new(app.clone());

                                tokio::task::spawn(async move {
                                    if let Err(err) = http1::Builder::new()
                                        .serve_connection(io, service)
                                        .await
                                    {
                                        debug!("Connection handling finished or errored: {:?}", err);
                                    }
                                });
                            }
                            Err(e) => {
                                error!("Failed to accept connection: {:?}", e);
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::info!("Terminology proxy stopped listening");
                        break;
                    }
                }
            }
        });

        Ok((
            Self {
                shutdown_tx: Some(shutdown_tx),
                sweeper,
                local_addr,
            },
            handle,
        ))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop server
    pub fn stop(mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Periodically drop expired cache entries
fn spawn_cache_sweeper(
    proxy: Arc<TerminologyProxy>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let purged = proxy.cache().purge_expired(std::time::Instant::now());
            if purged > 0 {
                tracing::info!("Purged {} expired cache entries", purged);
            }
        }
    })
}
