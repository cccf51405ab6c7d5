// Request logging middleware
use axum::{extract::Request, middleware::Next, response::Response};
use tracing::Instrument;

/// Tag each request with an id and log its outcome
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = std::time::Instant::now();

    let span = tracing::info_span!("request", id = %request_id);
    let response = next.run(request).instrument(span.clone()).await;

    span.in_scope(|| {
        tracing::info!(
            "{} {} -> {} ({}ms)",
            method,
            uri,
            response.status().as_u16(),
            started.elapsed().as_millis()
        );
    });

    response
}
