// In-process fakes for the identity provider and terminology server

use axum::{
    extract::{Form, OriginalUri, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use reqwest::Client;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use crate::models::AuthConfig;
use crate::proxy::cache::ResponseCache;
use crate::proxy::upstream::UpstreamClient;
use crate::proxy::{TerminologyProxy, TokenManager};

async fn serve(router: Router, listener: TcpListener) {
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
}

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, format!("http://{}", addr))
}

pub fn auth_config(issuer: &str) -> AuthConfig {
    AuthConfig {
        issuer: issuer.to_string(),
        client_id: "cli_client".to_string(),
        username: "svc-user".to_string(),
        password: "svc-pass".to_string(),
    }
}

#[derive(Clone)]
pub struct IdpBehavior {
    pub discovery_status: StatusCode,
    pub token_status: StatusCode,
    pub expires_in: i64,
    pub token_delay: Duration,
}

impl Default for IdpBehavior {
    fn default() -> Self {
        Self {
            discovery_status: StatusCode::OK,
            token_status: StatusCode::OK,
            expires_in: 3600,
            token_delay: Duration::ZERO,
        }
    }
}

#[derive(Clone)]
struct IdpState {
    base_url: String,
    behavior: IdpBehavior,
    token_status: Arc<AtomicU16>,
    discovery_hits: Arc<AtomicUsize>,
    token_hits: Arc<AtomicUsize>,
    last_form: Arc<Mutex<Option<HashMap<String, String>>>>,
}

pub struct FakeIdp {
    pub base_url: String,
    pub discovery_hits: Arc<AtomicUsize>,
    pub token_hits: Arc<AtomicUsize>,
    token_status: Arc<AtomicU16>,
    last_form: Arc<Mutex<Option<HashMap<String, String>>>>,
}

impl FakeIdp {
    pub async fn start(behavior: IdpBehavior) -> Self {
        let (listener, base_url) = bind().await;
        let state = IdpState {
            base_url: base_url.clone(),
            token_status: Arc::new(AtomicU16::new(behavior.token_status.as_u16())),
            behavior,
            discovery_hits: Arc::new(AtomicUsize::new(0)),
            token_hits: Arc::new(AtomicUsize::new(0)),
            last_form: Arc::new(Mutex::new(None)),
        };

        let router = Router::new()
            .route("/.well-known/openid-configuration", get(idp_discovery))
            .route("/token", post(idp_token))
            .with_state(state.clone());
        serve(router, listener).await;

        Self {
            base_url,
            discovery_hits: state.discovery_hits,
            token_hits: state.token_hits,
            token_status: state.token_status,
            last_form: state.last_form,
        }
    }

    pub fn set_token_status(&self, status: StatusCode) {
        self.token_status.store(status.as_u16(), Ordering::SeqCst);
    }

    pub fn last_form(&self) -> Option<HashMap<String, String>> {
        self.last_form.lock().unwrap().clone()
    }
}

async fn idp_discovery(State(state): State<IdpState>) -> Response {
    state.discovery_hits.fetch_add(1, Ordering::SeqCst);
    if !state.behavior.discovery_status.is_success() {
        return state.behavior.discovery_status.into_response();
    }
    Json(json!({
        "issuer": state.base_url,
        "token_endpoint": format!("{}/token", state.base_url),
    }))
    .into_response()
}

async fn idp_token(
    State(state): State<IdpState>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let n = state.token_hits.fetch_add(1, Ordering::SeqCst) + 1;
    *state.last_form.lock().unwrap() = Some(form);

    if !state.behavior.token_delay.is_zero() {
        tokio::time::sleep(state.behavior.token_delay).await;
    }

    let status = StatusCode::from_u16(state.token_status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if !status.is_success() {
        return (status, Json(json!({ "error": "invalid_grant" }))).into_response();
    }

    Json(json!({
        "access_token": format!("token-{}", n),
        "expires_in": state.behavior.expires_in,
        "token_type": "Bearer",
    }))
    .into_response()
}

#[derive(Clone)]
struct TerminologyState {
    status: Arc<AtomicU16>,
    delay_ms: Arc<AtomicU64>,
    hits: Arc<AtomicUsize>,
    last_authorization: Arc<Mutex<Option<String>>>,
}

pub struct FakeTerminology {
    pub base_url: String,
    pub hits: Arc<AtomicUsize>,
    state: TerminologyState,
}

impl FakeTerminology {
    pub async fn start() -> Self {
        let (listener, base_url) = bind().await;
        let state = TerminologyState {
            status: Arc::new(AtomicU16::new(200)),
            delay_ms: Arc::new(AtomicU64::new(0)),
            hits: Arc::new(AtomicUsize::new(0)),
            last_authorization: Arc::new(Mutex::new(None)),
        };

        let router = Router::new()
            .route("/fhir/*path", get(terminology_lookup))
            .with_state(state.clone());
        serve(router, listener).await;

        Self {
            base_url,
            hits: state.hits.clone(),
            state,
        }
    }

    pub fn set_status(&self, status: StatusCode) {
        self.state.status.store(status.as_u16(), Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state
            .delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn last_authorization(&self) -> Option<String> {
        self.state.last_authorization.lock().unwrap().clone()
    }
}

async fn terminology_lookup(
    State(state): State<TerminologyState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response {
    let n = state.hits.fetch_add(1, Ordering::SeqCst) + 1;
    *state.last_authorization.lock().unwrap() = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let delay = state.delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let status = StatusCode::from_u16(state.status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if !status.is_success() {
        return (status, Json(json!({ "resourceType": "OperationOutcome" }))).into_response();
    }

    let path = uri.path().trim_start_matches("/fhir/").to_string();
    Json(json!({
        "resourceType": "ValueSet",
        "path": path,
        "query": uri.query().unwrap_or_default(),
        "hit": n,
    }))
    .into_response()
}

pub fn build_proxy(
    idp: &FakeIdp,
    server: &FakeTerminology,
    request_timeout: Duration,
) -> TerminologyProxy {
    build_proxy_with_ttl(idp, server, request_timeout, Duration::from_secs(24 * 60 * 60))
}

pub fn build_proxy_with_ttl(
    idp: &FakeIdp,
    server: &FakeTerminology,
    request_timeout: Duration,
    cache_ttl: Duration,
) -> TerminologyProxy {
    let token_manager = Arc::new(TokenManager::new(auth_config(&idp.base_url), Client::new()));
    TerminologyProxy::new(
        Arc::new(ResponseCache::new()),
        token_manager,
        UpstreamClient::new(Client::new(), &server.base_url),
        request_timeout,
        cache_ttl,
    )
}
