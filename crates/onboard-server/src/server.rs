//! `OnboardServer`: Axum HTTP + WebSocket server.

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use metrics::counter;
use metrics_exporter_prometheus::PrometheusHandle;
use onboard_auth::{AuthError, Identity, IdentityProvider, WEBSOCKETS};
use onboard_core::ClientId;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::actions::{ActionRegistry, ServerContext, register_all};
use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::metrics::WS_REJECTIONS_TOTAL;
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::connection::Session;
use crate::websocket::registry::ConnectionRegistry;
use crate::websocket::session::{SessionShared, run_client_session};

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Everything a session task needs.
    pub shared: Arc<SessionShared>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// When the server started.
    pub start_time: Instant,
    /// Renders `/metrics`; absent when no recorder is attached.
    pub metrics: Option<PrometheusHandle>,
}

/// The onboarding server.
pub struct OnboardServer {
    config: Arc<ServerConfig>,
    services: ServerContext,
    actions: ActionRegistry,
    registry: Arc<ConnectionRegistry>,
    shutdown: Arc<ShutdownCoordinator>,
    metrics: Option<PrometheusHandle>,
    start_time: Instant,
}

impl OnboardServer {
    /// Create a server with the built-in actions.
    pub fn new(config: ServerConfig, services: ServerContext) -> Self {
        let mut actions = ActionRegistry::new().with_timeout(config.handler_timeout());
        register_all(&mut actions);
        Self {
            registry: Arc::new(ConnectionRegistry::new(config.max_connections)),
            config: Arc::new(config),
            services,
            actions,
            shutdown: Arc::new(ShutdownCoordinator::new()),
            metrics: None,
            start_time: Instant::now(),
        }
    }

    /// Replace the action handlers.
    #[must_use]
    pub fn with_actions(mut self, actions: ActionRegistry) -> Self {
        self.actions = actions;
        self
    }

    /// Serve `/metrics` from `handle`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Build the Axum router. Consumes the action registry.
    pub fn router(&mut self) -> Router {
        let actions = std::mem::take(&mut self.actions);
        let state = AppState {
            shared: Arc::new(SessionShared {
                registry: Arc::clone(&self.registry),
                actions: Arc::new(actions),
                services: self.services.clone(),
                shutdown: self.shutdown.token(),
                ping_interval: self.config.ping_interval(),
            }),
            config: Arc::clone(&self.config),
            start_time: self.start_time,
            metrics: self.metrics.clone(),
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .route("/ws/client", get(ws_handler))
            .with_state(state)
            .layer(cors_layer(&self.config.origins))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind and serve in the background until shutdown.
    ///
    /// Returns the bound address (useful with port `0`) and the server task.
    pub async fn listen(mut self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let router = self.router();
        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;
        let addr = listener.local_addr()?;
        info!(%addr, "onboard server listening");

        let token = self.shutdown.token();
        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await;
            if let Err(e) = result {
                error!(error = %e, "server error");
            }
            info!("onboard server stopped");
        });
        Ok((addr, handle))
    }

    /// Live session registry.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Action handlers not yet handed to a router.
    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connections = state.shared.registry.count().await;
    Json(health::health_check(
        state.start_time,
        connections,
        state.shared.registry.max_connections(),
    ))
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Query string of `/ws/client`.
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    /// Client-chosen UUID.
    pub client_id: String,
    /// Bearer token; the `Authorization` header is used when absent.
    #[serde(default)]
    pub token: Option<String>,
}

/// GET /ws/client?client_id=<uuid>&token=<jwt>
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    let Ok(client_id) = ClientId::from_str(&params.client_id) else {
        reject("invalid_client_id");
        return (StatusCode::BAD_REQUEST, "client_id must be a UUID").into_response();
    };

    let token = params.token.or_else(|| bearer_from_headers(&headers));
    let identity = match authorize(
        state.config.require_auth,
        state.shared.services.identity.as_deref(),
        token.as_deref(),
    )
    .await
    {
        Ok(identity) => identity,
        Err(e) => {
            debug!(%client_id, error = %e, "websocket auth failed");
            reject("unauthorized");
            return (StatusCode::UNAUTHORIZED, e.to_string()).into_response();
        }
    };

    let registry = &state.shared.registry;
    if registry.count().await >= registry.max_connections() {
        reject("at_capacity");
        return (StatusCode::SERVICE_UNAVAILABLE, "connection limit reached").into_response();
    }

    let (tx, rx) = mpsc::channel(state.config.send_queue_capacity);
    let session = Arc::new(Session::new(client_id, identity, tx));
    let shared = Arc::clone(&state.shared);
    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| async move {
            let end = run_client_session(socket, session, rx, shared).await;
            debug!(%client_id, state = ?end, "session task finished");
        })
}

fn reject(reason: &'static str) {
    counter!(WS_REJECTIONS_TOTAL, "reason" => reason).increment(1);
}

fn bearer_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_owned)
}

/// Resolve the identity a websocket opens with.
///
/// With `require_auth` the token must verify and carry `websockets`.
/// Without it a verifiable token still names the user, and anything else
/// connects anonymously.
pub async fn authorize(
    require_auth: bool,
    provider: Option<&dyn IdentityProvider>,
    token: Option<&str>,
) -> Result<Identity, AuthError> {
    let verified = match (provider, token) {
        (Some(provider), Some(token)) => Some(provider.authenticate(token, &[WEBSOCKETS]).await),
        _ => None,
    };
    match verified {
        Some(Ok(identity)) => Ok(identity),
        Some(Err(e)) if require_auth => Err(e),
        None if require_auth => Err(AuthError::Credentials),
        Some(Err(_)) | None => Ok(Identity::anonymous()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_helpers::{SECRET, identity_provider};
    use crate::metrics::detached_handle;
    use assert_matches::assert_matches;
    use axum::body::Body;
    use axum::http::Request;
    use onboard_auth::TokenIssuer;
    use tower::ServiceExt;

    fn make_server() -> OnboardServer {
        OnboardServer::new(ServerConfig::default(), ServerContext::default())
    }

    async fn get_status(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        (status, body.to_vec())
    }

    fn token(scopes: &[&str]) -> String {
        let scopes: Vec<String> = scopes.iter().map(|s| (*s).to_owned()).collect();
        TokenIssuer::hs256(SECRET, 15)
            .create_access_token("alice", &scopes, None)
            .unwrap()
    }

    // ── Server ──

    #[test]
    fn builtin_actions_registered() {
        let server = make_server();
        assert_eq!(
            server.actions().actions(),
            vec!["email_verification", "employee_info", "server_stats", "token_data"]
        );
    }

    #[test]
    fn shutdown_coordinator_accessible() {
        assert!(!make_server().shutdown().is_shutting_down());
    }

    #[tokio::test]
    async fn registry_starts_empty() {
        let server = make_server();
        assert_eq!(server.registry().count().await, 0);
        assert_eq!(server.registry().max_connections(), 1024);
    }

    // ── Routes ──

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let (status, body) = get_status(make_server().router(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["status"], "ok");
        assert_eq!(parsed["connections"], 0);
        assert_eq!(parsed["accepting"], true);
    }

    #[tokio::test]
    async fn metrics_without_handle_is_404() {
        let (status, _) = get_status(make_server().router(), "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_with_handle_renders() {
        let mut server = make_server().with_metrics(detached_handle());
        let (status, _) = get_status(server.router(), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn ws_without_upgrade_is_rejected() {
        let uri = format!("/ws/client?client_id={}", ClientId::new());
        let (status, _) = get_status(make_server().router(), &uri).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let (status, _) = get_status(make_server().router(), "/nonexistent").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    // ── Authorization ──

    #[tokio::test]
    async fn required_auth_accepts_websockets_token() {
        let provider = identity_provider();
        let jwt = token(&["websockets"]);
        let id = authorize(true, Some(&*provider), Some(jwt.as_str()))
            .await
            .unwrap();
        assert_eq!(id.username, "alice");
    }

    #[tokio::test]
    async fn required_auth_rejects_missing_token() {
        let provider = identity_provider();
        assert_matches!(
            authorize(true, Some(&*provider), None).await,
            Err(AuthError::Credentials)
        );
        assert_matches!(authorize(true, None, Some("x")).await, Err(AuthError::Credentials));
    }

    #[tokio::test]
    async fn required_auth_rejects_wrong_scope() {
        let provider = identity_provider();
        let jwt = token(&["user:own"]);
        assert!(
            authorize(true, Some(&*provider), Some(jwt.as_str()))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn optional_auth_falls_back_to_anonymous() {
        let provider = identity_provider();
        let id = authorize(false, Some(&*provider), Some("garbage"))
            .await
            .unwrap();
        assert_eq!(id, Identity::anonymous());
        let id = authorize(false, None, None).await.unwrap();
        assert_eq!(id, Identity::anonymous());
    }

    #[test]
    fn bearer_header_parsed() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_from_headers(&headers).as_deref(), Some("abc"));
        assert!(bearer_from_headers(&HeaderMap::new()).is_none());
    }
}
