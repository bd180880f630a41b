//! Local forwarding proxy for the platform API.
//!
//! Browser-based callers cannot reach the platform directly because of
//! cross-origin restrictions. This server accepts any method under a path
//! prefix (default `/api`), rewrites the prefix to the upstream API base and
//! relays the upstream status code and JSON body. Transport failures and
//! non-JSON upstream bodies become `500 {"error": "Proxy server error"}`.

use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use actorbench_api::validate_base_url;
use actorbench_util::redact_sensitive;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3001";
pub const DEFAULT_PREFIX: &str = "/api";

/// Body returned whenever forwarding fails.
const PROXY_ERROR_MESSAGE: &str = "Proxy server error";

/// Request headers that describe the client connection rather than the
/// request and are never forwarded. The upstream client negotiates its own
/// content encoding and decodes the body before it is relayed.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "accept-encoding",
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("invalid proxy bind address '{address}': {reason}")]
    BindAddress { address: String, reason: String },
    #[error("invalid upstream: {0}")]
    Upstream(#[from] actorbench_api::ApiError),
    #[error("failed to bind proxy listener: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("proxy server task failed: {0}")]
    Task(String),
}

/// Failure while forwarding one request.
#[derive(Debug)]
struct ForwardError(String);

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        warn!(error = %self.0, "proxy forwarding failed");
        (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(json!({ "error": PROXY_ERROR_MESSAGE }))).into_response()
    }
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub bind_address: SocketAddr,
    /// API base that replaces the prefix, e.g. `https://api.apify.com/v2`.
    pub upstream: String,
    pub prefix: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
struct ProxyState {
    client: reqwest::Client,
    upstream: String,
    prefix: String,
}

/// Host configuration for a forwarding proxy instance.
#[derive(Debug, Clone)]
pub struct ForwardingProxy {
    config: ProxyConfig,
}

impl ForwardingProxy {
    pub fn new(config: ProxyConfig) -> Self {
        Self { config }
    }

    /// Builds the router without binding, for embedding and tests.
    pub fn router(&self) -> Result<Router, ProxyError> {
        validate_base_url(&self.config.upstream)?;
        let client = reqwest::Client::builder().timeout(self.config.timeout).build()?;
        let prefix = normalize_prefix(&self.config.prefix);
        let state = ProxyState {
            client,
            upstream: self.config.upstream.trim_end_matches('/').to_string(),
            prefix: prefix.clone(),
        };

        Ok(Router::new()
            .route(&format!("{prefix}/{{*path}}"), any(forward))
            .layer(build_cors_layer())
            .with_state(state))
    }

    /// Starts the server and returns a handle for shutdown.
    pub async fn start(self) -> Result<RunningProxy, ProxyError> {
        let router = self.router()?;
        let cancellation_token = CancellationToken::new();
        let listener = tokio::net::TcpListener::bind(self.config.bind_address).await?;
        let bound_address = listener.local_addr()?;
        info!(address = %bound_address, upstream = %self.config.upstream, prefix = %self.config.prefix, "proxy listening");

        let server_handle = tokio::spawn({
            let shutdown = cancellation_token.child_token();
            async move {
                if let Err(error) = axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        shutdown.cancelled().await;
                    })
                    .await
                {
                    warn!(error = %error, "proxy server exited with an error");
                }
            }
        });

        Ok(RunningProxy {
            bind_address: bound_address,
            cancellation_token,
            server_handle,
        })
    }
}

/// Runtime handle for a running proxy.
#[derive(Debug)]
pub struct RunningProxy {
    bind_address: SocketAddr,
    cancellation_token: CancellationToken,
    server_handle: JoinHandle<()>,
}

impl RunningProxy {
    pub fn bound_address(&self) -> SocketAddr {
        self.bind_address
    }

    /// Stops accepting connections and waits for in-flight requests.
    pub async fn stop(self) -> Result<(), ProxyError> {
        self.cancellation_token.cancel();
        self.wait().await
    }

    /// Waits until the server exits after its token is cancelled.
    async fn wait(self) -> Result<(), ProxyError> {
        self.server_handle
            .await
            .map_err(|error| ProxyError::Task(error.to_string()))?;
        info!("proxy stopped");
        Ok(())
    }
}

/// Parses a bind address and requires a loopback interface.
pub fn resolve_bind_address(bind_address: Option<&str>) -> Result<SocketAddr, ProxyError> {
    let address = bind_address.unwrap_or(DEFAULT_BIND_ADDRESS);
    let parsed: SocketAddr = address.parse().map_err(|error: std::net::AddrParseError| ProxyError::BindAddress {
        address: address.to_string(),
        reason: error.to_string(),
    })?;
    if !is_loopback(parsed.ip()) {
        return Err(ProxyError::BindAddress {
            address: address.to_string(),
            reason: "the proxy must bind to a loopback address".to_string(),
        });
    }
    Ok(parsed)
}

fn is_loopback(address: IpAddr) -> bool {
    match address {
        IpAddr::V4(ip) => ip.is_loopback(),
        IpAddr::V6(ip) => ip.is_loopback(),
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn build_cors_layer() -> CorsLayer {
    CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
}

/// Maps a request URI under `prefix` onto the upstream base, keeping the
/// query string.
fn upstream_url(upstream: &str, prefix: &str, uri: &Uri) -> String {
    let path = uri.path().strip_prefix(prefix).unwrap_or(uri.path());
    match uri.query() {
        Some(query) => format!("{upstream}{path}?{query}"),
        None => format!("{upstream}{path}"),
    }
}

fn forwarded_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if HOP_BY_HOP_HEADERS.contains(&name.as_str()) {
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }
    if !forwarded.contains_key(header::CONTENT_TYPE) {
        forwarded.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
    }
    forwarded
}

async fn forward(
    State(state): State<ProxyState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ForwardError> {
    let start = Instant::now();
    let url = upstream_url(&state.upstream, &state.prefix, &uri);
    let logged_url = redact_sensitive(&url);
    debug!(%method, url = %logged_url, "forwarding request");

    let mut request = state.client.request(method.clone(), &url).headers(forwarded_headers(&headers));
    if method != Method::GET && method != Method::HEAD && !body.is_empty() {
        request = request.body(body);
    }

    let response = request
        .send()
        .await
        .map_err(|error| ForwardError(redact_sensitive(&error.to_string())))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|error| ForwardError(redact_sensitive(&error.to_string())))?;
    let value: Value =
        serde_json::from_str(&text).map_err(|error| ForwardError(format!("upstream body is not JSON: {error}")))?;

    debug!(
        %method,
        url = %logged_url,
        status = status.as_u16(),
        duration_ms = start.elapsed().as_millis(),
        "forwarded request"
    );
    Ok((status, axum::Json(value)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::routing::get;

    async fn echo(method: Method, Path(rest): Path<String>, uri: Uri, headers: HeaderMap, body: Bytes) -> (StatusCode, axum::Json<Value>) {
        let status = if rest.starts_with("missing") {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::OK
        };
        (
            status,
            axum::Json(json!({
                "method": method.as_str(),
                "path": uri.path(),
                "query": uri.query(),
                "marker": headers.get("x-marker").and_then(|value| value.to_str().ok()),
                "host": headers.get("host").and_then(|value| value.to_str().ok()),
                "body": String::from_utf8_lossy(&body),
            })),
        )
    }

    async fn plain_text() -> &'static str {
        "<html>not json</html>"
    }

    async fn spawn_compressed_upstream() -> String {
        let router = Router::new()
            .route("/v2/{*rest}", any(echo))
            .layer(tower_http::compression::CompressionLayer::new());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{address}/v2")
    }

    async fn spawn_upstream() -> String {
        let router = Router::new()
            .route("/v2/html", get(plain_text))
            .route("/v2/{*rest}", any(echo));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{address}/v2")
    }

    async fn start_proxy(upstream: String) -> RunningProxy {
        ForwardingProxy::new(ProxyConfig {
            bind_address: resolve_bind_address(Some("127.0.0.1:0")).expect("address"),
            upstream,
            prefix: DEFAULT_PREFIX.to_string(),
            timeout: Duration::from_secs(5),
        })
        .start()
        .await
        .expect("proxy")
    }

    #[tokio::test]
    async fn forwards_method_path_query_headers_and_body() {
        let proxy = start_proxy(spawn_upstream().await).await;
        let base = format!("http://{}", proxy.bound_address());

        let response = reqwest::Client::new()
            .post(format!("{base}/api/acts/abc/runs?token=t0k"))
            .header("x-marker", "kept")
            .body(r#"{"maxConcurrency":5}"#)
            .send()
            .await
            .expect("response");

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let echoed: Value = response.json().await.expect("json");
        assert_eq!(echoed["method"], "POST");
        assert_eq!(echoed["path"], "/v2/acts/abc/runs");
        assert_eq!(echoed["query"], "token=t0k");
        assert_eq!(echoed["marker"], "kept");
        assert_ne!(echoed["host"], json!(proxy.bound_address().to_string()));
        assert_eq!(echoed["body"], r#"{"maxConcurrency":5}"#);

        proxy.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn browser_accept_encoding_still_yields_json() {
        let proxy = start_proxy(spawn_compressed_upstream().await).await;

        let response = reqwest::Client::new()
            .get(format!("http://{}/api/acts?my=true", proxy.bound_address()))
            .header(header::ACCEPT_ENCODING, "gzip, deflate, br, zstd")
            .send()
            .await
            .expect("response");

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let echoed: Value = response.json().await.expect("json");
        assert_eq!(echoed["path"], "/v2/acts");
        assert_eq!(echoed["query"], "my=true");

        proxy.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn relays_upstream_error_status_verbatim() {
        let proxy = start_proxy(spawn_upstream().await).await;

        let response = reqwest::get(format!("http://{}/api/missing/thing", proxy.bound_address()))
            .await
            .expect("response");

        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
        let echoed: Value = response.json().await.expect("json");
        assert_eq!(echoed["method"], "GET");
    }

    #[tokio::test]
    async fn non_json_upstream_body_becomes_proxy_error() {
        let proxy = start_proxy(spawn_upstream().await).await;

        let response = reqwest::get(format!("http://{}/api/html", proxy.bound_address()))
            .await
            .expect("response");

        assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json().await.expect("json");
        assert_eq!(body, json!({ "error": "Proxy server error" }));
    }

    #[tokio::test]
    async fn unreachable_upstream_becomes_proxy_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("address");
        drop(listener);
        let proxy = start_proxy(format!("http://{address}/v2")).await;

        let response = reqwest::get(format!("http://{}/api/acts", proxy.bound_address()))
            .await
            .expect("response");

        assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn answers_cors_preflight() {
        let proxy = start_proxy(spawn_upstream().await).await;

        let response = reqwest::Client::new()
            .request(reqwest::Method::OPTIONS, format!("http://{}/api/acts", proxy.bound_address()))
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "POST")
            .send()
            .await
            .expect("response");

        assert!(response.status().is_success());
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|value| value.to_str().ok()),
            Some("*")
        );
    }

    #[test]
    fn bind_address_must_be_loopback() {
        assert_eq!(
            resolve_bind_address(None).expect("default"),
            "127.0.0.1:3001".parse::<SocketAddr>().expect("address")
        );
        assert!(matches!(resolve_bind_address(Some("0.0.0.0:3001")), Err(ProxyError::BindAddress { .. })));
        assert!(resolve_bind_address(Some("not-an-address")).is_err());
    }

    #[test]
    fn upstream_url_rewrites_prefix_and_keeps_query() {
        let uri: Uri = "/api/acts?my=true&limit=10".parse().expect("uri");
        assert_eq!(
            upstream_url("https://api.apify.com/v2", "/api", &uri),
            "https://api.apify.com/v2/acts?my=true&limit=10"
        );
        assert_eq!(normalize_prefix("api/"), "/api");
    }

    #[test]
    fn hop_by_hop_headers_are_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "localhost:3001".parse().expect("value"));
        headers.insert(header::CONNECTION, "keep-alive".parse().expect("value"));
        headers.insert(header::AUTHORIZATION, "Bearer x".parse().expect("value"));
        headers.insert(header::ACCEPT_ENCODING, "gzip, br".parse().expect("value"));

        let forwarded = forwarded_headers(&headers);

        assert!(forwarded.get(header::HOST).is_none());
        assert!(forwarded.get(header::CONNECTION).is_none());
        assert!(forwarded.get(header::ACCEPT_ENCODING).is_none());
        assert!(forwarded.get(header::AUTHORIZATION).is_some());
        assert_eq!(forwarded.get(header::CONTENT_TYPE).and_then(|value| value.to_str().ok()), Some("application/json"));
    }
}
