//! Automation platform API client.
//!
//! This crate provides a lightweight client for the platform's REST API.
//! It focuses on:
//!
//! - Constructing an HTTP client with sensible defaults
//! - Validating the configured API base for safety
//! - Attaching the API token as the `token` query parameter
//! - Decoding the `{ data: ... }` envelopes into typed payloads
//!
//! The primary entry point is [`ApifyClient`], which implements the
//! [`ActorPlatform`] trait used by the engine. Tests and alternative
//! transports implement the same trait.
//!
//! # Example
//!
//! ```ignore
//! use actorbench_api::{ActorPlatform, ApifyClient, ClientSettings, ListScope};
//!
//! async fn list() -> Result<(), actorbench_api::ApiError> {
//!     let client = ApifyClient::new(&ClientSettings::default(), "apify_api_...")?;
//!     let actors = client.list_actors(ListScope::Owned).await?;
//!     println!("{} actors", actors.len());
//!     Ok(())
//! }
//! ```

mod error;
mod platform;

pub use error::{ApiError, status_message};
pub use platform::{ActorPlatform, ListScope};

use std::env;
use std::time::{Duration, Instant};

use actorbench_util::redact_sensitive;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::{Client, Method, RequestBuilder, Response, Url, header};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Public API base used when nothing else is configured.
pub const DEFAULT_API_BASE: &str = "https://api.apify.com/v2";

/// Allowed hostnames or base domains for non-local API bases. Subdomains of
/// these domains are also allowed.
const ALLOWED_API_DOMAINS: &[&str] = &["apify.com"];
/// Hostnames allowed for local development regardless of scheme.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

/// Characters escaped when an identifier is placed in a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Connection settings shared by every client built in a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub base_url: String,
    pub timeout: Duration,
    /// Page size requested from list endpoints.
    pub list_limit: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
            list_limit: 100,
        }
    }
}

#[derive(Debug, Clone)]
/// Thin wrapper around a configured `reqwest::Client` for platform access.
///
/// The client pre-configures default headers and builds requests against a
/// validated base URL, appending the API token to every request.
pub struct ApifyClient {
    base_url: String,
    http: Client,
    token: String,
    user_agent: String,
    list_limit: u32,
}

impl ApifyClient {
    /// Construct a client for `token` using the given settings.
    ///
    /// The base URL must be `localhost`/`127.0.0.1` (any scheme) or an https
    /// URL within an allowed platform domain.
    pub fn new(settings: &ClientSettings, token: impl Into<String>) -> Result<Self, ApiError> {
        validate_base_url(&settings.base_url)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            http,
            token: token.into(),
            user_agent: format!("actorbench/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
            list_limit: settings.list_limit,
        })
    }

    /// Build a `reqwest::RequestBuilder` for a method and API-relative path.
    ///
    /// The resulting request includes the configured User-Agent and the
    /// `token` query parameter, and is resolved relative to the base URL.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %redact_sensitive(&url), %method, "building request");

        self.http
            .request(method, url)
            .header(header::USER_AGENT, &self.user_agent)
            .query(&[("token", self.token.as_str())])
    }

    /// Sends a request and decodes the JSON body of a successful response.
    async fn send_json(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let start = Instant::now();
        let request = request.build()?;
        let method = request.method().clone();
        let url = redact_sensitive(request.url().as_str());

        let response = self.http.execute(request).await.map_err(|error| {
            warn!(%method, %url, error = %redact_sensitive(&error.to_string()), "http request failed");
            ApiError::Transport(error)
        })?;
        let value = read_json(response).await.inspect_err(|error| {
            warn!(
                %method,
                %url,
                error = %error,
                duration_ms = start.elapsed().as_millis(),
                "http request returned an error"
            );
        })?;
        debug!(%method, %url, duration_ms = start.elapsed().as_millis(), "http request completed");
        Ok(value)
    }
}

/// Reads a response body, turning non-success statuses into [`ApiError::Status`].
async fn read_json(response: Response) -> Result<Value, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ApiError::from_status(status, &body));
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(|error| ApiError::Decode(error.to_string()))
}

/// Decodes a `{ data: T }` envelope.
fn decode_envelope<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    let envelope: actorbench_types::ApiEnvelope<T> =
        serde_json::from_value(value).map_err(|error| ApiError::Decode(error.to_string()))?;
    Ok(envelope.data)
}

/// Percent-encodes an identifier for use as one path segment.
pub fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS, and host must be one of the allowed
///   platform domains or a subdomain thereof
pub fn validate_base_url(base: &str) -> Result<(), ApiError> {
    let parsed_base_url =
        Url::parse(base).map_err(|error| ApiError::Config(format!("invalid API base URL '{}': {}", base, error)))?;

    let host_name = parsed_base_url
        .host_str()
        .ok_or_else(|| ApiError::Config("API base URL must include a host".into()))?;

    if LOCALHOST_DOMAINS
        .iter()
        .any(|&allowed| host_name.eq_ignore_ascii_case(allowed))
    {
        return Ok(());
    }

    if parsed_base_url.scheme() != "https" {
        return Err(ApiError::Config(format!(
            "API base URL must use https for non-localhost hosts; got '{}://'",
            parsed_base_url.scheme()
        )));
    }

    let is_allowed_domain = ALLOWED_API_DOMAINS.iter().any(|&allowed_domain| {
        host_name.eq_ignore_ascii_case(allowed_domain) || host_name.ends_with(&format!(".{}", allowed_domain))
    });
    if !is_allowed_domain {
        return Err(ApiError::Config(format!(
            "API base host '{}' is not allowed; must be one of {:?} or a subdomain, or localhost",
            host_name, ALLOWED_API_DOMAINS
        )));
    }

    Ok(())
}
