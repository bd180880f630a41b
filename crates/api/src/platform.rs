//! The `ActorPlatform` seam and its HTTP implementation.

use actorbench_types::{Actor, ActorSchema, ExecutionResult, ItemPage};
use reqwest::Method;
use serde_json::{Map, Value};

use crate::{ApiError, ApifyClient, decode_envelope, encode_path_segment};

/// Which actor listing to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Actors owned by the caller (`my=true`).
    Owned,
    /// Unscoped store listing.
    Store,
}

/// Operations the engine needs from the remote platform.
#[async_trait::async_trait]
pub trait ActorPlatform: Send + Sync {
    async fn list_actors(&self, scope: ListScope) -> Result<Vec<Actor>, ApiError>;

    async fn input_schema(&self, actor_id: &str) -> Result<ActorSchema, ApiError>;

    /// Creates a run; the returned snapshot is the run's initial state.
    async fn start_run(&self, actor_id: &str, input: &Map<String, Value>) -> Result<ExecutionResult, ApiError>;

    async fn run_status(&self, run_id: &str) -> Result<ExecutionResult, ApiError>;
}

#[async_trait::async_trait]
impl ActorPlatform for ApifyClient {
    async fn list_actors(&self, scope: ListScope) -> Result<Vec<Actor>, ApiError> {
        let limit = self.list_limit.to_string();
        let mut request = self.request(Method::GET, "/acts");
        request = match scope {
            ListScope::Owned => request.query(&[("my", "true"), ("limit", limit.as_str())]),
            ListScope::Store => request.query(&[("limit", limit.as_str())]),
        };
        let value = self.send_json(request).await?;
        let page: ItemPage<Actor> = decode_envelope(value)?;
        Ok(page.items)
    }

    async fn input_schema(&self, actor_id: &str) -> Result<ActorSchema, ApiError> {
        let path = format!("/acts/{}/input-schema", encode_path_segment(actor_id));
        let value = self.send_json(self.request(Method::GET, &path)).await?;
        parse_schema_payload(value)
    }

    async fn start_run(&self, actor_id: &str, input: &Map<String, Value>) -> Result<ExecutionResult, ApiError> {
        let path = format!("/acts/{}/runs", encode_path_segment(actor_id));
        let request = self.request(Method::POST, &path).json(input);
        let value = self.send_json(request).await?;
        decode_envelope(value)
    }

    async fn run_status(&self, run_id: &str) -> Result<ExecutionResult, ApiError> {
        let path = format!("/actor-runs/{}", encode_path_segment(run_id));
        let value = self.send_json(self.request(Method::GET, &path)).await?;
        decode_envelope(value)
    }
}

/// Accepts either a bare schema document or one wrapped in `{ data: ... }`.
fn parse_schema_payload(value: Value) -> Result<ActorSchema, ApiError> {
    let document = match value {
        Value::Object(mut map) if !map.contains_key("properties") && map.get("data").is_some_and(Value::is_object) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };
    if !document.is_object() {
        return Err(ApiError::Decode("input schema is not a JSON object".into()));
    }
    serde_json::from_value(document).map_err(|error| ApiError::Decode(error.to_string()))
}
