//! Input schema resolution with per-actor fallbacks.

use actorbench_api::ActorPlatform;
use actorbench_types::{ActorSchema, PropertyKind, ScalarKind, SchemaProperty};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

/// Actor whose input schema is known locally even when the platform does
/// not publish one.
pub const DEFAULT_FALLBACK_ACTOR_ID: &str = "V8SFJw3gKgULelpok";

/// Locally known schemas keyed by actor identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FallbackSchemas(IndexMap<String, ActorSchema>);

impl FallbackSchemas {
    /// The compiled-in fallback set.
    pub fn builtin() -> Self {
        let mut schemas = IndexMap::new();
        schemas.insert(DEFAULT_FALLBACK_ACTOR_ID.to_string(), search_scraper_schema());
        Self(schemas)
    }

    pub fn get(&self, actor_id: &str) -> Option<&ActorSchema> {
        self.0.get(actor_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for FallbackSchemas {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Input schema of the search scraper actor.
pub fn search_scraper_schema() -> ActorSchema {
    let url_item = SchemaProperty {
        title: Some("URL Item".to_string()),
        description: None,
        default: None,
        kind: PropertyKind::Object {
            properties: IndexMap::from([(
                "url".to_string(),
                SchemaProperty::scalar("URL", ScalarKind::String)
                    .with_description("Search URL (e.g., https://www.bing.com/search?q=your search term)"),
            )]),
            required: vec!["url".to_string()],
        },
    };

    let start_urls = SchemaProperty {
        title: Some("Start URLs".to_string()),
        description: Some("Array of search URLs to scrape (Bing works better with available proxies)".to_string()),
        default: None,
        kind: PropertyKind::Array {
            items: Some(Box::new(url_item)),
        },
    };

    let properties = IndexMap::from([
        ("startUrls".to_string(), start_urls),
        (
            "maxRequestRetries".to_string(),
            SchemaProperty::scalar("Max Request Retries", ScalarKind::Integer)
                .with_description("Number of retry attempts for failed requests")
                .with_default(json!(3)),
        ),
        (
            "maxConcurrency".to_string(),
            SchemaProperty::scalar("Max Concurrency", ScalarKind::Integer)
                .with_description("Number of concurrent requests")
                .with_default(json!(10)),
        ),
        (
            "languageCode".to_string(),
            SchemaProperty::scalar("Language Code", ScalarKind::String)
                .with_description("Language code for search results (e.g., en, es, fr)")
                .with_default(json!("en")),
        ),
    ]);

    ActorSchema {
        title: "Search Scraper Input (Bing Recommended)".to_string(),
        kind: "object".to_string(),
        schema_version: 1,
        description: None,
        properties,
        required: vec!["startUrls".to_string()],
    }
}

/// Fetches an actor's input schema.
///
/// Never fails: any error falls back to the locally known schema for the
/// actor, and `None` means the actor accepts no structured input.
pub async fn fetch_schema(platform: &dyn ActorPlatform, fallbacks: &FallbackSchemas, actor_id: &str) -> Option<ActorSchema> {
    match platform.input_schema(actor_id).await {
        Ok(schema) => {
            debug!(actor_id = %actor_id, properties = schema.properties.len(), "fetched input schema");
            Some(schema)
        }
        Err(error) => match fallbacks.get(actor_id) {
            Some(schema) => {
                info!(actor_id = %actor_id, error = %error, "input schema unavailable; using local fallback");
                Some(schema.clone())
            }
            None => {
                warn!(actor_id = %actor_id, error = %error, "input schema unavailable");
                None
            }
        },
    }
}
