//! # Actorbench Engine
//!
//! Everything between the HTTP client and the user interface: fetching the
//! actor directory, resolving input schemas, turning form edits into typed
//! values, building run payloads, and driving a run to a terminal status.
//!
//! ## Architecture
//!
//! - **`directory`**: owned + store listings merged by identifier
//! - **`schema`**: input schema lookup with configurable fallbacks
//! - **`form`**: schema-driven controls and pure value coercion
//! - **`viewer`**: read-only flattening of a schema tree into display rows
//! - **`payload`**: default run payload overlay
//! - **`runner`**: submit + poll loop with cancellation and an optional budget
//! - **`session`**: explicit application state (key, selection, schema)
//! - **`config`**: JSON configuration file with compiled-in defaults
//!
//! All network access goes through [`actorbench_api::ActorPlatform`], so each
//! module is testable against scripted fakes.

pub mod config;
pub mod directory;
pub mod form;
pub mod payload;
pub mod runner;
pub mod schema;
pub mod session;
pub mod viewer;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{EngineConfig, ProxySettings, RunConfig};
pub use directory::{fetch_directory, merge_directory};
pub use form::{Coercion, ControlKind, FormField, FormState, PLACEHOLDER_LABEL, RawInput, display_text, form_fields, value_label};
pub use payload::RunDefaults;
pub use runner::{PollEnd, RunError, RunOutcome, RunPolicy, execute_run};
pub use schema::{DEFAULT_FALLBACK_ACTOR_ID, FallbackSchemas, fetch_schema, search_scraper_schema};
pub use session::{
    ApifyConnector, Connection, ExecutionRequest, PlatformConnector, SchemaRequest, Session, SessionError, SessionSettings,
};
pub use viewer::{SchemaRow, schema_rows};
