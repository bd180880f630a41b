//! Shared data model for actorbench.
//!
//! These types mirror the JSON payloads exchanged with the automation
//! platform: actors, their input schemas, and run snapshots. They are
//! immutable once fetched; callers replace them wholesale on re-fetch.

mod actor;
mod envelope;
mod run;
mod schema;

pub use actor::{Actor, ActorStats};
pub use envelope::{ApiEnvelope, ItemPage};
pub use run::{ExecutionResult, RunStats, RunStatus, format_duration_millis};
pub use schema::{ActorSchema, ContainerKind, PropertyKind, ScalarKind, SchemaError, SchemaProperty};
