//! UI components: key entry, actor list, schema viewer, execution pane.

pub mod actors;
pub mod auth;
pub mod common;
pub mod component;
pub mod execution;
pub mod schema_view;

pub use actors::ActorsComponent;
pub use auth::AuthComponent;
pub use component::*;
pub use execution::ExecutionComponent;
pub use schema_view::SchemaViewComponent;

/// Braille spinner frames for in-flight work.
pub(crate) static FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub(crate) fn throbber(frame_index: usize) -> &'static str {
    FRAMES[frame_index % FRAMES.len()]
}
