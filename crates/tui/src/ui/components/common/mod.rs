pub mod field_editor;
pub mod json_syntax;
pub mod scroll_metrics;
pub mod text_input;

pub use field_editor::{EditOutcome, FieldEditor};
pub use scroll_metrics::ScrollMetrics;
pub use text_input::TextInputState;
