//! Theme styling module for the TUI UI layer.
//!
//! A single Nord palette is exposed through semantic roles plus helper
//! builders for Ratatui widgets. Prefer these helpers over hard-coding
//! colors so every pane stays consistent.

pub mod helpers;
pub mod nord;
pub mod roles;

pub use nord::NordTheme;
pub use roles::Theme;

/// The application theme.
pub fn load() -> Box<dyn Theme> {
    Box::new(NordTheme::new())
}
