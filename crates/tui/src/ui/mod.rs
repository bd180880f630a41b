//! Rendering and input handling for the TUI.

pub mod components;
mod layout;
pub mod main_view;
pub mod runtime;
pub mod theme;
