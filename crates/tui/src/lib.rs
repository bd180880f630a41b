//! # Actorbench TUI
//!
//! Terminal front end for browsing Apify actors, reading their input
//! schemas and running them.
//!
//! The screen starts at API key entry. Once connected it shows three panes:
//! the actor directory, the selected actor's input schema, and a form
//! generated from that schema with the result of the latest run.
//!
//! ## Architecture
//!
//! Components handle keys and render from [`app::App`]; user intents come
//! back as effects that `cmd` turns into background tasks, whose results
//! re-enter the app as messages in the runtime loop.

mod app;
mod cmd;
#[cfg(test)]
mod testing;
mod ui;

use actorbench_engine::Session;
use anyhow::Result;

/// Runs the TUI until the user quits.
///
/// `initial_key` pre-fills the key entry form.
///
/// # Errors
///
/// Fails when the terminal cannot be put into raw mode or drawn to.
pub async fn run(session: Session, initial_key: Option<String>) -> Result<()> {
    ui::runtime::run_app(session, initial_key).await
}
